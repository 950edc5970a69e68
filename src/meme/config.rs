//! # 引擎配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `EngineConfig`，保证运行时行为可观测、可调整、可测试。
//! 用户可编辑的文字/样式参数不在这里，见 `model.rs`；这里只放加载限制、缩放滤镜与字体目录。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的平衡配置。
//! - `RenderProfile` 负责档位字符串解析与反向输出，并映射到缩放滤镜。
//! - `default_font_dirs` 汇总平台字体目录与 `MEME_FONT_DIR` 环境变量。

use std::path::PathBuf;
use std::str::FromStr;

use image::imageops::FilterType;

use super::MemeError;

/// 额外字体目录的环境变量名。
pub const FONT_DIR_ENV: &str = "MEME_FONT_DIR";

/// 处理引擎配置。
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 底图缩放滤镜。
    pub resize_filter: FilterType,
    /// 查找字体文件的目录，按顺序搜索。
    pub font_dirs: Vec<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            resize_filter: FilterType::Triangle,
            font_dirs: default_font_dirs(),
        }
    }
}

impl EngineConfig {
    /// 不搜索任何字体目录的配置，始终使用内置点阵字体。
    ///
    /// 测试与无字体环境下保证输出可复现。
    pub fn without_system_fonts() -> Self {
        Self {
            font_dirs: Vec::new(),
            ..Self::default()
        }
    }

    /// 基于当前滤镜反推渲染档位。
    pub(crate) fn infer_render_profile(&self) -> RenderProfile {
        match self.resize_filter {
            FilterType::CatmullRom | FilterType::Lanczos3 | FilterType::Gaussian => {
                RenderProfile::Quality
            }
            FilterType::Nearest => RenderProfile::Speed,
            FilterType::Triangle => RenderProfile::Balanced,
        }
    }

    /// 应用指定档位到实际参数。
    pub(crate) fn apply_render_profile(&mut self, profile: RenderProfile) {
        self.resize_filter = profile.filter();
    }
}

/// 渲染档位（面向用户语义）。
///
/// - `Quality`：缩放尽量保真
/// - `Balanced`：质量与速度平衡
/// - `Speed`：最近邻缩放
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderProfile {
    Quality,
    Balanced,
    Speed,
}

impl RenderProfile {
    /// 将档位输出为稳定字符串。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }

    pub fn filter(self) -> FilterType {
        match self {
            Self::Quality => FilterType::CatmullRom,
            Self::Balanced => FilterType::Triangle,
            Self::Speed => FilterType::Nearest,
        }
    }
}

impl FromStr for RenderProfile {
    type Err = MemeError;

    fn from_str(profile: &str) -> Result<Self, Self::Err> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(MemeError::InvalidFormat(format!(
                "未知渲染档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }
}

/// 汇总字体搜索目录：环境变量优先，其次是平台默认目录。
pub fn default_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Some(custom) = std::env::var_os(FONT_DIR_ENV) {
        dirs.extend(std::env::split_paths(&custom));
    }

    dirs.extend(platform_font_dirs());
    dirs.retain(|dir| !dir.as_os_str().is_empty());
    dirs
}

#[cfg(target_os = "windows")]
fn platform_font_dirs() -> Vec<PathBuf> {
    let windir = std::env::var_os("WINDIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("C:\\Windows"));
    let mut dirs = vec![windir.join("Fonts")];
    if let Some(local) = std::env::var_os("LOCALAPPDATA") {
        dirs.push(PathBuf::from(local).join("Microsoft").join("Windows").join("Fonts"));
    }
    dirs
}

#[cfg(target_os = "macos")]
fn platform_font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/Library/Fonts"),
        PathBuf::from("/System/Library/Fonts"),
        PathBuf::from("/System/Library/Fonts/Supplemental"),
    ];
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(PathBuf::from(home).join("Library").join("Fonts"));
    }
    dirs
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn platform_font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
    ];
    if let Some(home) = std::env::var_os("HOME") {
        let home = PathBuf::from(home);
        dirs.push(home.join(".fonts"));
        dirs.push(home.join(".local").join("share").join("fonts"));
    }
    dirs
}
