//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `MemeHandler` 只负责流程编排与配置管理，不关心前端形态（命令行或会话脚本）。
//! 处理链路固定为：
//! 1. 读取配置快照
//! 2. 按来源加载原始字节
//! 3. 解码
//! 4. 合成（缩放底图 + 绘制文字 + 水印）
//!
//! ## 实现思路
//!
//! - 引擎配置通过 `Arc<RwLock<EngineConfig>>` 支持运行时切换渲染档位。
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 记录 `load/compose/total` 阶段耗时，便于性能诊断。

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use image::DynamicImage;

use super::font::{FontLibrary, FontWeight};
use super::model::{FontFamily, MemeConfig};
use super::raster::RenderedRaster;
use super::{EngineConfig, ImageSource, MemeError, RenderProfile};

/// 表情包处理器。
///
/// 封装了引擎配置与字体库，并编排各子模块实现完整流程。
pub struct MemeHandler {
    pub(super) config: Arc<RwLock<EngineConfig>>,
    pub(super) fonts: FontLibrary,
}

impl MemeHandler {
    /// 根据初始配置创建处理器。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use meme_generator::meme::{EngineConfig, MemeHandler};
    ///
    /// let handler = MemeHandler::new(EngineConfig::default())?;
    /// # Ok::<(), meme_generator::meme::MemeError>(())
    /// ```
    pub fn new(config: EngineConfig) -> Result<Self, MemeError> {
        let fonts = FontLibrary::new(config.font_dirs.clone());
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            fonts,
        })
    }

    /// 获取配置快照。
    ///
    /// 作用：保证单次请求链路使用一致参数。
    pub(crate) fn config_snapshot(&self) -> Result<EngineConfig, MemeError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| MemeError::ResourceLimit("配置读取锁已中毒".to_string()))
    }

    /// 设置渲染档位。
    pub fn set_render_profile(&self, profile: RenderProfile) -> Result<(), MemeError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| MemeError::ResourceLimit("配置写入锁已中毒".to_string()))?;
        config.apply_render_profile(profile);

        log::info!(
            "⚙️ 已切换渲染档位：{:?}（filter={:?}）",
            profile,
            config.resize_filter
        );

        Ok(())
    }

    /// 获取当前生效档位。
    pub fn get_render_profile(&self) -> Result<RenderProfile, MemeError> {
        let config = self
            .config
            .read()
            .map_err(|_| MemeError::ResourceLimit("配置读取锁已中毒".to_string()))?;
        Ok(config.infer_render_profile())
    }

    /// 字体搜索目录（按搜索顺序）。
    pub fn font_dirs(&self) -> Vec<PathBuf> {
        self.fonts.dirs().to_vec()
    }

    /// 每个字体家族实际使用的字体文件；`None` 表示使用内置点阵字体。
    pub fn resolved_fonts(&self) -> Vec<(FontFamily, FontWeight, Option<PathBuf>)> {
        FontFamily::ALL
            .iter()
            .flat_map(|family| {
                [FontWeight::Bold, FontWeight::Regular]
                    .into_iter()
                    .map(|weight| (*family, weight, self.fonts.locate(*family, weight)))
            })
            .collect()
    }

    /// 加载并解码底图。
    pub fn load_image(&self, source: &ImageSource) -> Result<Arc<DynamicImage>, MemeError> {
        let config = self.config_snapshot()?;
        self.load_image_with(source, &config)
    }

    fn load_image_with(
        &self,
        source: &ImageSource,
        config: &EngineConfig,
    ) -> Result<Arc<DynamicImage>, MemeError> {
        let raw = match source {
            ImageSource::Decoded(image) => return Ok(Arc::clone(image)),
            ImageSource::File(path) => self.load_from_file(path, config)?,
            ImageSource::Bytes(bytes) => self.load_from_bytes(bytes, config)?,
            ImageSource::Base64(data) => self.load_from_base64(data, config)?,
        };
        Ok(Arc::new(self.decode(raw, config)?))
    }

    /// 处理主入口：加载底图并按参数快照合成。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use meme_generator::meme::{EngineConfig, ImageSource, MemeConfig, MemeHandler};
    ///
    /// let handler = MemeHandler::new(EngineConfig::default())?;
    /// let raster = handler.process(&ImageSource::File("cat.jpg".into()), &MemeConfig::default())?;
    /// println!("{}x{}", raster.width(), raster.height());
    /// # Ok::<(), meme_generator::meme::MemeError>(())
    /// ```
    pub fn process(
        &self,
        source: &ImageSource,
        meme: &MemeConfig,
    ) -> Result<RenderedRaster, MemeError> {
        let config = self.config_snapshot()?;
        let total_start = Instant::now();

        let load_start = Instant::now();
        let image = self.load_image_with(source, &config)?;
        let load_elapsed = load_start.elapsed();

        let compose_start = Instant::now();
        let raster = self.compose(&image, meme, &config)?;
        let compose_elapsed = compose_start.elapsed();

        log::info!(
            "✅ 表情包生成完成 - 来源: {} load={}ms compose={}ms total={}ms",
            source.hint(),
            load_elapsed.as_millis(),
            compose_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(raster)
    }
}
