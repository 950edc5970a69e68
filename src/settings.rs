//! 预设（界面参数）读写
//!
//! 把文字、样式、水印与深色模式保存为 JSON，之后可以一次性载回。
//! 底图不属于预设。缺失的字段取默认值，因此旧文件或手写的片段也能加载。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::meme::{ConfigState, MemeConfig};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preset {
    #[serde(flatten)]
    pub meme: MemeConfig,
    pub dark_mode: bool,
}

impl Preset {
    pub fn from_state(state: &ConfigState) -> Self {
        Self {
            meme: state.snapshot(),
            dark_mode: state.dark_mode(),
        }
    }

    pub fn apply_to(self, state: &mut ConfigState) {
        state.replace_config(self.meme);
        state.set_dark_mode(self.dark_mode);
    }
}

pub fn load_preset(path: &Path) -> Result<Preset, AppError> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::Settings(format!("读取预设文件 '{}' 失败: {}", path.display(), e)))?;

    serde_json::from_str::<Preset>(&content)
        .map_err(|e| AppError::Settings(format!("解析预设文件 '{}' 失败: {}", path.display(), e)))
}

pub fn save_preset(path: &Path, preset: &Preset) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(preset)
        .map_err(|e| AppError::Settings(format!("序列化预设失败: {}", e)))?;

    fs::write(path, content)?;
    log::info!("📝 预设已保存 - {}", path.display());
    Ok(())
}
