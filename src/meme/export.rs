//! # 导出模块
//!
//! 把画布编码为 PNG：字节流、`data:image/png;base64,` 地址，或写成固定名为 `meme.png` 的文件。
//! 画布是什么就导出什么；从未渲染过时导出的是空白画布。

use std::fs;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::MemeError;
use super::raster::RenderedRaster;

/// 导出文件名。
pub const EXPORT_FILE_NAME: &str = "meme.png";

/// 编码为 PNG 字节。
pub fn encode_png(raster: &RenderedRaster) -> Result<Vec<u8>, MemeError> {
    let image = raster.image();
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| MemeError::Encode(format!("PNG 编码失败：{}", e)))?;
    Ok(bytes)
}

/// 编码为 PNG Data URL。
pub fn to_data_url(raster: &RenderedRaster) -> Result<String, MemeError> {
    let bytes = encode_png(raster)?;
    Ok(format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(bytes)
    ))
}

/// 写入 `<dir>/meme.png`，目录不存在时自动创建；同名文件会被覆盖。
pub fn save_png(raster: &RenderedRaster, dir: &Path) -> Result<PathBuf, MemeError> {
    fs::create_dir_all(dir)
        .map_err(|e| MemeError::FileSystem(format!("创建导出目录 '{}' 失败：{}", dir.display(), e)))?;

    let path = dir.join(EXPORT_FILE_NAME);
    let bytes = encode_png(raster)?;
    fs::write(&path, &bytes)
        .map_err(|e| MemeError::FileSystem(format!("写入 {} 失败：{}", path.display(), e)))?;

    log::info!(
        "💾 已导出 - {} ({}x{}, {} KB)",
        path.display(),
        raster.width(),
        raster.height(),
        bytes.len() / 1024
    );
    Ok(path)
}
