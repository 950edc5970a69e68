//! # 表情包模块（meme）
//!
//! ## 设计思路
//!
//! 该模块将“参数状态 → 底图加载 → 解码缩放 → 文字合成 → 导出”按职责拆分为多个子模块，
//! 避免单文件膨胀与耦合。
//!
//! - `commands`：会话事件的解析与分发（薄封装）
//! - `service`：会话状态（`MemeSession`），画布与渲染请求的代号管理
//! - `handler`：编排整条处理流水线
//! - `loader`：负责文件/字节/Base64 加载与签名校验
//! - `pipeline`：负责解码、像素限制、缩放
//! - `compositor`：排版（锚点、字号、水印位置）与绘制
//! - `font`：字体查找与字形光栅化
//! - `raster`：覆盖率遮罩、描边、输出位图
//! - `export`：PNG 编码与 `meme.png` 写出
//! - `model/state/config/error/source`：参数模型、配置状态、引擎配置、错误、来源
//!
//! ## 新同事快速上手
//!
//! ```text
//! 命令行 / 会话脚本
//!    ↓
//! commands.rs（事件解析）
//!    ↓
//! service.rs（参数快照 + 请求代号 + spawn_blocking）
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志）
//!    ├─ loader.rs（来源加载 + 体积/签名校验）
//!    ├─ pipeline.rs（解码 + 像素限制 + 缩放）
//!    └─ compositor.rs（排版 + 文字绘制，依赖 font.rs / raster.rs）
//!    ↓
//! export.rs（PNG / Data URL / meme.png）
//! ```

pub mod commands;
pub mod compositor;
mod config;
mod error;
pub mod export;
pub mod font;
mod handler;
mod loader;
pub mod model;
mod pipeline;
pub mod raster;
mod service;
mod source;
mod state;

pub use commands::{UiEvent, dispatch};
pub use compositor::{
    Point, TextAlign, TextDraw, TextPaint, font_size, plan_text, target_dimensions, text_anchor,
    watermark_placement,
};
pub use config::{EngineConfig, FONT_DIR_ENV, RenderProfile, default_font_dirs};
pub use error::MemeError;
pub use export::{EXPORT_FILE_NAME, encode_png, save_png, to_data_url};
pub use font::{BitmapFace, FontLibrary, FontWeight, OutlineFace, TextFace};
pub use handler::MemeHandler;
pub use model::{
    Anchor, FontFamily, MemeConfig, Rgb, SizePreset, StyleSettings, TextLayer, TextRole,
    WatermarkPosition, WatermarkSettings,
};
pub use raster::{CoverageMask, RenderedRaster};
pub use service::{MemeSession, RenderOutcome, RenderTask};
pub use source::ImageSource;
pub use state::ConfigState;

#[cfg(test)]
pub(crate) mod test_support {
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let r = (x % 255) as u8;
            let g = (y % 255) as u8;
            let b = ((x + y) % 255) as u8;
            Rgba([r, g, b, 255])
        });

        let dyn_img = DynamicImage::ImageRgba8(img);
        let mut cursor = Cursor::new(Vec::new());
        dyn_img
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }
}
