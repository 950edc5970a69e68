//! # 合成器
//!
//! ## 设计思路
//!
//! 合成分两步：
//! 1. **排版**（纯函数）：由底图尺寸与 `MemeConfig` 计算画布尺寸、字号、
//!    每段文字的锚点/对齐/颜色，产出 `TextDraw` 清单。
//! 2. **绘制**：底图缩放铺满画布，再按清单依次绘制文字。
//!    主文字先填充、后描边；水印只填充，半透明白色、固定 14px。
//!
//! 文字不换行、不做越界检查，过长会被画布边缘裁掉。
//! 锚点的 y 是字母基线（与 canvas 默认 `alphabetic` 基线一致）。

use std::time::Instant;

use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

use super::font::FontWeight;
use super::model::{
    Anchor, FONT_SIZE_DIVISOR, FontFamily, MIN_FONT_SIZE, MemeConfig, Rgb, STROKE_WIDTH,
    SizePreset, TextRole, WatermarkPosition,
};
use super::raster::{RenderedRaster, paint_mask};
use super::{EngineConfig, MemeError, MemeHandler};

/// 水印字号（像素），与尺寸档位无关。
pub const WATERMARK_FONT_SIZE: f32 = 14.0;
/// 水印距左右边缘、距底边的距离。
pub const WATERMARK_MARGIN: f32 = 10.0;
/// 水印在顶部时的基线位置。
pub const WATERMARK_TOP_BASELINE: f32 = 20.0;
/// 水印不透明度。
pub const WATERMARK_ALPHA: f32 = 0.6;

/// 水平对齐方式，相对锚点 x。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// 给定锚点 x 与文本前进宽度，求笔位起点。
    pub fn pen_x(self, anchor_x: f32, advance: f32) -> f32 {
        match self {
            Self::Left => anchor_x,
            Self::Center => anchor_x - advance / 2.0,
            Self::Right => anchor_x - advance,
        }
    }
}

/// 画布像素坐标。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// 文字的颜色与描边。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPaint {
    pub fill: Rgba<u8>,
    /// 描边颜色与线宽；`None` 表示只填充。
    pub stroke: Option<(Rgba<u8>, f32)>,
}

/// 一次文字绘制。
#[derive(Debug, Clone, PartialEq)]
pub struct TextDraw {
    pub role: TextRole,
    pub text: String,
    pub position: Point,
    pub align: TextAlign,
    pub font_px: f32,
    pub family: FontFamily,
    pub weight: FontWeight,
    pub paint: TextPaint,
}

fn opaque(color: Rgb) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, 255])
}

/// 画布尺寸：宽度取档位值，高度按底图宽高比换算并四舍五入（至少 1）。
pub fn target_dimensions(source: (u32, u32), preset: SizePreset) -> Result<(u32, u32), MemeError> {
    let (source_width, source_height) = source;
    if source_width == 0 || source_height == 0 {
        return Err(MemeError::InvalidFormat(format!(
            "底图尺寸无效：{}x{}",
            source_width, source_height
        )));
    }

    let width = preset.width();
    let scale = width as f64 / source_width as f64;
    let height = (source_height as f64 * scale).round().max(1.0) as u32;
    Ok((width, height))
}

/// 主文字字号：`max(30, 宽度 / 15)`。
pub fn font_size(target_width: u32) -> f32 {
    (target_width as f32 / FONT_SIZE_DIVISOR).max(MIN_FONT_SIZE)
}

/// 归一化锚点换算为画布坐标。
pub fn text_anchor(anchor: Anchor, width: u32, height: u32) -> Point {
    Point {
        x: width as f32 * anchor.x,
        y: height as f32 * anchor.y,
    }
}

/// 水印的锚点与对齐方式。
pub fn watermark_placement(position: WatermarkPosition, width: u32, height: u32) -> (Point, TextAlign) {
    let right = width as f32 - WATERMARK_MARGIN;
    let bottom = height as f32 - WATERMARK_MARGIN;

    match position {
        WatermarkPosition::BottomRight => (Point { x: right, y: bottom }, TextAlign::Right),
        WatermarkPosition::BottomLeft => (
            Point {
                x: WATERMARK_MARGIN,
                y: bottom,
            },
            TextAlign::Left,
        ),
        WatermarkPosition::TopRight => (
            Point {
                x: right,
                y: WATERMARK_TOP_BASELINE,
            },
            TextAlign::Right,
        ),
        WatermarkPosition::TopLeft => (
            Point {
                x: WATERMARK_MARGIN,
                y: WATERMARK_TOP_BASELINE,
            },
            TextAlign::Left,
        ),
    }
}

/// 排版：产出按绘制顺序排列的文字清单。
pub fn plan_text(config: &MemeConfig, width: u32, height: u32) -> Vec<TextDraw> {
    let style = &config.style;
    let main_px = font_size(width);
    let main_paint = TextPaint {
        fill: opaque(style.fill_color),
        stroke: Some((opaque(style.stroke_color), STROKE_WIDTH)),
    };

    let mut draws: Vec<TextDraw> = config
        .text_layers()
        .iter()
        .map(|layer| TextDraw {
            role: layer.role,
            text: layer.content.to_string(),
            position: text_anchor(layer.anchor, width, height),
            align: TextAlign::Center,
            font_px: main_px,
            family: style.font_family,
            weight: FontWeight::Bold,
            paint: main_paint,
        })
        .collect();

    if config.watermark.is_visible() {
        let (position, align) = watermark_placement(config.watermark.position, width, height);
        let alpha = (WATERMARK_ALPHA * 255.0).round() as u8;
        draws.push(TextDraw {
            role: TextRole::Watermark,
            text: config.watermark.text.clone(),
            position,
            align,
            font_px: WATERMARK_FONT_SIZE,
            family: style.font_family,
            weight: FontWeight::Regular,
            paint: TextPaint {
                fill: Rgba([255, 255, 255, alpha]),
                stroke: None,
            },
        });
    }

    draws
}

impl MemeHandler {
    /// 合成入口：没有底图时什么都不做，返回 `None`。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use meme_generator::meme::{EngineConfig, MemeConfig, MemeHandler};
    ///
    /// let handler = MemeHandler::new(EngineConfig::default())?;
    /// let image = image::open("cat.jpg").map_err(|e| meme_generator::meme::MemeError::Decode(e.to_string()))?;
    /// let raster = handler.render(Some(&image), &MemeConfig::default())?;
    /// assert!(raster.is_some());
    /// # Ok::<(), meme_generator::meme::MemeError>(())
    /// ```
    pub fn render(
        &self,
        image: Option<&DynamicImage>,
        config: &MemeConfig,
    ) -> Result<Option<RenderedRaster>, MemeError> {
        let Some(image) = image else {
            log::info!("未选择图片，跳过合成");
            return Ok(None);
        };
        let engine = self.config_snapshot()?;
        self.compose(image, config, &engine).map(Some)
    }

    pub(crate) fn compose(
        &self,
        image: &DynamicImage,
        config: &MemeConfig,
        engine: &EngineConfig,
    ) -> Result<RenderedRaster, MemeError> {
        let start = Instant::now();
        let (width, height) = target_dimensions(image.dimensions(), config.style.size_preset)?;
        // 极细长的底图放大后画布可能远超源图，分配前按同样的上限拒绝
        self.validate_pixel_limits(engine, width, height)?;
        self.validate_decoded_memory_limits(engine, width, height)?;

        let mut canvas = self.scale_to_canvas(image, width, height, engine.resize_filter);
        let draws = plan_text(config, width, height);

        for draw in &draws {
            self.paint_text(&mut canvas, draw)?;
        }

        log::info!(
            "🎨 合成完成 - 画布: {}x{} 字号: {:.2}px 字体: {} 水印: {} 耗时: {}ms",
            width,
            height,
            font_size(width),
            config.style.font_family,
            config.watermark.is_visible(),
            start.elapsed().as_millis()
        );

        Ok(RenderedRaster::new(canvas, draws))
    }

    fn paint_text(&self, canvas: &mut RgbaImage, draw: &TextDraw) -> Result<(), MemeError> {
        if draw.text.is_empty() {
            return Ok(());
        }

        let face = self.fonts.face(draw.family, draw.weight)?;
        let advance = face.advance_width(&draw.text, draw.font_px);
        let pen_x = draw.align.pen_x(draw.position.x, advance);
        let mask = face.rasterize(&draw.text, draw.font_px);

        paint_mask(canvas, &mask, pen_x, draw.position.y, draw.paint.fill);

        if let Some((stroke_color, stroke_width)) = draw.paint.stroke {
            let band = mask.stroke(stroke_width);
            paint_mask(canvas, &band, pen_x, draw.position.y, stroke_color);
        }

        Ok(())
    }
}
