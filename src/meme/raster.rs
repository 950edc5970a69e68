//! # 画布与覆盖遮罩
//!
//! ## 设计思路
//!
//! - `CoverageMask`：单通道 0.0~1.0 覆盖率，记录一段文字的字形形状，
//!   并保存“笔位起点 / 基线”在遮罩内的位置，便于按锚点贴到画布上。
//! - 描边通过形态学运算得到：`膨胀(半径 w/2) - 腐蚀(半径 w/2)`，即轮廓两侧各 w/2 的环带。
//! - `RenderedRaster`：一次渲染的输出位图，同时携带绘制清单（`TextDraw`），
//!   使文字摆放结果可以被检查。
//!
//! 未渲染过的画布是 300x150 的全透明位图，与未设置尺寸的 HTML canvas 一致。

use image::{Rgba, RgbaImage};

use super::compositor::TextDraw;
use super::model::TextRole;

/// 初始空白画布宽度。
pub const BLANK_SURFACE_WIDTH: u32 = 300;
/// 初始空白画布高度。
pub const BLANK_SURFACE_HEIGHT: u32 = 150;

/// 文字覆盖率遮罩。
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageMask {
    width: u32,
    height: u32,
    /// 笔位起点在遮罩中的 x 坐标。
    origin_x: i32,
    /// 基线在遮罩中的 y 坐标。
    baseline_y: i32,
    data: Vec<f32>,
}

impl CoverageMask {
    pub fn new(width: u32, height: u32, origin_x: i32, baseline_y: i32) -> Self {
        Self {
            width,
            height,
            origin_x,
            baseline_y,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    pub fn empty() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn origin_x(&self) -> i32 {
        self.origin_x
    }

    pub fn baseline_y(&self) -> i32 {
        self.baseline_y
    }

    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|v| *v <= 0.0)
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// 以取最大值的方式累积覆盖率（字形重叠时不叠加变亮）。
    pub fn accumulate(&mut self, x: u32, y: u32, value: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.data[idx] = self.data[idx].max(value.clamp(0.0, 1.0));
    }

    /// 四周各扩展 `pad` 像素的空白，锚点随之平移。
    pub fn padded(&self, pad: u32) -> Self {
        let mut out = Self::new(
            self.width + pad * 2,
            self.height + pad * 2,
            self.origin_x + pad as i32,
            self.baseline_y + pad as i32,
        );
        for y in 0..self.height {
            for x in 0..self.width {
                out.accumulate(x + pad, y + pad, self.get(x, y));
            }
        }
        out
    }

    /// 圆形结构元素膨胀：取邻域最大值。
    pub fn dilate(&self, radius: f32) -> Self {
        self.morph(radius, 0.0, f32::max)
    }

    /// 圆形结构元素腐蚀：取邻域最小值，遮罩外视为 0。
    pub fn erode(&self, radius: f32) -> Self {
        self.morph(radius, 1.0, f32::min)
    }

    fn morph(&self, radius: f32, init: f32, pick: fn(f32, f32) -> f32) -> Self {
        let mut out = Self::new(self.width, self.height, self.origin_x, self.baseline_y);
        let r_ceil = radius.ceil() as i64;
        let r_sq = radius * radius;
        let (w, h) = (self.width as i64, self.height as i64);

        for y in 0..h {
            for x in 0..w {
                let mut acc = init;
                for dy in -r_ceil..=r_ceil {
                    for dx in -r_ceil..=r_ceil {
                        if (dx * dx + dy * dy) as f32 > r_sq {
                            continue;
                        }
                        let (sx, sy) = (x + dx, y + dy);
                        let value = if sx < 0 || sy < 0 || sx >= w || sy >= h {
                            0.0
                        } else {
                            self.data[(sy * w + sx) as usize]
                        };
                        acc = pick(acc, value);
                    }
                }
                out.data[(y * w + x) as usize] = acc;
            }
        }
        out
    }

    /// 以 `stroke_width` 为线宽的轮廓环带。
    pub fn stroke(&self, stroke_width: f32) -> Self {
        if self.width == 0 || self.height == 0 || stroke_width <= 0.0 {
            return Self::empty();
        }
        let radius = stroke_width / 2.0;
        let base = self.padded(radius.ceil() as u32 + 1);
        let outer = base.dilate(radius);
        let inner = base.erode(radius);

        let mut band = outer;
        for (value, inside) in band.data.iter_mut().zip(inner.data.iter()) {
            *value = (*value - *inside).clamp(0.0, 1.0);
        }
        band
    }
}

/// 将遮罩按给定笔位与基线贴到画布上（source-over 混合）。
///
/// 超出画布的部分直接裁掉。
pub(crate) fn paint_mask(
    canvas: &mut RgbaImage,
    mask: &CoverageMask,
    pen_x: f32,
    baseline_y: f32,
    color: Rgba<u8>,
) {
    let left = pen_x.round() as i64 - mask.origin_x as i64;
    let top = baseline_y.round() as i64 - mask.baseline_y as i64;
    let (canvas_w, canvas_h) = (canvas.width() as i64, canvas.height() as i64);
    let color_alpha = color.0[3] as f32 / 255.0;

    for my in 0..mask.height {
        let cy = top + my as i64;
        if cy < 0 || cy >= canvas_h {
            continue;
        }
        for mx in 0..mask.width {
            let cx = left + mx as i64;
            if cx < 0 || cx >= canvas_w {
                continue;
            }
            let coverage = mask.get(mx, my);
            if coverage <= 0.0 {
                continue;
            }
            let dst = canvas.get_pixel_mut(cx as u32, cy as u32);
            *dst = blend_over(*dst, color, coverage * color_alpha);
        }
    }
}

/// 非预乘 source-over 混合。
fn blend_over(dst: Rgba<u8>, src: Rgba<u8>, src_alpha: f32) -> Rgba<u8> {
    let sa = src_alpha.clamp(0.0, 1.0);
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |s: u8, d: u8| -> u8 {
        let value = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(src.0[0], dst.0[0]),
        channel(src.0[1], dst.0[1]),
        channel(src.0[2], dst.0[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// 渲染输出位图。
#[derive(Debug, Clone)]
pub struct RenderedRaster {
    image: RgbaImage,
    draws: Vec<TextDraw>,
}

impl RenderedRaster {
    pub(crate) fn new(image: RgbaImage, draws: Vec<TextDraw>) -> Self {
        Self { image, draws }
    }

    /// 从未渲染过的空白画布。
    pub fn blank() -> Self {
        Self::new(
            RgbaImage::new(BLANK_SURFACE_WIDTH, BLANK_SURFACE_HEIGHT),
            Vec::new(),
        )
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// 按绘制顺序排列的文字绘制清单。
    pub fn draws(&self) -> &[TextDraw] {
        &self.draws
    }

    pub fn draw_for(&self, role: TextRole) -> Option<&TextDraw> {
        self.draws.iter().find(|draw| draw.role == role)
    }
}
