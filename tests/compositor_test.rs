// Layout and rendering tests for the compositor
use image::{DynamicImage, Rgba, RgbaImage};
use meme_generator::meme::compositor::{WATERMARK_FONT_SIZE, WATERMARK_MARGIN};
use meme_generator::meme::{
    Anchor, EngineConfig, MemeConfig, MemeHandler, Point, SizePreset, TextAlign, TextRole,
    WatermarkPosition, encode_png, font_size, plan_text, target_dimensions, text_anchor,
    watermark_placement,
};
use proptest::prelude::*;

fn handler() -> MemeHandler {
    MemeHandler::new(EngineConfig::without_system_fonts()).expect("handler init failed")
}

fn gray(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([90, 90, 90, 255])))
}

fn changed_pixels(a: &RgbaImage, b: &RgbaImage) -> Vec<(u32, u32)> {
    assert_eq!(a.dimensions(), b.dimensions());
    a.enumerate_pixels()
        .filter(|(x, y, pixel)| b.get_pixel(*x, *y) != *pixel)
        .map(|(x, y, _)| (x, y))
        .collect()
}

fn presets() -> impl Strategy<Value = SizePreset> {
    prop::sample::select(SizePreset::ALL.to_vec())
}

fn positions() -> impl Strategy<Value = WatermarkPosition> {
    prop::sample::select(WatermarkPosition::ALL.to_vec())
}

proptest! {
    #[test]
    fn width_follows_preset_and_height_keeps_ratio(
        source_w in 1u32..5000,
        source_h in 1u32..5000,
        preset in presets(),
    ) {
        let (w, h) = target_dimensions((source_w, source_h), preset).unwrap();
        prop_assert_eq!(w, preset.width());

        let expected = (source_h as f64 * preset.width() as f64 / source_w as f64).round().max(1.0);
        prop_assert_eq!(h, expected as u32);
        prop_assert!(h >= 1);
    }

    #[test]
    fn font_size_never_below_thirty(width in 1u32..4000) {
        let px = font_size(width);
        prop_assert!(px >= 30.0);
        if width >= 450 {
            prop_assert!((px - width as f32 / 15.0).abs() < 1e-3);
        }
    }

    #[test]
    fn main_anchors_scale_with_canvas(w in 1u32..2000, h in 1u32..2000) {
        let top = text_anchor(Anchor::TOP, w, h);
        let bottom = text_anchor(Anchor::BOTTOM, w, h);

        prop_assert!((top.x - w as f32 / 2.0).abs() < 1e-3);
        prop_assert!((bottom.x - w as f32 / 2.0).abs() < 1e-3);
        prop_assert!((top.y - h as f32 * 0.1).abs() < 1e-3);
        prop_assert!((bottom.y - h as f32 * 0.9).abs() < 1e-3);
    }

    #[test]
    fn watermark_sits_in_its_corner(w in 40u32..2000, h in 40u32..2000, position in positions()) {
        let (point, align) = watermark_placement(position, w, h);

        let on_right = matches!(position, WatermarkPosition::BottomRight | WatermarkPosition::TopRight);
        let on_top = matches!(position, WatermarkPosition::TopLeft | WatermarkPosition::TopRight);

        if on_right {
            prop_assert_eq!(point.x, w as f32 - WATERMARK_MARGIN);
            prop_assert_eq!(align, TextAlign::Right);
        } else {
            prop_assert_eq!(point.x, WATERMARK_MARGIN);
            prop_assert_eq!(align, TextAlign::Left);
        }

        if on_top {
            prop_assert_eq!(point.y, 20.0);
        } else {
            prop_assert_eq!(point.y, h as f32 - WATERMARK_MARGIN);
        }
    }
}

#[test]
fn medium_wide_image_layout() {
    let (w, h) = target_dimensions((1000, 500), SizePreset::Medium).expect("dims");
    assert_eq!((w, h), (500, 250));
    assert_eq!(font_size(w).floor(), 33.0);

    let config = MemeConfig {
        top_text: "HELLO".to_string(),
        bottom_text: "WORLD".to_string(),
        ..MemeConfig::default()
    };
    let draws = plan_text(&config, w, h);
    let roles: Vec<TextRole> = draws.iter().map(|d| d.role).collect();
    assert_eq!(roles, vec![TextRole::Top, TextRole::Bottom, TextRole::Watermark]);

    assert_eq!(draws[0].position, Point { x: 250.0, y: 25.0 });
    assert_eq!(draws[1].position, Point { x: 250.0, y: 225.0 });
    assert_eq!(draws[2].position, Point { x: 490.0, y: 240.0 });
    assert_eq!(draws[2].font_px, WATERMARK_FONT_SIZE);
    assert_eq!(draws[2].paint.fill, Rgba([255, 255, 255, 153]));
    assert!(draws[2].paint.stroke.is_none());
    assert_eq!(draws[0].paint.stroke.map(|(_, width)| width), Some(2.0));
}

#[test]
fn whitespace_watermark_is_not_planned() {
    let mut config = MemeConfig::default();
    config.watermark.text = "   ".to_string();

    let draws = plan_text(&config, 600, 400);
    assert!(draws.iter().all(|d| d.role != TextRole::Watermark));
}

#[test]
fn watermark_text_is_drawn_untrimmed() {
    let mut config = MemeConfig::default();
    config.watermark.text = "  @me ".to_string();

    let draws = plan_text(&config, 600, 400);
    let watermark = draws
        .iter()
        .find(|d| d.role == TextRole::Watermark)
        .expect("watermark planned");
    assert_eq!(watermark.text, "  @me ");
}

#[test]
fn render_without_image_is_a_no_op() {
    let result = handler().render(None, &MemeConfig::default()).expect("render");
    assert!(result.is_none());
}

#[test]
fn captions_change_pixels_near_their_anchors() {
    let handler = handler();
    let image = gray(1000, 500);

    let mut plain = MemeConfig::default();
    plain.watermark.enabled = false;
    let mut captioned = plain.clone();
    captioned.top_text = "TOP".to_string();

    let base = handler.render(Some(&image), &plain).expect("render").expect("raster");
    let with_text = handler.render(Some(&image), &captioned).expect("render").expect("raster");

    let diff = changed_pixels(base.image(), with_text.image());
    assert!(!diff.is_empty(), "top caption left the canvas untouched");
    assert!(diff.iter().all(|(_, y)| *y < 125), "top caption leaked into the lower half");
}

#[test]
fn watermark_only_touches_its_corner() {
    let handler = handler();
    let image = gray(1000, 500);

    let mut without = MemeConfig::default();
    without.watermark.enabled = false;
    let with = MemeConfig::default();

    let base = handler.render(Some(&image), &without).expect("render").expect("raster");
    let marked = handler.render(Some(&image), &with).expect("render").expect("raster");

    let diff = changed_pixels(base.image(), marked.image());
    assert!(!diff.is_empty());
    assert!(diff.iter().all(|(x, y)| *x >= 250 && *y >= 200));
}

#[test]
fn whitespace_watermark_renders_like_disabled() {
    let handler = handler();
    let image = gray(300, 300);

    let mut disabled = MemeConfig::default();
    disabled.watermark.enabled = false;
    let mut blank = MemeConfig::default();
    blank.watermark.text = " \t ".to_string();

    let a = handler.render(Some(&image), &disabled).expect("render").expect("raster");
    let b = handler.render(Some(&image), &blank).expect("render").expect("raster");
    assert!(changed_pixels(a.image(), b.image()).is_empty());
}

#[test]
fn exported_png_keeps_canvas_size() {
    let handler = handler();
    let image = gray(640, 480);
    let mut config = MemeConfig::default();
    config.style.size_preset = SizePreset::Small;

    let raster = handler.render(Some(&image), &config).expect("render").expect("raster");
    let bytes = encode_png(&raster).expect("encode");
    let decoded = image::load_from_memory(&bytes).expect("decode exported png");

    assert_eq!((decoded.width(), decoded.height()), (300, 225));
    assert_eq!(decoded.to_rgba8(), *raster.image());
}

#[test]
fn stroke_is_painted_over_the_fill_edge() {
    let handler = handler();
    let image = gray(1000, 500);

    let mut config = MemeConfig::default();
    config.watermark.enabled = false;
    config.bottom_text = "HHH".to_string();
    config.style.fill_color = "#ff0000".parse().expect("fill color");
    config.style.stroke_color = "#00ff00".parse().expect("stroke color");

    let mut plain = config.clone();
    plain.bottom_text.clear();

    let raster = handler.render(Some(&image), &config).expect("render").expect("raster");
    let base = handler.render(Some(&image), &plain).expect("render").expect("raster");
    let canvas = raster.image();
    let red = Rgba([255, 0, 0, 255]);
    let green = Rgba([0, 255, 0, 255]);

    let red_count = canvas.pixels().filter(|p| **p == red).count();
    let green_count = canvas.pixels().filter(|p| **p == green).count();
    assert!(red_count > 0, "fill color missing");
    assert!(green_count > 0, "stroke color missing");

    let (w, h) = canvas.dimensions();
    for (x, y, pixel) in canvas.enumerate_pixels() {
        if *pixel != red {
            continue;
        }
        let neighbours = [
            (x.wrapping_sub(1), y),
            (x + 1, y),
            (x, y.wrapping_sub(1)),
            (x, y + 1),
        ];
        for (nx, ny) in neighbours {
            if nx < w && ny < h {
                assert_ne!(
                    canvas.get_pixel(nx, ny),
                    base.image().get_pixel(nx, ny),
                    "fill at ({}, {}) touches the background without stroke",
                    x,
                    y
                );
            }
        }
    }
}
