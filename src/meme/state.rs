//! # 配置状态
//!
//! 用户可编辑的全部字段。每个 setter 只替换一个字段，不做校验；
//! 渲染时通过 `snapshot()` 取出不可变的 `MemeConfig`。
//! 深色模式只是展示用标记，不影响渲染结果。

use super::model::{FontFamily, MemeConfig, Rgb, SizePreset, WatermarkPosition};
use super::source::ImageSource;

#[derive(Debug, Clone, Default)]
pub struct ConfigState {
    image: Option<ImageSource>,
    config: MemeConfig,
    dark_mode: bool,
}

impl ConfigState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> Option<&ImageSource> {
        self.image.as_ref()
    }

    pub fn config(&self) -> &MemeConfig {
        &self.config
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    /// 当前参数的不可变快照。
    pub fn snapshot(&self) -> MemeConfig {
        self.config.clone()
    }

    pub fn set_image(&mut self, image: Option<ImageSource>) {
        self.image = image;
    }

    pub fn set_top_text(&mut self, text: impl Into<String>) {
        self.config.top_text = text.into();
    }

    pub fn set_bottom_text(&mut self, text: impl Into<String>) {
        self.config.bottom_text = text.into();
    }

    pub fn set_font_family(&mut self, family: FontFamily) {
        self.config.style.font_family = family;
    }

    pub fn set_fill_color(&mut self, color: Rgb) {
        self.config.style.fill_color = color;
    }

    pub fn set_stroke_color(&mut self, color: Rgb) {
        self.config.style.stroke_color = color;
    }

    pub fn set_size_preset(&mut self, preset: SizePreset) {
        self.config.style.size_preset = preset;
    }

    pub fn set_watermark_enabled(&mut self, enabled: bool) {
        self.config.watermark.enabled = enabled;
    }

    pub fn set_watermark_text(&mut self, text: impl Into<String>) {
        self.config.watermark.text = text.into();
    }

    pub fn set_watermark_position(&mut self, position: WatermarkPosition) {
        self.config.watermark.position = position;
    }

    pub fn set_dark_mode(&mut self, enabled: bool) {
        self.dark_mode = enabled;
    }

    /// 切换深色模式，返回切换后的值。
    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        self.dark_mode
    }

    /// 整体替换文字/样式/水印参数（加载预设时使用），底图保持不变。
    pub fn replace_config(&mut self, config: MemeConfig) {
        self.config = config;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_replace_single_fields() {
        let mut state = ConfigState::new();
        state.set_top_text("top");
        state.set_fill_color(Rgb::new(1, 2, 3));

        let config = state.snapshot();
        assert_eq!(config.top_text, "top");
        assert_eq!(config.bottom_text, "");
        assert_eq!(config.style.fill_color, Rgb::new(1, 2, 3));
        assert_eq!(config.style.stroke_color, Rgb::BLACK);
    }

    #[test]
    fn snapshot_is_detached_from_later_edits() {
        let mut state = ConfigState::new();
        state.set_bottom_text("before");
        let snapshot = state.snapshot();
        state.set_bottom_text("after");

        assert_eq!(snapshot.bottom_text, "before");
        assert_eq!(state.config().bottom_text, "after");
    }

    #[test]
    fn dark_mode_does_not_touch_render_config() {
        let mut state = ConfigState::new();
        let before = state.snapshot();
        assert!(state.toggle_dark_mode());
        assert!(!state.toggle_dark_mode());
        state.set_dark_mode(true);
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn unbounded_text_is_kept_verbatim() {
        let mut state = ConfigState::new();
        let long = "x".repeat(10_000);
        state.set_watermark_text(long.clone());
        assert_eq!(state.config().watermark.text, long);
    }
}
