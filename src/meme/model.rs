//! # 表情包参数模型
//!
//! ## 设计思路
//!
//! 所有“下拉框式”选项（字体、尺寸、水印位置）都建模为封闭枚举，字符串只在输入边界解析，
//! 之后的流程不再出现非法状态。
//!
//! `MemeConfig` 是一次渲染请求的不可变快照，由 `ConfigState::snapshot` 产生，
//! 作为参数传入合成器，而不是让合成器去读共享的可变状态。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::MemeError;

/// 描边宽度（像素），固定常量。
pub const STROKE_WIDTH: f32 = 2.0;
/// 主文字字号下限（像素）。
pub const MIN_FONT_SIZE: f32 = 30.0;
/// 目标宽度与字号的比例：字号 = 宽度 / 15。
pub const FONT_SIZE_DIVISOR: f32 = 15.0;
/// 默认水印文字。
pub const DEFAULT_WATERMARK_TEXT: &str = "@NidhimemeApp";

/// 可选字体家族。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    #[serde(rename = "Impact")]
    Impact,
    #[serde(rename = "Comic Sans MS")]
    ComicSansMs,
    #[serde(rename = "Arial Black")]
    ArialBlack,
}

impl FontFamily {
    pub const ALL: [FontFamily; 3] = [Self::Impact, Self::ComicSansMs, Self::ArialBlack];

    /// CSS 风格的家族名。
    pub fn css_name(self) -> &'static str {
        match self {
            Self::Impact => "Impact",
            Self::ComicSansMs => "Comic Sans MS",
            Self::ArialBlack => "Arial Black",
        }
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_name())
    }
}

impl FromStr for FontFamily {
    type Err = MemeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "impact" => Ok(Self::Impact),
            "comicsans" | "comicsansms" => Ok(Self::ComicSansMs),
            "arialblack" => Ok(Self::ArialBlack),
            _ => Err(MemeError::InvalidFormat(format!(
                "未知字体：{}（可选：Impact / Comic Sans MS / Arial Black）",
                value.trim()
            ))),
        }
    }
}

/// 输出尺寸档位，对应固定的目标宽度。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizePreset {
    Small,
    #[default]
    Medium,
    Large,
}

impl SizePreset {
    pub const ALL: [SizePreset; 3] = [Self::Small, Self::Medium, Self::Large];

    /// 目标像素宽度。
    pub fn width(self) -> u32 {
        match self {
            Self::Small => 300,
            Self::Medium => 500,
            Self::Large => 600,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for SizePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}px)", self.as_str(), self.width())
    }
}

impl FromStr for SizePreset {
    type Err = MemeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "small" | "300" => Ok(Self::Small),
            "medium" | "500" => Ok(Self::Medium),
            "large" | "600" => Ok(Self::Large),
            other => Err(MemeError::InvalidFormat(format!(
                "未知尺寸：{}（可选：small / medium / large）",
                other
            ))),
        }
    }
}

/// 水印锚定的角落。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPosition {
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

impl WatermarkPosition {
    pub const ALL: [WatermarkPosition; 4] = [
        Self::BottomRight,
        Self::BottomLeft,
        Self::TopRight,
        Self::TopLeft,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BottomRight => "bottom-right",
            Self::BottomLeft => "bottom-left",
            Self::TopRight => "top-right",
            Self::TopLeft => "top-left",
        }
    }
}

impl fmt::Display for WatermarkPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatermarkPosition {
    type Err = MemeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase().replace([' ', '_'], "-");
        match normalized.as_str() {
            "bottom-right" => Ok(Self::BottomRight),
            "bottom-left" => Ok(Self::BottomLeft),
            "top-right" => Ok(Self::TopRight),
            "top-left" => Ok(Self::TopLeft),
            _ => Err(MemeError::InvalidFormat(format!(
                "未知水印位置：{}（可选：bottom-right / bottom-left / top-right / top-left）",
                value.trim()
            ))),
        }
    }
}

/// 不透明 RGB 颜色。
///
/// 序列化为 `#rrggbb` 字符串。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = MemeError;

    /// 支持 `#rgb`、`#rrggbb`（`#` 可省略）以及少量常用颜色名。
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        match trimmed.to_lowercase().as_str() {
            "white" => return Ok(Self::WHITE),
            "black" => return Ok(Self::BLACK),
            "red" => return Ok(Self::new(255, 0, 0)),
            "green" => return Ok(Self::new(0, 128, 0)),
            "blue" => return Ok(Self::new(0, 0, 255)),
            "yellow" => return Ok(Self::new(255, 255, 0)),
            _ => {}
        }

        let hex = trimmed.trim_start_matches('#');
        let invalid = || MemeError::InvalidFormat(format!("无法解析颜色：{}", trimmed));

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        match hex.len() {
            3 => {
                let expand = |i: usize| channel(&hex[i..i + 1].repeat(2));
                Ok(Self::new(expand(0)?, expand(1)?, expand(2)?))
            }
            6 => Ok(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = MemeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}

/// 文字样式。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSettings {
    pub font_family: FontFamily,
    pub fill_color: Rgb,
    pub stroke_color: Rgb,
    pub size_preset: SizePreset,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            font_family: FontFamily::Impact,
            fill_color: Rgb::WHITE,
            stroke_color: Rgb::BLACK,
            size_preset: SizePreset::Medium,
        }
    }
}

/// 水印设置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkSettings {
    pub enabled: bool,
    pub text: String,
    pub position: WatermarkPosition,
}

impl WatermarkSettings {
    /// 启用且去除首尾空白后非空时才绘制。
    pub fn is_visible(&self) -> bool {
        self.enabled && !self.text.trim().is_empty()
    }
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            text: DEFAULT_WATERMARK_TEXT.to_string(),
            position: WatermarkPosition::BottomRight,
        }
    }
}

/// 画布尺寸的归一化坐标。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

impl Anchor {
    pub const TOP: Anchor = Anchor { x: 0.5, y: 0.1 };
    pub const BOTTOM: Anchor = Anchor { x: 0.5, y: 0.9 };
}

/// 文字在画面中的角色。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Top,
    Bottom,
    Watermark,
}

/// 主文字图层：内容加固定锚点。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayer<'a> {
    pub role: TextRole,
    pub content: &'a str,
    pub anchor: Anchor,
}

/// 一次渲染请求的不可变参数快照。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemeConfig {
    pub top_text: String,
    pub bottom_text: String,
    pub style: StyleSettings,
    pub watermark: WatermarkSettings,
}

impl MemeConfig {
    /// 顶部与底部两个文字图层，顺序即绘制顺序。
    pub fn text_layers(&self) -> [TextLayer<'_>; 2] {
        [
            TextLayer {
                role: TextRole::Top,
                content: &self.top_text,
                anchor: Anchor::TOP,
            },
            TextLayer {
                role: TextRole::Bottom,
                content: &self.bottom_text,
                anchor: Anchor::BOTTOM,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_preset_widths() {
        assert_eq!(SizePreset::Small.width(), 300);
        assert_eq!(SizePreset::Medium.width(), 500);
        assert_eq!(SizePreset::Large.width(), 600);
        assert_eq!("500".parse::<SizePreset>().expect("numeric alias"), SizePreset::Medium);
    }

    #[test]
    fn font_family_accepts_css_and_short_names() {
        assert_eq!("Comic Sans MS".parse::<FontFamily>().expect("css"), FontFamily::ComicSansMs);
        assert_eq!("comic-sans".parse::<FontFamily>().expect("short"), FontFamily::ComicSansMs);
        assert_eq!("arial_black".parse::<FontFamily>().expect("snake"), FontFamily::ArialBlack);
        assert!("Helvetica".parse::<FontFamily>().is_err());
    }

    #[test]
    fn watermark_position_parse() {
        assert_eq!("Top Left".parse::<WatermarkPosition>().expect("spaced"), WatermarkPosition::TopLeft);
        assert_eq!("bottom_right".parse::<WatermarkPosition>().expect("snake"), WatermarkPosition::BottomRight);
        assert!("center".parse::<WatermarkPosition>().is_err());
    }

    #[test]
    fn rgb_parses_hex_forms() {
        assert_eq!("#ffffff".parse::<Rgb>().expect("long"), Rgb::WHITE);
        assert_eq!("000".parse::<Rgb>().expect("short"), Rgb::BLACK);
        assert_eq!("#1A2b3C".parse::<Rgb>().expect("mixed case"), Rgb::new(0x1a, 0x2b, 0x3c));
        assert_eq!("#f80".parse::<Rgb>().expect("short expand"), Rgb::new(0xff, 0x88, 0x00));
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#gggggg".parse::<Rgb>().is_err());
        assert!("#ééé".parse::<Rgb>().is_err());
    }

    #[test]
    fn defaults_match_initial_form() {
        let config = MemeConfig::default();
        assert_eq!(config.top_text, "");
        assert_eq!(config.bottom_text, "");
        assert_eq!(config.style.size_preset, SizePreset::Medium);
        assert_eq!(config.style.font_family, FontFamily::Impact);
        assert_eq!(config.style.fill_color, Rgb::WHITE);
        assert_eq!(config.style.stroke_color, Rgb::BLACK);
        assert!(config.watermark.enabled);
        assert_eq!(config.watermark.text, "@NidhimemeApp");
        assert_eq!(config.watermark.position, WatermarkPosition::BottomRight);
    }

    #[test]
    fn watermark_visibility_ignores_whitespace() {
        let mut watermark = WatermarkSettings::default();
        assert!(watermark.is_visible());

        watermark.text = "  \t".to_string();
        assert!(!watermark.is_visible());

        watermark.text = "@me".to_string();
        watermark.enabled = false;
        assert!(!watermark.is_visible());
    }

    #[test]
    fn config_serializes_with_readable_enums() {
        let config = MemeConfig::default();
        let json = serde_json::to_value(&config).expect("serialize config");
        assert_eq!(json["style"]["font_family"], "Impact");
        assert_eq!(json["style"]["fill_color"], "#ffffff");
        assert_eq!(json["style"]["size_preset"], "medium");
        assert_eq!(json["watermark"]["position"], "bottom-right");

        let back: MemeConfig = serde_json::from_value(json).expect("deserialize config");
        assert_eq!(back, config);
    }
}
