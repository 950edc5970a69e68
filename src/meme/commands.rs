//! # 界面事件命令层
//!
//! ## 设计思路
//!
//! 会话模式下，每一行文本对应界面上的一次操作（输入框编辑、下拉框选择、按钮点击）。
//! 命令层只做“文本 → `UiEvent` → 会话调用”的适配，不承载业务逻辑。
//!
//! 文本类参数取命令词之后的整行剩余内容（保留内部与尾部空白），
//! 因此 `watermark-text   ` 会把水印设为纯空白，正好对应“启用但空白”的情形。

use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::settings::{self, Preset};

use super::model::{FontFamily, Rgb, SizePreset, WatermarkPosition};
use super::service::{MemeSession, RenderOutcome};
use super::{ImageSource, MemeError, RenderProfile};

/// 一次界面操作。
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Load(PathBuf),
    LoadDataUrl(String),
    ClearImage,
    TopText(String),
    BottomText(String),
    Font(FontFamily),
    FillColor(Rgb),
    StrokeColor(Rgb),
    Size(SizePreset),
    Watermark(bool),
    WatermarkText(String),
    WatermarkPosition(WatermarkPosition),
    Profile(RenderProfile),
    ToggleTheme,
    Generate,
    Download(Option<PathBuf>),
    SavePreset(PathBuf),
    LoadPreset(PathBuf),
    Show,
}

impl UiEvent {
    /// 解析一行；空行与 `#` 开头的注释返回 `None`。
    pub fn parse_line(line: &str) -> Result<Option<Self>, MemeError> {
        let line = line.trim_start();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, rest),
            None => (line, ""),
        };
        let arg = rest.trim();
        let require = |what: &str| required(command, arg, what);

        let event = match command.to_lowercase().as_str() {
            "load" => match require("图片路径或 data URL")? {
                url if url.starts_with("data:") => Self::LoadDataUrl(url.to_string()),
                path => Self::Load(PathBuf::from(path)),
            },
            "clear-image" => Self::ClearImage,
            "top" => Self::TopText(rest.to_string()),
            "bottom" => Self::BottomText(rest.to_string()),
            "font" => Self::Font(require("字体")?.parse()?),
            "fill" => Self::FillColor(require("颜色")?.parse()?),
            "stroke" => Self::StrokeColor(require("颜色")?.parse()?),
            "size" => Self::Size(require("尺寸")?.parse()?),
            "watermark" => match require("on/off")?.to_lowercase().as_str() {
                "on" | "true" | "1" => Self::Watermark(true),
                "off" | "false" | "0" => Self::Watermark(false),
                other => {
                    return Err(MemeError::InvalidFormat(format!(
                        "watermark 只接受 on/off：{}",
                        other
                    )));
                }
            },
            "watermark-text" => Self::WatermarkText(rest.to_string()),
            "watermark-position" => Self::WatermarkPosition(require("位置")?.parse()?),
            "profile" => Self::Profile(require("档位")?.parse()?),
            "theme" => Self::ToggleTheme,
            "generate" => Self::Generate,
            "download" => Self::Download((!arg.is_empty()).then(|| PathBuf::from(arg))),
            "save-preset" => Self::SavePreset(PathBuf::from(require("预设路径")?)),
            "load-preset" => Self::LoadPreset(PathBuf::from(require("预设路径")?)),
            "show" => Self::Show,
            other => {
                return Err(MemeError::InvalidFormat(format!("未知命令：{}", other)));
            }
        };

        Ok(Some(event))
    }
}

fn required<'a>(command: &str, arg: &'a str, what: &str) -> Result<&'a str, MemeError> {
    if arg.is_empty() {
        Err(MemeError::InvalidFormat(format!("`{}` 需要参数：{}", command, what)))
    } else {
        Ok(arg)
    }
}

/// 把事件应用到会话上，返回给用户看的一行状态。
pub async fn dispatch(
    session: &mut MemeSession,
    event: UiEvent,
    default_out_dir: &Path,
) -> Result<String, AppError> {
    let status = match event {
        UiEvent::Load(path) => {
            let status = format!("image: {}", path.display());
            session.state_mut().set_image(Some(ImageSource::File(path)));
            status
        }
        UiEvent::LoadDataUrl(url) => {
            session.state_mut().set_image(Some(ImageSource::Base64(url)));
            "image: data url".to_string()
        }
        UiEvent::ClearImage => {
            session.state_mut().set_image(None);
            "image: none".to_string()
        }
        UiEvent::TopText(text) => {
            session.state_mut().set_top_text(text);
            "top text updated".to_string()
        }
        UiEvent::BottomText(text) => {
            session.state_mut().set_bottom_text(text);
            "bottom text updated".to_string()
        }
        UiEvent::Font(family) => {
            session.state_mut().set_font_family(family);
            format!("font: {}", family)
        }
        UiEvent::FillColor(color) => {
            session.state_mut().set_fill_color(color);
            format!("fill: {}", color)
        }
        UiEvent::StrokeColor(color) => {
            session.state_mut().set_stroke_color(color);
            format!("stroke: {}", color)
        }
        UiEvent::Size(preset) => {
            session.state_mut().set_size_preset(preset);
            format!("size: {}", preset)
        }
        UiEvent::Watermark(enabled) => {
            session.state_mut().set_watermark_enabled(enabled);
            format!("watermark: {}", if enabled { "on" } else { "off" })
        }
        UiEvent::WatermarkText(text) => {
            session.state_mut().set_watermark_text(text);
            "watermark text updated".to_string()
        }
        UiEvent::WatermarkPosition(position) => {
            session.state_mut().set_watermark_position(position);
            format!("watermark position: {}", position)
        }
        UiEvent::Profile(profile) => {
            session.handler().set_render_profile(profile)?;
            format!("profile: {}", profile.as_str())
        }
        UiEvent::ToggleTheme => {
            let dark = session.toggle_theme();
            format!("theme: {}", if dark { "dark" } else { "light" })
        }
        UiEvent::Generate => match session.generate().await? {
            RenderOutcome::Skipped => "generate: no image selected".to_string(),
            RenderOutcome::Applied { width, height } => format!("generate: {}x{}", width, height),
            RenderOutcome::Superseded => "generate: superseded".to_string(),
        },
        UiEvent::Download(dir) => {
            let dir = crate::storage::resolve_output_dir(Some(dir.as_deref().unwrap_or(default_out_dir)))?;
            let path = session.download(&dir)?;
            format!("saved: {}", path.display())
        }
        UiEvent::SavePreset(path) => {
            settings::save_preset(&path, &Preset::from_state(session.state()))?;
            format!("preset saved: {}", path.display())
        }
        UiEvent::LoadPreset(path) => {
            settings::load_preset(&path)?.apply_to(session.state_mut());
            format!("preset loaded: {}", path.display())
        }
        UiEvent::Show => {
            let state = session.state();
            let config = state.config();
            format!(
                "image={} top={:?} bottom={:?} font={} fill={} stroke={} size={} watermark={}({:?}, {}) theme={}",
                state.image().map(|s| s.hint()).unwrap_or("none"),
                config.top_text,
                config.bottom_text,
                config.style.font_family,
                config.style.fill_color,
                config.style.stroke_color,
                config.style.size_preset,
                if config.watermark.enabled { "on" } else { "off" },
                config.watermark.text,
                config.watermark.position,
                if state.dark_mode() { "dark" } else { "light" },
            )
        }
    };

    Ok(status)
}
