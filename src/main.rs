//! # 表情包生成器：命令行入口
//!
//! 本文件只负责参数解析、日志初始化与子命令分发。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::fs;
use std::io::{self, BufRead, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use meme_generator::error::AppError;
use meme_generator::meme::{
    self, EngineConfig, FONT_DIR_ENV, FontFamily, ImageSource, MemeSession, RenderOutcome,
    RenderProfile, Rgb, SizePreset, UiEvent, WatermarkPosition,
};
use meme_generator::settings::{self, Preset};
use meme_generator::storage;

/// Meme Generator - caption images with top/bottom text and a watermark
#[derive(Parser, Debug)]
#[command(name = "meme-generator")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Resize profile: quality, balanced or speed
    #[arg(long, global = true)]
    profile: Option<RenderProfile>,

    /// Extra font directory, searched before the system ones (repeatable)
    #[arg(long = "font-dir", global = true)]
    font_dirs: Vec<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one meme and save it as meme.png
    Render(RenderArgs),
    /// Read UI events line by line from a script or stdin
    Session {
        /// Event script; stdin when omitted
        script: Option<PathBuf>,

        /// Directory used by `download` without an argument
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Show which font file each family resolves to
    Fonts,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Base image path or `data:` URL, `-` reads the image from stdin
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Top caption
    #[arg(long)]
    top: Option<String>,

    /// Bottom caption
    #[arg(long)]
    bottom: Option<String>,

    /// Font family: Impact, Comic Sans MS, Arial Black
    #[arg(long)]
    font: Option<FontFamily>,

    /// Fill color (#rrggbb)
    #[arg(long)]
    fill: Option<Rgb>,

    /// Stroke color (#rrggbb)
    #[arg(long)]
    stroke: Option<Rgb>,

    /// Output width: small, medium, large
    #[arg(long)]
    size: Option<SizePreset>,

    /// Draw the watermark
    #[arg(long, conflicts_with = "no_watermark")]
    watermark: bool,

    /// Do not draw the watermark
    #[arg(long)]
    no_watermark: bool,

    /// Watermark text
    #[arg(long)]
    watermark_text: Option<String>,

    /// Watermark corner: bottom-right, bottom-left, top-right, top-left
    #[arg(long)]
    watermark_position: Option<WatermarkPosition>,

    /// Dark theme flag, stored in presets only
    #[arg(long)]
    dark_mode: bool,

    /// Load settings from a JSON preset before applying flags
    #[arg(long)]
    preset: Option<PathBuf>,

    /// Save the effective settings as a JSON preset
    #[arg(long)]
    save_preset: Option<PathBuf>,

    /// Directory for meme.png (defaults to the working directory)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Also print the PNG as a data URL
    #[arg(long)]
    data_url: bool,

    /// Print a JSON report instead of the plain summary
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            log::error!("❌ [{}@{}] {}", err.code(), err.stage(), err);
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, AppError> {
    let mut engine = EngineConfig::default();
    let mut font_dirs = cli.font_dirs.clone();
    font_dirs.append(&mut engine.font_dirs);
    engine.font_dirs = font_dirs;

    let mut session = MemeSession::with_config(engine)?;
    if let Some(profile) = cli.profile {
        session.handler().set_render_profile(profile)?;
    }

    match cli.command {
        Command::Render(args) => {
            let json = args.json;
            if let Err(err) = render(&mut session, args).await {
                if json {
                    let report = serde_json::json!({
                        "error": {
                            "code": err.code(),
                            "stage": err.stage(),
                            "message": err.to_string(),
                        }
                    });
                    println!("{}", report);
                }
                return Err(err);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Session { script, out_dir } => run_session(&mut session, script, out_dir).await,
        Command::Fonts => {
            list_fonts(&session);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn render(session: &mut MemeSession, args: RenderArgs) -> Result<(), AppError> {
    if let Some(path) = &args.preset {
        settings::load_preset(path)?.apply_to(session.state_mut());
    }

    let state = session.state_mut();
    if let Some(path) = &args.image {
        state.set_image(Some(read_image_source(path)?));
    }
    if let Some(text) = args.top {
        state.set_top_text(text);
    }
    if let Some(text) = args.bottom {
        state.set_bottom_text(text);
    }
    if let Some(family) = args.font {
        state.set_font_family(family);
    }
    if let Some(color) = args.fill {
        state.set_fill_color(color);
    }
    if let Some(color) = args.stroke {
        state.set_stroke_color(color);
    }
    if let Some(preset) = args.size {
        state.set_size_preset(preset);
    }
    if args.watermark {
        state.set_watermark_enabled(true);
    }
    if args.no_watermark {
        state.set_watermark_enabled(false);
    }
    if let Some(text) = args.watermark_text {
        state.set_watermark_text(text);
    }
    if let Some(position) = args.watermark_position {
        state.set_watermark_position(position);
    }
    if args.dark_mode {
        state.set_dark_mode(true);
    }

    if let Some(path) = &args.save_preset {
        settings::save_preset(path, &Preset::from_state(session.state()))?;
    }

    let outcome = session.generate().await?;
    if outcome == RenderOutcome::Skipped {
        log::warn!("⚠️ 未指定底图，导出的是空白画布");
    }

    let dir = storage::resolve_output_dir(args.out_dir.as_deref())?;
    let path = session.download(&dir)?;
    let surface = session.surface()?;

    if args.json {
        let draws: Vec<serde_json::Value> = surface
            .draws()
            .iter()
            .map(|draw| {
                serde_json::json!({
                    "role": format!("{:?}", draw.role),
                    "text": draw.text,
                    "x": draw.position.x,
                    "y": draw.position.y,
                    "align": format!("{:?}", draw.align),
                    "font_px": draw.font_px,
                    "family": draw.family.css_name(),
                })
            })
            .collect();

        let mut report = serde_json::json!({
            "path": path.display().to_string(),
            "width": surface.width(),
            "height": surface.height(),
            "draws": draws,
        });
        if args.data_url {
            report["data_url"] = serde_json::Value::String(session.export_data_url()?);
        }

        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| AppError::Settings(format!("序列化报告失败: {}", e)))?;
        println!("{}", text);
    } else {
        println!(
            "saved {} ({}x{})",
            path.display(),
            surface.width(),
            surface.height()
        );
        if args.data_url {
            println!("{}", session.export_data_url()?);
        }
    }

    Ok(())
}

fn read_image_source(path: &Path) -> Result<ImageSource, AppError> {
    if path.as_os_str() == "-" {
        let mut bytes = Vec::new();
        io::stdin().read_to_end(&mut bytes)?;
        return Ok(ImageSource::from_bytes(bytes));
    }
    if let Some(url) = path.to_str().filter(|p| p.starts_with("data:")) {
        return Ok(ImageSource::Base64(url.to_string()));
    }
    Ok(ImageSource::File(path.to_path_buf()))
}

async fn run_session(
    session: &mut MemeSession,
    script: Option<PathBuf>,
    out_dir: Option<PathBuf>,
) -> Result<ExitCode, AppError> {
    let default_out_dir = storage::resolve_output_dir(out_dir.as_deref())?;

    let lines: Vec<String> = match &script {
        Some(path) => fs::read_to_string(path)?.lines().map(str::to_string).collect(),
        None => io::stdin().lock().lines().collect::<Result<_, _>>()?,
    };

    let mut failures = 0usize;
    for (index, line) in lines.iter().enumerate() {
        let event = match UiEvent::parse_line(line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(err) => {
                failures += 1;
                let err = AppError::Script {
                    line: index + 1,
                    message: err.to_string(),
                };
                log::error!("❌ [{}@{}] {}", err.code(), err.stage(), err);
                continue;
            }
        };

        match meme::dispatch(session, event, &default_out_dir).await {
            Ok(status) => println!("{}", status),
            Err(err) => {
                failures += 1;
                log::error!(
                    "❌ 第 {} 行执行失败 [{}@{}]: {}",
                    index + 1,
                    err.code(),
                    err.stage(),
                    err
                );
            }
        }
    }

    if failures > 0 {
        log::warn!("⚠️ 会话结束，{} 条命令失败", failures);
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

fn list_fonts(session: &MemeSession) {
    let dirs = session.handler().font_dirs();
    if dirs.is_empty() {
        println!("font dirs: (none)");
    } else {
        for dir in &dirs {
            println!("font dir: {}", dir.display());
        }
    }
    println!("extra dirs via {}", FONT_DIR_ENV);

    for (family, weight, path) in session.handler().resolved_fonts() {
        let resolved = path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "builtin-8x8 (fallback)".to_string());
        println!("{:<14} {:<8} {}", family.css_name(), format!("{:?}", weight), resolved);
    }
}
