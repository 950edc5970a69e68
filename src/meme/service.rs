//! # 会话层（事件驱动）
//!
//! ## 设计思路
//!
//! `MemeSession` 对应一个打开的编辑界面：持有配置状态、唯一的画布，以及处理器。
//! “生成”按钮对应 `request_render` / `generate`，“下载”对应 `download`，
//! “切换主题”对应 `toggle_theme`。
//!
//! ## 实现思路
//!
//! - 解码是唯一的挂起点，放在 `spawn_blocking` 中执行。
//! - 发起请求时即截取参数快照，之后的编辑不会影响这次渲染。
//! - 每个请求领取递增的代号；完成时只有代号仍是最新的请求才能写画布，
//!   被后来请求取代的结果直接丢弃（`RenderOutcome::Superseded`）。
//! - 没有底图时“生成”是空操作，不报错。

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use super::export;
use super::raster::RenderedRaster;
use super::state::ConfigState;
use super::{EngineConfig, MemeError, MemeHandler, RenderProfile};

/// 一次“生成”的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// 未选择底图，什么都没做。
    Skipped,
    /// 已写入画布。
    Applied { width: u32, height: u32 },
    /// 完成时已有更新的请求，结果被丢弃。
    Superseded,
}

/// 已发起、尚未完成的渲染请求。
pub struct RenderTask {
    generation: u64,
    handle: JoinHandle<Result<RenderOutcome, MemeError>>,
}

impl RenderTask {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 等待解码与合成完成。
    pub async fn wait(self) -> Result<RenderOutcome, MemeError> {
        self.handle
            .await
            .map_err(|e| MemeError::ResourceLimit(format!("渲染任务异常终止：{}", e)))?
    }
}

pub struct MemeSession {
    handler: Arc<MemeHandler>,
    state: ConfigState,
    surface: Arc<Mutex<RenderedRaster>>,
    generation: Arc<AtomicU64>,
}

impl MemeSession {
    /// 使用默认引擎配置创建会话。
    pub fn new() -> Result<Self, MemeError> {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, MemeError> {
        Ok(Self {
            handler: Arc::new(MemeHandler::new(config)?),
            state: ConfigState::new(),
            surface: Arc::new(Mutex::new(RenderedRaster::blank())),
            generation: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn handler(&self) -> &MemeHandler {
        &self.handler
    }

    pub fn state(&self) -> &ConfigState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ConfigState {
        &mut self.state
    }

    /// 发起渲染请求；没有底图时返回 `None`。
    ///
    /// 需要在 tokio 运行时内调用。
    pub fn request_render(&self) -> Option<RenderTask> {
        let source = self.state.image()?.clone();
        let config = self.state.snapshot();

        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let handler = Arc::clone(&self.handler);
        let surface = Arc::clone(&self.surface);
        let generation = Arc::clone(&self.generation);

        log::debug!("发起渲染请求 #{} - 来源: {}", ticket, source.hint());

        let handle = tokio::task::spawn_blocking(move || {
            let raster = handler.process(&source, &config).inspect_err(|err| {
                log::warn!(
                    "渲染请求 #{} 失败 - 阶段: {} 错误码: {} - {}",
                    ticket,
                    err.stage(),
                    err.code(),
                    err
                );
            })?;

            let mut guard = surface
                .lock()
                .map_err(|_| MemeError::ResourceLimit("画布锁已中毒".to_string()))?;

            let latest = generation.load(Ordering::SeqCst);
            if latest != ticket {
                log::debug!("渲染请求 #{} 已被 #{} 取代，丢弃结果", ticket, latest);
                return Ok(RenderOutcome::Superseded);
            }

            let outcome = RenderOutcome::Applied {
                width: raster.width(),
                height: raster.height(),
            };
            *guard = raster;
            Ok(outcome)
        });

        Some(RenderTask {
            generation: ticket,
            handle,
        })
    }

    /// “生成”：发起请求并等待完成。
    pub async fn generate(&self) -> Result<RenderOutcome, MemeError> {
        match self.request_render() {
            Some(task) => task.wait().await,
            None => {
                log::info!("未选择图片，跳过生成");
                Ok(RenderOutcome::Skipped)
            }
        }
    }

    /// 当前画布内容的副本。
    pub fn surface(&self) -> Result<RenderedRaster, MemeError> {
        self.surface
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| MemeError::ResourceLimit("画布锁已中毒".to_string()))
    }

    pub fn export_png(&self) -> Result<Vec<u8>, MemeError> {
        export::encode_png(&self.surface()?)
    }

    pub fn export_data_url(&self) -> Result<String, MemeError> {
        export::to_data_url(&self.surface()?)
    }

    /// “下载”：把当前画布写成 `<dir>/meme.png`。
    pub fn download(&self, dir: &Path) -> Result<PathBuf, MemeError> {
        export::save_png(&self.surface()?, dir)
    }

    /// “切换主题”：只翻转展示标记，返回切换后的值。
    pub fn toggle_theme(&mut self) -> bool {
        let dark = self.state.toggle_dark_mode();
        log::info!("🌓 主题已切换：{}", if dark { "dark" } else { "light" });
        dark
    }

    pub fn set_render_profile(&self, profile: &str) -> Result<(), MemeError> {
        let profile: RenderProfile = profile.parse()?;
        self.handler.set_render_profile(profile)
    }

    pub fn get_render_profile(&self) -> Result<String, MemeError> {
        Ok(self.handler.get_render_profile()?.as_str().to_string())
    }
}
