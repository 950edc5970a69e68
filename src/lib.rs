//! # 表情包生成器：库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  前端（命令行 / 会话脚本）                 │
//! │                                                          │
//! │  render 子命令 ── session 子命令 ── fonts 子命令          │
//! │       │              │ (逐行 UiEvent)                    │
//! └───────┼──────────────┼───────────────────────────────────┘
//!         ↕              ↕  Result<_, AppError>
//! ┌───────┼──────────────┼───────────────────────────────────┐
//! │       ↕            后端 (Rust)                           │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  ├─ meme ─────── 会话 + 处理流水线                        │
//! │  │   ├─ service     画布 / 请求代号 / 参数快照            │
//! │  │   ├─ loader      文件·字节·Base64 加载                 │
//! │  │   ├─ pipeline    解码·限制·缩放                        │
//! │  │   ├─ compositor  排版·文字与水印绘制                   │
//! │  │   └─ export      PNG / Data URL / meme.png             │
//! │  │                                                       │
//! │  ├─ settings         预设 JSON 读写                      │
//! │  └─ storage          导出目录（返回 Result）             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，命令行各入口的返回类型 |
//! | [`meme`] | 参数状态、底图加载解码、文字合成、导出 |
//! | [`settings`] | 界面参数预设的保存与加载 |
//! | [`storage`] | 导出目录的获取与自动创建 |

pub mod error;
pub mod meme;
pub mod settings;
pub mod storage;
