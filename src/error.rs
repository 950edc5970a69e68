//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，命令行入口、会话脚本、预设读写都返回它，
//! 替代分散的 `.map_err(|e| e.to_string())`、`expect()` 等不一致模式。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `MemeError`、`std::io::Error` 提供 `From` 转换，无需手动 map。

use crate::meme::MemeError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 表情包处理链路错误（加载 / 解码 / 合成 / 导出）
    #[error("{0}")]
    Meme(#[from] MemeError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 输出目录不可用
    #[error("输出目录不可用: {0}")]
    Storage(String),

    /// 预设文件读写失败
    #[error("预设错误: {0}")]
    Settings(String),

    /// 会话脚本中的命令无法识别
    #[error("第 {line} 行命令无效: {message}")]
    Script { line: usize, message: String },
}

impl AppError {
    /// 稳定错误码；表情包链路错误沿用 `MemeError::code()`。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Meme(err) => err.code(),
            Self::Io(_) => "E_IO",
            Self::Storage(_) => "E_STORAGE",
            Self::Settings(_) => "E_SETTINGS",
            Self::Script { .. } => "E_SCRIPT",
        }
    }

    /// 出错所处的阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Meme(err) => err.stage(),
            Self::Io(_) | Self::Storage(_) => "export",
            Self::Settings(_) => "settings",
            Self::Script { .. } => "script",
        }
    }

    /// 进程退出码：输入问题为 2，其余为 1。
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Script { .. } | Self::Settings(_) => 2,
            Self::Meme(MemeError::InvalidFormat(_)) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meme_error_converts_transparently() {
        let err: AppError = MemeError::Decode("boom".to_string()).into();
        assert_eq!(err.to_string(), "解码错误：boom");
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.code(), "E_DECODE");
        assert_eq!(err.stage(), "decode");
    }

    #[test]
    fn script_error_mentions_line() {
        let err = AppError::Script {
            line: 3,
            message: "unknown command".to_string(),
        };
        assert!(err.to_string().contains('3'));
        assert_eq!(err.exit_code(), 2);
        assert_eq!((err.code(), err.stage()), ("E_SCRIPT", "script"));
    }
}
