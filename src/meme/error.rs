//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载加载、解码、排版、导出链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//! `code()` / `stage()` 提供稳定标识，供命令层输出与日志使用。

/// 表情包处理统一错误类型。
///
/// 该类型会在应用层被上转为 `AppError`。
#[derive(Debug, thiserror::Error)]
pub enum MemeError {
    #[error("解码错误：{0}")]
    Decode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("字体错误：{0}")]
    Font(String),

    #[error("编码错误：{0}")]
    Encode(String),
}

impl MemeError {
    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "E_DECODE",
            Self::InvalidFormat(_) => "E_INVALID_FORMAT",
            Self::FileSystem(_) => "E_FILE_SYSTEM",
            Self::ResourceLimit(_) => "E_RESOURCE_LIMIT",
            Self::Font(_) => "E_FONT",
            Self::Encode(_) => "E_ENCODE",
        }
    }

    /// 出错所处的处理阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::FileSystem(_) => "load",
            Self::InvalidFormat(_) | Self::Decode(_) | Self::ResourceLimit(_) => "decode",
            Self::Font(_) => "compose",
            Self::Encode(_) => "export",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_stages_are_stable() {
        let err = MemeError::Decode("bad".to_string());
        assert_eq!(err.code(), "E_DECODE");
        assert_eq!(err.stage(), "decode");

        let err = MemeError::Encode("png".to_string());
        assert_eq!(err.code(), "E_ENCODE");
        assert_eq!(err.stage(), "export");

        let err = MemeError::FileSystem("missing".to_string());
        assert_eq!(err.stage(), "load");
    }
}
