//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示用户选择的底图
//! - `RawImageData` 表示已加载但未解码的字节

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use image::DynamicImage;

/// 底图来源。
///
/// 克隆代价很低（内部共享），渲染请求会各自持有一份。
#[derive(Clone)]
pub enum ImageSource {
    /// 本地文件路径。
    File(PathBuf),
    /// 内存中的编码字节（PNG/JPEG 等）。
    Bytes(Arc<[u8]>),
    /// Base64（支持 Data URL 与纯 Base64 字符串）。
    Base64(String),
    /// 已解码的位图，例如上一次渲染的结果。
    Decoded(Arc<DynamicImage>),
}

impl ImageSource {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(Arc::from(bytes.into()))
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self::Decoded(Arc::new(image))
    }

    /// 来源提示（用于日志与诊断）。
    pub fn hint(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Bytes(_) => "bytes",
            Self::Base64(_) => "base64",
            Self::Decoded(_) => "decoded",
        }
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Self::Base64(data) => write!(f, "Base64({} chars)", data.len()),
            Self::Decoded(image) => write!(f, "Decoded({}x{})", image.width(), image.height()),
        }
    }
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}
