//! # 底图加载模块
//!
//! ## 设计思路
//!
//! 负责把 `ImageSource` 变成原始字节，并在解码前完成体积限制与文件签名校验：
//! 只有签名确认为图片的内容才会进入解码阶段。
//!
//! ## 实现思路
//!
//! - 文件：先看元数据体积，再读取。
//! - 内存字节：直接校验体积与签名。
//! - Base64：支持 `data:image/...;base64,` 与纯 Base64，解码前按长度估算体积上限。

use std::path::Path;

use base64::{Engine as _, engine::general_purpose};

use super::source::RawImageData;
use super::{EngineConfig, MemeError, MemeHandler};

impl MemeHandler {
    pub(super) fn load_from_file(
        &self,
        path: &Path,
        config: &EngineConfig,
    ) -> Result<RawImageData, MemeError> {
        log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

        if !path.exists() {
            return Err(MemeError::FileSystem(format!("文件不存在：{}", path.display())));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| MemeError::FileSystem(format!("无法读取文件信息：{}", e)))?;

        if metadata.len() > config.max_file_size {
            return Err(MemeError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                metadata.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        let bytes = std::fs::read(path)
            .map_err(|e| MemeError::FileSystem(format!("无法读取图片文件：{}", e)))?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "file",
        })
    }

    pub(super) fn load_from_bytes(
        &self,
        bytes: &[u8],
        config: &EngineConfig,
    ) -> Result<RawImageData, MemeError> {
        if bytes.len() as u64 > config.max_file_size {
            return Err(MemeError::ResourceLimit(format!(
                "图片数据过大：{:.2} MB（限制：{:.2} MB）",
                bytes.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }
        Self::validate_image_signature(bytes)?;

        Ok(RawImageData {
            bytes: bytes.to_vec(),
            source_hint: "bytes",
        })
    }

    pub(super) fn load_from_base64(
        &self,
        data: &str,
        config: &EngineConfig,
    ) -> Result<RawImageData, MemeError> {
        let bytes = Self::parse_base64_with_limit(data, config.max_file_size)?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "base64",
        })
    }

    pub(crate) fn parse_base64(data: &str) -> Result<Vec<u8>, MemeError> {
        Self::parse_base64_with_limit(data, u64::MAX)
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, MemeError> {
        let len = base64_data.len() as u64;
        len.checked_add(3)
            .map(|v| v / 4)
            .and_then(|groups| groups.checked_mul(3))
            .ok_or_else(|| MemeError::ResourceLimit("Base64 长度估算溢出".to_string()))
    }

    fn parse_base64_with_limit(data: &str, max_file_size: u64) -> Result<Vec<u8>, MemeError> {
        let normalized = data.trim();

        let payload = if normalized.starts_with("data:") {
            if !normalized.starts_with("data:image/") {
                return Err(MemeError::InvalidFormat("Data URL 不是图片类型".to_string()));
            }
            let base64_start = normalized
                .find(";base64,")
                .ok_or_else(|| MemeError::InvalidFormat("缺少 base64 标记".to_string()))?;
            &normalized[base64_start + 8..]
        } else {
            normalized
        };

        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(payload)?;
        if estimated_len > max_file_size {
            return Err(MemeError::ResourceLimit(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| MemeError::Decode(format!("Base64 解码失败：{}", e)))
    }

    fn validate_image_signature(bytes: &[u8]) -> Result<(), MemeError> {
        if bytes.is_empty() {
            return Err(MemeError::InvalidFormat("图片内容为空".to_string()));
        }

        let kind = infer::get(bytes)
            .ok_or_else(|| MemeError::InvalidFormat("无法识别图片类型".to_string()))?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(MemeError::InvalidFormat(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meme::test_support::png_bytes;

    fn handler() -> MemeHandler {
        MemeHandler::new(EngineConfig::without_system_fonts()).expect("handler init failed")
    }

    #[test]
    fn load_from_bytes_accepts_png() {
        let handler = handler();
        let config = handler.config_snapshot().expect("config snapshot failed");
        let raw = handler
            .load_from_bytes(&png_bytes(4, 4), &config)
            .expect("png bytes should load");
        assert_eq!(raw.source_hint, "bytes");
    }

    #[test]
    fn load_from_bytes_rejects_non_image_payload() {
        let handler = handler();
        let config = handler.config_snapshot().expect("config snapshot failed");
        let result = handler.load_from_bytes(b"%PDF-1.7 not an image", &config);
        assert!(matches!(result, Err(MemeError::InvalidFormat(_))));

        let result = handler.load_from_bytes(&[], &config);
        assert!(matches!(result, Err(MemeError::InvalidFormat(_))));
    }

    #[test]
    fn load_from_bytes_enforces_size_limit() {
        let mut config = EngineConfig::without_system_fonts();
        config.max_file_size = 16;
        let handler = MemeHandler::new(config).expect("handler init failed");
        let config = handler.config_snapshot().expect("config snapshot failed");

        let result = handler.load_from_bytes(&png_bytes(8, 8), &config);
        assert!(matches!(result, Err(MemeError::ResourceLimit(_))));
    }

    #[test]
    fn load_from_base64_accepts_data_url() {
        let handler = handler();
        let config = handler.config_snapshot().expect("config snapshot failed");
        let encoded = general_purpose::STANDARD.encode(png_bytes(3, 2));

        let raw = handler
            .load_from_base64(&format!("data:image/png;base64,{}", encoded), &config)
            .expect("data url should load");
        assert_eq!(raw.source_hint, "base64");

        let raw = handler
            .load_from_base64(&encoded, &config)
            .expect("plain base64 should load");
        assert!(!raw.bytes.is_empty());
    }

    #[test]
    fn load_from_base64_rejects_non_image_data_url() {
        let handler = handler();
        let config = handler.config_snapshot().expect("config snapshot failed");
        let result = handler.load_from_base64("data:text/plain;base64,aGVsbG8=", &config);
        assert!(matches!(result, Err(MemeError::InvalidFormat(_))));
    }

    #[test]
    fn parse_base64_with_limit_rejects_large_payload_before_decode() {
        let huge = "A".repeat(1024 * 1024);
        let result = MemeHandler::parse_base64_with_limit(&huge, 32);
        assert!(matches!(result, Err(MemeError::ResourceLimit(_))));
    }

    #[test]
    fn load_from_missing_file_is_file_system_error() {
        let handler = handler();
        let config = handler.config_snapshot().expect("config snapshot failed");
        let result = handler.load_from_file(Path::new("/definitely/not/here.png"), &config);
        assert!(matches!(result, Err(MemeError::FileSystem(_))));
    }
}
