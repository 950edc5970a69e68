//! 导出目录管理模块
//!
//! # 设计思路
//!
//! 统一决定 `meme.png` 写到哪里：优先使用用户指定的目录，
//! 未指定时回退到当前工作目录。目录不存在时自动创建，避免上层判断。
//! 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// 获取导出目录
///
/// # 参数
/// * `custom_dir` - 用户自定义目录（可选，空路径视为未指定）
///
/// # 返回
/// - `Ok(PathBuf)`：可用的导出目录
/// - `Err(AppError::Storage)`：无法获取或创建目录
pub fn resolve_output_dir(custom_dir: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Some(dir) = custom_dir.filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                AppError::Storage(format!("创建目录 '{}' 失败: {}", dir.display(), e))
            })?;
        }
        if !dir.is_dir() {
            return Err(AppError::Storage(format!("'{}' 不是目录", dir.display())));
        }
        return Ok(dir.to_path_buf());
    }

    std::env::current_dir().map_err(|e| AppError::Storage(format!("获取当前目录失败: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_dir_is_created() {
        let dir = std::env::temp_dir()
            .join(format!("meme-storage-test-{}", std::process::id()))
            .join("nested");
        let _ = fs::remove_dir_all(&dir);

        let resolved = resolve_output_dir(Some(&dir)).expect("resolve custom dir");
        assert_eq!(resolved, dir);
        assert!(dir.is_dir());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_or_missing_falls_back_to_cwd() {
        let cwd = std::env::current_dir().expect("cwd");
        assert_eq!(resolve_output_dir(None).expect("default"), cwd);
        assert_eq!(resolve_output_dir(Some(Path::new(""))).expect("empty"), cwd);
    }

    #[test]
    fn file_path_is_rejected() {
        let file = std::env::temp_dir().join(format!("meme-storage-file-{}", std::process::id()));
        fs::write(&file, b"x").expect("write file");

        assert!(matches!(resolve_output_dir(Some(&file)), Err(AppError::Storage(_))));
        let _ = fs::remove_file(&file);
    }
}
