//! 文档读取 - 基础设施层
//!
//! PDF / DOCX 解析不在本 crate 内实现，只内置纯文本读取器；
//! 其他格式由调用方提供自己的 [`DocumentContentReader`]。

use std::path::Path;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::DocumentError;

/// 文档读取器：把文件转换为纯文本
#[async_trait]
pub trait DocumentContentReader: Send + Sync {
    async fn read(&self, path: &Path) -> Result<String, DocumentError>;
}

/// 纯文本读取器（`.txt` / `.md`，UTF-8）
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextReader;

impl PlainTextReader {
    const EXTENSIONS: [&'static str; 3] = ["txt", "md", "text"];

    pub fn new() -> Self {
        Self
    }

    pub fn supports(path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| Self::EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}

#[async_trait]
impl DocumentContentReader for PlainTextReader {
    async fn read(&self, path: &Path) -> Result<String, DocumentError> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Err(DocumentError::NotFound {
                path: path.to_path_buf(),
            });
        }

        if !Self::supports(path) {
            let extension = path
                .extension()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            return Err(DocumentError::UnsupportedFormat { extension });
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|source| DocumentError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })?;

        debug!("读取文档 {}: {} 字符", path.display(), content.chars().count());
        Ok(content)
    }
}
