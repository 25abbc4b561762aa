//! 功能提取 - 业务能力层
//!
//! 一次后端调用，把文档文本转换为原始功能列表。解析失败即整体失败，不做部分恢复。

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::LlmError;
use crate::infrastructure::GenerationBackend;
use crate::models::RawFeature;
use crate::services::response::parse_collection;

pub struct FeatureExtractor {
    backend: Arc<dyn GenerationBackend>,
    max_document_chars: usize,
}

impl FeatureExtractor {
    pub const FEATURES_KEY: &'static str = "features";

    pub fn new(backend: Arc<dyn GenerationBackend>, max_document_chars: usize) -> Self {
        Self {
            backend,
            max_document_chars,
        }
    }

    /// 提取原始功能记录（顺序与后端返回一致）
    pub async fn extract(&self, text: &str) -> Result<Vec<RawFeature>, LlmError> {
        let document = truncate_document(text, self.max_document_chars);
        if document.len() < text.len() {
            warn!(
                "⚠️ 文档超过 {} 字符，只发送开头部分",
                self.max_document_chars
            );
        }
        debug!("发送文档: {} 字符", document.chars().count());

        let response = self.backend.extract_features(document).await?;
        let features = parse_collection(&response, Self::FEATURES_KEY)?;

        info!("✓ 提取到 {} 个功能", features.len());
        Ok(features)
    }
}

/// 按字符数截断文档，不会切断多字节字符
pub fn truncate_document(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Feature;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 记录收到的文档并返回固定响应
    struct CannedBackend {
        response: String,
        received: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GenerationBackend for CannedBackend {
        async fn extract_features(&self, document: &str) -> Result<String, LlmError> {
            self.received.lock().unwrap().push(document.to_string());
            Ok(self.response.clone())
        }

        async fn generate_test_cases(&self, _feature: &Feature) -> Result<String, LlmError> {
            unreachable!("extractor never generates test cases")
        }
    }

    fn backend(response: &str) -> Arc<CannedBackend> {
        Arc::new(CannedBackend {
            response: response.to_string(),
            received: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn test_truncate_document() {
        assert_eq!(truncate_document("abcdef", 3), "abc");
        assert_eq!(truncate_document("abc", 10), "abc");
        assert_eq!(truncate_document("功能需求", 2), "功能");
    }

    #[tokio::test]
    async fn test_only_head_of_long_document_is_sent() {
        let fake = backend(r#"{"features": []}"#);
        let extractor = FeatureExtractor::new(fake.clone(), 10);

        extractor.extract(&"x".repeat(25)).await.unwrap();

        let received = fake.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0], "x".repeat(10));
    }

    #[test]
    fn test_fenced_response_is_parsed() {
        let fake = backend("```json\n{\"features\": [{\"feature_name\": \"Login\"}]}\n```");
        let extractor = FeatureExtractor::new(fake, 50_000);
        let features = tokio_test::assert_ok!(tokio_test::block_on(extractor.extract("document")));
        assert_eq!(features.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_features_key_fails() {
        let fake = backend(r#"{"feature_list": []}"#);
        let err = FeatureExtractor::new(fake, 50_000)
            .extract("document")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MissingKey { key: "features" }));
    }
}
