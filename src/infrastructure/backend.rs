//! 生成后端 - 基础设施层
//!
//! 只暴露两种能力：从文档中提取功能、为单个功能生成测试用例。
//! 返回值都是后端的原始文本（可能带 Markdown 代码块），解析由业务层负责。

use async_trait::async_trait;

use crate::error::LlmError;
use crate::models::Feature;

/// 生成后端
///
/// 职责：
/// - 发起一次外部调用并返回原始响应文本
/// - 不解析 JSON
/// - 不关心调用顺序和限速
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// 从文档文本中提取功能列表，期望返回 `{"features": [...]}`
    async fn extract_features(&self, document: &str) -> Result<String, LlmError>;

    /// 为单个功能生成测试用例，期望返回 `{"test_cases": [...]}`
    async fn generate_test_cases(&self, feature: &Feature) -> Result<String, LlmError>;
}
