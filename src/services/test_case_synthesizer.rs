//! 测试用例生成 - 业务能力层
//!
//! 一个功能对应一次后端调用。调用之间的限速间隔由流程层在每次调用后执行。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::error::LlmError;
use crate::infrastructure::GenerationBackend;
use crate::models::{Feature, RawTestCase};
use crate::services::response::parse_collection;

pub struct TestCaseSynthesizer {
    backend: Arc<dyn GenerationBackend>,
    rate_limit_delay: Duration,
}

impl TestCaseSynthesizer {
    pub const TEST_CASES_KEY: &'static str = "test_cases";

    pub fn new(backend: Arc<dyn GenerationBackend>, rate_limit_delay: Duration) -> Self {
        Self {
            backend,
            rate_limit_delay,
        }
    }

    /// 为单个功能生成原始测试用例
    pub async fn synthesize(&self, feature: &Feature) -> Result<Vec<RawTestCase>, LlmError> {
        debug!("为功能 {} 生成测试用例", feature);
        let response = self.backend.generate_test_cases(feature).await?;
        parse_collection(&response, Self::TEST_CASES_KEY)
    }

    /// 两次调用之间的固定等待
    pub async fn rate_limit_delay(&self) {
        if !self.rate_limit_delay.is_zero() {
            sleep(self.rate_limit_delay).await;
        }
    }
}
