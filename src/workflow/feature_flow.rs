//! 功能处理流程 - 流程层
//!
//! 核心职责：定义"一个功能"的完整处理流程
//!
//! 流程顺序：
//! 1. 后端生成原始测试用例
//! 2. 逐条规范化（功能编号 / 名称以功能为准）
//! 3. 限速等待（无论成功失败）

use chrono::Local;
use tracing::{info, warn};

use crate::models::{Feature, TestCase};
use crate::services::normalizer::normalize_test_case;
use crate::services::TestCaseSynthesizer;
use crate::workflow::feature_ctx::FeatureCtx;

/// 功能处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureOutcome {
    /// 生成成功（可能为空列表）
    Generated(Vec<TestCase>),
    /// 跳过（后端调用或解析失败）
    Skipped { reason: String },
}

impl FeatureOutcome {
    /// 取出测试用例，跳过的功能贡献空列表
    pub fn into_test_cases(self) -> Vec<TestCase> {
        match self {
            FeatureOutcome::Generated(cases) => cases,
            FeatureOutcome::Skipped { .. } => Vec::new(),
        }
    }
}

/// 功能处理流程
///
/// - 单个功能失败只影响这个功能，不会终止整个会话
/// - 不持有会话状态，进度由编排层报告
pub struct FeatureFlow {
    synthesizer: TestCaseSynthesizer,
}

impl FeatureFlow {
    pub fn new(synthesizer: TestCaseSynthesizer) -> Self {
        Self { synthesizer }
    }

    pub async fn run(&self, feature: &Feature, ctx: &FeatureCtx) -> FeatureOutcome {
        let result = self.synthesizer.synthesize(feature).await;

        // 每次调用之后都要等待，失败也一样
        self.synthesizer.rate_limit_delay().await;

        match result {
            Ok(raw_cases) => {
                let generated_at = Local::now();
                let cases: Vec<TestCase> = raw_cases
                    .iter()
                    .map(|raw| normalize_test_case(raw, feature, generated_at))
                    .collect();
                info!("{} ✓ {} 生成 {} 个测试用例", ctx, feature, cases.len());
                FeatureOutcome::Generated(cases)
            }
            Err(e) => {
                warn!("{} ⚠️ {} 生成失败，已跳过: {}", ctx, feature, e);
                FeatureOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
        }
    }
}
