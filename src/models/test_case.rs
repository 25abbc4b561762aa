use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::models::label::match_alias;
use crate::models::{Label, Priority};
use crate::utils::RawRecord;

/// 后端返回的原始测试用例记录（字段名不可信）
pub type RawTestCase = RawRecord;

/// 测试类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestType {
    Positive,
    Negative,
    Boundary,
    Edge,
    Conflict,
    Fallback,
    Integration,
    Compatibility,
}

impl TestType {
    /// 获取标准名称
    pub fn as_str(self) -> &'static str {
        match self {
            TestType::Positive => "Positive",
            TestType::Negative => "Negative",
            TestType::Boundary => "Boundary",
            TestType::Edge => "Edge",
            TestType::Conflict => "Conflict",
            TestType::Fallback => "Fallback",
            TestType::Integration => "Integration",
            TestType::Compatibility => "Compatibility",
        }
    }

    const ALIASES: [(&'static str, TestType); 8] = [
        ("positive", TestType::Positive),
        ("negative", TestType::Negative),
        ("boundary", TestType::Boundary),
        ("edge", TestType::Edge),
        ("conflict", TestType::Conflict),
        ("fallback", TestType::Fallback),
        ("integration", TestType::Integration),
        ("compatibility", TestType::Compatibility),
    ];

    /// 智能查找测试类型（忽略大小写，如 "Negative Test" → Negative）
    pub fn find(s: &str) -> Option<Self> {
        match_alias(s, &Self::ALIASES)
    }
}

impl AsRef<str> for TestType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for TestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 规范化后的测试用例
///
/// `feature_id` / `feature_name` 总是取自所属功能，不使用后端回显的值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub test_case_id: String,
    pub test_case_name: String,
    pub feature_id: String,
    pub feature_name: String,
    pub module: String,
    /// 无法识别的值保留原文
    pub test_type: Option<Label<TestType>>,
    pub priority: Option<Label<Priority>>,
    pub category: String,
    pub gap_coverage: String,
    pub preconditions: String,
    /// 编号后的多行步骤
    pub steps: String,
    pub test_data: String,
    pub expected_result: String,
    pub source_reference: String,
    pub generated_at: DateTime<Local>,
}
