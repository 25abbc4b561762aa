use serde::{Deserialize, Serialize};

use crate::models::label::match_alias;
use crate::utils::RawRecord;

/// 后端返回的原始功能记录（字段名不可信）
pub type RawFeature = RawRecord;

/// 优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// 获取标准名称
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    const ALIASES: [(&'static str, Priority); 8] = [
        ("high", Priority::High),
        ("critical", Priority::High),
        ("p1", Priority::High),
        ("medium", Priority::Medium),
        ("normal", Priority::Medium),
        ("p2", Priority::Medium),
        ("low", Priority::Low),
        ("p3", Priority::Low),
    ];

    /// 智能查找优先级（忽略大小写，支持 "P1" / "Critical" 等常见写法）
    pub fn find(s: &str) -> Option<Self> {
        match_alias(s, &Self::ALIASES)
    }
}

impl AsRef<str> for Priority {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 规范化后的功能
///
/// 由 [`crate::services::normalizer::normalize_feature`] 生成，之后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub feature_id: String,
    pub feature_name: String,
    pub description: String,
    pub module: String,
    pub requirements: Vec<String>,
    pub acceptance_criteria: Vec<String>,
    pub priority: Priority,
    /// 文档中描述该功能的原文
    pub source_reference: String,
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.feature_name, self.feature_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_find() {
        assert_eq!(Priority::find("High"), Some(Priority::High));
        assert_eq!(Priority::find("  low "), Some(Priority::Low));
        assert_eq!(Priority::find("MEDIUM priority"), Some(Priority::Medium));
        assert_eq!(Priority::find("P1"), Some(Priority::High));
        assert_eq!(Priority::find("whenever"), None);
        assert_eq!(Priority::find("Not high"), None);
        assert_eq!(Priority::find("p10"), None);
        assert_eq!(Priority::find("Highest"), Some(Priority::High));
        assert_eq!(Priority::find(""), None);
    }
}
