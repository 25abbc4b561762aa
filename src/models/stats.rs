use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 测试用例汇总统计
///
/// 由 [`crate::services::aggregator::ResultAggregator`] 从最终结果重新计算，不单独存储。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_test_cases: usize,
    pub test_types: BTreeMap<String, usize>,
    pub priorities: BTreeMap<String, usize>,
    pub categories: BTreeMap<String, usize>,
    pub modules: BTreeMap<String, usize>,
    pub features: BTreeMap<String, usize>,
}
