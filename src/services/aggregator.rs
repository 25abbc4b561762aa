//! 结果汇总 - 业务能力层

use std::collections::BTreeMap;

use crate::models::{Label, Stats, TestCase};
use crate::services::normalizer::UNKNOWN;

/// 统计测试用例的分布
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultAggregator;

impl ResultAggregator {
    /// 纯计算：相同输入总是得到相同结果，与输入顺序无关
    pub fn stats(test_cases: &[TestCase]) -> Stats {
        let mut stats = Stats {
            total_test_cases: test_cases.len(),
            ..Default::default()
        };

        for tc in test_cases {
            bump(
                &mut stats.test_types,
                tc.test_type.as_ref().map(Label::as_str).unwrap_or(UNKNOWN),
            );
            bump(
                &mut stats.priorities,
                tc.priority.as_ref().map(Label::as_str).unwrap_or(UNKNOWN),
            );
            bump(&mut stats.categories, &tc.category);
            bump(&mut stats.modules, &tc.module);
            bump(&mut stats.features, &tc.feature_name);
        }

        stats
    }
}

fn bump(counts: &mut BTreeMap<String, usize>, key: &str) {
    let key = if key.trim().is_empty() { UNKNOWN } else { key };
    *counts.entry(key.to_string()).or_insert(0) += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, TestType};
    use chrono::Local;

    fn case(
        feature: &str,
        test_type: Option<Label<TestType>>,
        priority: Option<Label<Priority>>,
    ) -> TestCase {
        TestCase {
            test_case_id: "TC".to_string(),
            test_case_name: "name".to_string(),
            feature_id: "F001".to_string(),
            feature_name: feature.to_string(),
            module: "Auth".to_string(),
            test_type,
            priority,
            category: String::new(),
            gap_coverage: String::new(),
            preconditions: String::new(),
            steps: String::new(),
            test_data: String::new(),
            expected_result: String::new(),
            source_reference: String::new(),
            generated_at: Local::now(),
        }
    }

    fn sample() -> Vec<TestCase> {
        vec![
            case(
                "Login",
                Some(Label::Known(TestType::Positive)),
                Some(Label::Known(Priority::High)),
            ),
            case(
                "Login",
                Some(Label::Known(TestType::Negative)),
                Some(Label::Known(Priority::High)),
            ),
            case("Search", None, None),
        ]
    }

    #[test]
    fn test_counts_and_unknown_defaults() {
        let stats = ResultAggregator::stats(&sample());
        assert_eq!(stats.total_test_cases, 3);
        assert_eq!(stats.test_types["Positive"], 1);
        assert_eq!(stats.test_types[UNKNOWN], 1);
        assert_eq!(stats.priorities["High"], 2);
        assert_eq!(stats.priorities[UNKNOWN], 1);
        assert_eq!(stats.categories[UNKNOWN], 3);
        assert_eq!(stats.modules["Auth"], 3);
        assert_eq!(stats.features["Login"], 2);
        assert_eq!(stats.features["Search"], 1);
    }

    #[test]
    fn test_idempotent_and_order_independent() {
        let cases = sample();
        let first = ResultAggregator::stats(&cases);
        let second = ResultAggregator::stats(&cases);
        assert_eq!(first, second);

        let mut reversed = cases.clone();
        reversed.reverse();
        assert_eq!(ResultAggregator::stats(&reversed), first);
    }

    #[test]
    fn test_empty_input() {
        let stats = ResultAggregator::stats(&[]);
        assert_eq!(stats, Stats::default());
    }

    #[test]
    fn test_unrecognized_values_are_counted_verbatim() {
        let cases = vec![case(
            "Login",
            Some(Label::Other("Security".to_string())),
            Some(Label::Other("Urgent".to_string())),
        )];
        let stats = ResultAggregator::stats(&cases);
        assert_eq!(stats.test_types["Security"], 1);
        assert_eq!(stats.priorities["Urgent"], 1);
        assert!(!stats.test_types.contains_key(UNKNOWN));
    }
}
