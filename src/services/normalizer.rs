//! 字段规范化 - 业务能力层
//!
//! 把后端返回的原始记录转换为稳定的 [`Feature`] / [`TestCase`]。
//! 两个函数都是全函数：任何输入都能得到可用的结果。

use chrono::{DateTime, Local};

use crate::models::{Feature, Label, Priority, RawFeature, RawTestCase, TestCase, TestType};
use crate::utils::FieldChain;

/// 模块缺失时的占位值
pub const UNKNOWN: &str = "Unknown";

// ========== 功能字段 ==========

pub const FEATURE_NAME: FieldChain = FieldChain(&["feature_name", "name"]);
pub const FEATURE_ID: FieldChain = FieldChain(&["feature_id", "id"]);
pub const FEATURE_MODULE: FieldChain = FieldChain(&["module"]);
pub const FEATURE_DESCRIPTION: FieldChain = FieldChain(&["description"]);
pub const FEATURE_REQUIREMENTS: FieldChain = FieldChain(&["requirements"]);
pub const FEATURE_ACCEPTANCE: FieldChain = FieldChain(&["acceptance_criteria"]);
pub const FEATURE_PRIORITY: FieldChain = FieldChain(&["priority"]);
pub const FEATURE_SOURCE: FieldChain =
    FieldChain(&["frd_line", "source_reference", "frd_reference"]);

// ========== 测试用例字段 ==========

pub const TEST_CASE_ID: FieldChain = FieldChain(&["test_case_id", "id"]);
pub const TEST_CASE_NAME: FieldChain = FieldChain(&["test_case_name", "name"]);
pub const TEST_CASE_MODULE: FieldChain = FieldChain(&["module"]);
pub const TEST_TYPE: FieldChain = FieldChain(&["test_type", "type"]);
pub const TEST_PRIORITY: FieldChain = FieldChain(&["priority"]);
pub const TEST_CATEGORY: FieldChain = FieldChain(&["category"]);
pub const TEST_GAP_COVERAGE: FieldChain = FieldChain(&["gap_coverage"]);
pub const TEST_PRECONDITIONS: FieldChain = FieldChain(&["preconditions", "prerequisites"]);
pub const TEST_STEPS_FORMATTED: FieldChain = FieldChain(&["test_steps_formatted"]);
pub const TEST_STEPS: FieldChain = FieldChain(&["test_steps", "steps"]);
pub const TEST_DATA: FieldChain = FieldChain(&["test_data"]);
pub const TEST_EXPECTED: FieldChain = FieldChain(&["expected_result"]);
pub const TEST_SOURCE: FieldChain = FieldChain(&["frd_reference", "source_reference"]);

/// 规范化功能记录
///
/// `position` 从 1 开始，用于生成缺省名称 `Feature_<n>` 和编号 `F<nnn>`。
pub fn normalize_feature(raw: &RawFeature, position: usize) -> Feature {
    let text = |chain: FieldChain| raw.text(chain).map(|s| collapse_whitespace(&s)).filter(|s| !s.is_empty());

    Feature {
        feature_id: text(FEATURE_ID).unwrap_or_else(|| format!("F{:03}", position)),
        feature_name: text(FEATURE_NAME).unwrap_or_else(|| format!("Feature_{}", position)),
        description: text(FEATURE_DESCRIPTION).unwrap_or_default(),
        module: text(FEATURE_MODULE).unwrap_or_else(|| UNKNOWN.to_string()),
        requirements: clean_list(raw.list(FEATURE_REQUIREMENTS)),
        acceptance_criteria: clean_list(raw.list(FEATURE_ACCEPTANCE)),
        priority: raw
            .text(FEATURE_PRIORITY)
            .and_then(|p| Priority::find(&p))
            .unwrap_or(Priority::Medium),
        source_reference: text(FEATURE_SOURCE).unwrap_or_default(),
    }
}

/// 规范化测试用例记录
///
/// 功能编号和名称总是取自 `feature`，忽略记录中回显的值。
pub fn normalize_test_case(
    raw: &RawTestCase,
    feature: &Feature,
    generated_at: DateTime<Local>,
) -> TestCase {
    let text = |chain: FieldChain| raw.text(chain).map(|s| collapse_whitespace(&s)).unwrap_or_default();

    let module = if feature.module == UNKNOWN {
        raw.text(TEST_CASE_MODULE)
            .map(|s| collapse_whitespace(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string())
    } else {
        feature.module.clone()
    };

    let source_reference = raw
        .text(TEST_SOURCE)
        .map(|s| collapse_whitespace(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| feature.source_reference.clone());

    TestCase {
        test_case_id: text(TEST_CASE_ID),
        test_case_name: text(TEST_CASE_NAME),
        feature_id: feature.feature_id.clone(),
        feature_name: feature.feature_name.clone(),
        module,
        test_type: raw
            .text(TEST_TYPE)
            .and_then(|t| Label::parse(&t, TestType::find)),
        priority: raw
            .text(TEST_PRIORITY)
            .and_then(|p| Label::parse(&p, Priority::find)),
        category: text(TEST_CATEGORY),
        gap_coverage: text(TEST_GAP_COVERAGE),
        preconditions: text(TEST_PRECONDITIONS),
        steps: render_steps(raw),
        test_data: text(TEST_DATA),
        expected_result: text(TEST_EXPECTED),
        source_reference,
        generated_at,
    }
}

/// 步骤文本
///
/// 优先使用预先格式化好的多行文本（原样保留，只去首尾空白），
/// 否则把步骤列表渲染为从 1 开始的编号列表。
pub fn render_steps(raw: &RawTestCase) -> String {
    if let Some(formatted) = raw.text(TEST_STEPS_FORMATTED) {
        return formatted.trim().to_string();
    }

    match raw.resolve(TEST_STEPS) {
        Some(serde_json::Value::Array(_)) => number_steps(&clean_list(raw.list(TEST_STEPS))),
        Some(_) => raw
            .text(TEST_STEPS)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        None => String::new(),
    }
}

/// `["a", "b"]` → `"1. a\n2. b"`
pub fn number_steps(steps: &[String]) -> String {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 合并连续空白并去掉首尾空白
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .iter()
        .map(|item| collapse_whitespace(item))
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::RawRecord;
    use serde_json::{json, Value};

    fn raw(value: Value) -> RawRecord {
        RawRecord::from_value(value).unwrap()
    }

    fn login_feature() -> Feature {
        normalize_feature(
            &raw(json!({
                "feature_id": "F010",
                "feature_name": "Login",
                "module": "Auth",
                "priority": "High",
                "frd_line": "Users shall log in with email."
            })),
            1,
        )
    }

    #[test]
    fn test_feature_name_fallback_chain() {
        let f = normalize_feature(&raw(json!({"name": "Search"})), 3);
        assert_eq!(f.feature_name, "Search");

        for position in 1..=12 {
            let f = normalize_feature(&raw(json!({"description": "no name"})), position);
            assert_eq!(f.feature_name, format!("Feature_{}", position));
        }
    }

    #[test]
    fn test_feature_id_fallback_is_zero_padded() {
        let f = normalize_feature(&raw(json!({"id": "AUTH-1"})), 1);
        assert_eq!(f.feature_id, "AUTH-1");

        let f = normalize_feature(&raw(json!({})), 7);
        assert_eq!(f.feature_id, "F007");
        assert_eq!(f.module, UNKNOWN);
        assert_eq!(f.priority, Priority::Medium);
    }

    #[test]
    fn test_feature_lists_and_source() {
        let f = normalize_feature(
            &raw(json!({
                "requirements": ["  must   work ", ""],
                "acceptance_criteria": "single criterion",
                "frd_line": "3.1 Login"
            })),
            1,
        );
        assert_eq!(f.requirements, vec!["must work".to_string()]);
        assert_eq!(f.acceptance_criteria, vec!["single criterion".to_string()]);
        assert_eq!(f.source_reference, "3.1 Login");
    }

    #[test]
    fn test_feature_identity_is_overwritten() {
        let feature = login_feature();
        let tc = normalize_test_case(
            &raw(json!({
                "test_case_id": "TC001",
                "feature_id": "WRONG",
                "feature_name": "Hallucinated",
                "module": "Elsewhere"
            })),
            &feature,
            Local::now(),
        );
        assert_eq!(tc.feature_id, "F010");
        assert_eq!(tc.feature_name, "Login");
        assert_eq!(tc.module, "Auth");
    }

    #[test]
    fn test_unknown_feature_module_falls_back_to_record() {
        let feature = normalize_feature(&raw(json!({"name": "Export"})), 1);
        let tc = normalize_test_case(&raw(json!({"module": "Reports"})), &feature, Local::now());
        assert_eq!(tc.module, "Reports");

        let tc = normalize_test_case(&raw(json!({})), &feature, Local::now());
        assert_eq!(tc.module, UNKNOWN);
    }

    #[test]
    fn test_alternate_field_names() {
        let tc = normalize_test_case(
            &raw(json!({
                "id": "TC-9",
                "name": "Reject bad password",
                "type": "Negative",
                "priority": "low"
            })),
            &login_feature(),
            Local::now(),
        );
        assert_eq!(tc.test_case_id, "TC-9");
        assert_eq!(tc.test_case_name, "Reject bad password");
        assert_eq!(tc.test_type, Some(Label::Known(TestType::Negative)));
        assert_eq!(tc.priority, Some(Label::Known(Priority::Low)));
    }

    #[test]
    fn test_steps_are_numbered() {
        let tc = normalize_test_case(
            &raw(json!({"test_steps": ["Open app", "Click button"]})),
            &login_feature(),
            Local::now(),
        );
        assert_eq!(tc.steps, "1. Open app\n2. Click button");
    }

    #[test]
    fn test_preformatted_steps_are_verbatim() {
        let formatted = "The following test scenario:\n\n1. Open  app\n2. Log in\n\nExp: Dashboard";
        let tc = normalize_test_case(
            &raw(json!({
                "test_steps_formatted": format!("  {}  ", formatted),
                "test_steps": ["ignored"]
            })),
            &login_feature(),
            Local::now(),
        );
        assert_eq!(tc.steps, formatted);
    }

    #[test]
    fn test_free_text_is_whitespace_normalized() {
        let tc = normalize_test_case(
            &raw(json!({
                "test_case_name": "  Login \n with   valid\tcredentials ",
                "expected_result": "User   sees\n dashboard"
            })),
            &login_feature(),
            Local::now(),
        );
        assert_eq!(tc.test_case_name, "Login with valid credentials");
        assert_eq!(tc.expected_result, "User sees dashboard");
    }

    #[test]
    fn test_missing_and_ill_typed_fields() {
        let tc = normalize_test_case(
            &raw(json!({
                "test_case_name": ["not", "a", "string"],
                "test_data": 42,
                "type": "Smoke",
                "priority": null
            })),
            &login_feature(),
            Local::now(),
        );
        assert_eq!(tc.test_case_id, "");
        assert_eq!(tc.test_case_name, "");
        assert_eq!(tc.test_data, "42");
        assert_eq!(tc.test_type, Some(Label::Other("Smoke".to_string())));
        assert_eq!(tc.priority, None);
        assert_eq!(tc.steps, "");
        // 没有 frd_reference 时沿用功能的原文
        assert_eq!(tc.source_reference, "Users shall log in with email.");
    }

    #[test]
    fn test_unrecognized_classification_keeps_text() {
        let tc = normalize_test_case(
            &raw(json!({
                "test_type": "  Security ",
                "priority": "Urgent\n"
            })),
            &login_feature(),
            Local::now(),
        );
        assert_eq!(tc.test_type, Some(Label::Other("Security".to_string())));
        assert_eq!(tc.priority, Some(Label::Other("Urgent".to_string())));
    }
}
