//! 后端原始记录的字段访问
//!
//! LLM 返回的字段名并不稳定（`name` / `feature_name`、`id` / `test_case_id` ...），
//! 所有读取都经过 [`FieldChain`]，保证同一字段在各处的解析顺序一致。

use serde_json::{Map, Value};

/// 有序的候选字段名，先命中者优先
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldChain(pub &'static [&'static str]);

impl FieldChain {
    pub fn keys(&self) -> &'static [&'static str] {
        self.0
    }
}

/// 后端返回的一条原始 JSON 记录（功能或测试用例）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// 只接受 JSON 对象
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// 按字段链查找第一个"有内容"的值
    ///
    /// `null`、空白字符串、空数组都视为缺失，继续尝试下一个字段名。
    pub fn resolve(&self, chain: FieldChain) -> Option<&Value> {
        chain
            .keys()
            .iter()
            .filter_map(|key| self.0.get(*key))
            .find(|value| has_content(value))
    }

    /// 解析为文本：字符串原样返回，数字 / 布尔值转为字符串，其余类型视为缺失
    pub fn text(&self, chain: FieldChain) -> Option<String> {
        chain
            .keys()
            .iter()
            .filter_map(|key| self.0.get(*key))
            .find_map(scalar_text)
    }

    /// 解析为字符串列表：数组逐项取文本，单个字符串视为只有一项
    pub fn list(&self, chain: FieldChain) -> Vec<String> {
        match self.resolve(chain) {
            Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
            Some(value) => scalar_text(value).into_iter().collect(),
            None => Vec::new(),
        }
    }
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NAME: FieldChain = FieldChain(&["feature_name", "name"]);

    fn record(value: Value) -> RawRecord {
        RawRecord::from_value(value).unwrap()
    }

    #[test]
    fn test_first_match_wins() {
        let r = record(json!({"feature_name": "Login", "name": "Other"}));
        assert_eq!(r.text(NAME).as_deref(), Some("Login"));

        let r = record(json!({"name": "Other"}));
        assert_eq!(r.text(NAME).as_deref(), Some("Other"));
    }

    #[test]
    fn test_blank_and_null_fall_through() {
        let r = record(json!({"feature_name": "  ", "name": "Fallback"}));
        assert_eq!(r.text(NAME).as_deref(), Some("Fallback"));

        let r = record(json!({"feature_name": null}));
        assert_eq!(r.text(NAME), None);
    }

    #[test]
    fn test_ill_typed_values() {
        let r = record(json!({"feature_name": {"nested": true}, "name": 42}));
        assert_eq!(r.text(NAME).as_deref(), Some("42"));
    }

    #[test]
    fn test_list_accepts_array_or_string() {
        let chain = FieldChain(&["requirements"]);
        let r = record(json!({"requirements": ["a", 2, {"x": 1}]}));
        assert_eq!(r.list(chain), vec!["a".to_string(), "2".to_string()]);

        let r = record(json!({"requirements": "single"}));
        assert_eq!(r.list(chain), vec!["single".to_string()]);

        let r = record(json!({}));
        assert!(r.list(chain).is_empty());
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(RawRecord::from_value(json!(["a"])).is_none());
        assert!(RawRecord::from_value(json!("text")).is_none());
    }
}
