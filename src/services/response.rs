//! 后端响应解析
//!
//! 两种调用共用同一套规则：去掉 Markdown 代码块 → 解析 JSON → 取出指定的集合字段。

use serde_json::Value;
use tracing::warn;

use crate::error::LlmError;
use crate::utils::{truncate_text, RawRecord};

/// 去掉首尾的 ``` / ```json 代码块标记
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // 语言标记（json / JSON / ...）
        text = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// 解析响应中的对象数组
///
/// 数组中不是 JSON 对象的元素会被丢弃并记录警告。
pub fn parse_collection(response: &str, key: &'static str) -> Result<Vec<RawRecord>, LlmError> {
    let body = strip_code_fence(response);

    let value: Value = serde_json::from_str(body).map_err(|source| {
        warn!("JSON 解析失败: {} | 响应: {}", source, truncate_text(body, 200));
        LlmError::JsonParseFailed { source }
    })?;

    let items = value
        .get(key)
        .and_then(Value::as_array)
        .ok_or(LlmError::MissingKey { key })?;

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match RawRecord::from_value(item.clone()) {
            Some(record) => records.push(record),
            None => warn!("⚠️ `{}` 第 {} 项不是对象，已忽略", key, index + 1),
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fence("```JSON{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_parse_collection_ok() {
        let response = "```json\n{\"features\": [{\"name\": \"Login\"}, \"junk\", {\"name\": \"Logout\"}]}\n```";
        let records = parse_collection(response, "features").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("name").and_then(Value::as_str), Some("Logout"));
    }

    #[test]
    fn test_parse_collection_missing_key() {
        let err = parse_collection("{\"items\": []}", "features").unwrap_err();
        assert!(matches!(err, LlmError::MissingKey { key: "features" }));

        // 字段存在但不是数组
        let err = parse_collection("{\"features\": {}}", "features").unwrap_err();
        assert!(matches!(err, LlmError::MissingKey { .. }));
    }

    #[test]
    fn test_parse_collection_invalid_json() {
        let err = parse_collection("Sorry, I cannot help with that.", "test_cases").unwrap_err();
        assert!(matches!(err, LlmError::JsonParseFailed { .. }));
    }

    #[test]
    fn test_empty_collection_is_not_an_error() {
        let records = parse_collection("{\"features\": []}", "features").unwrap();
        assert!(records.is_empty());
    }
}
