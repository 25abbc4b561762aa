//! 分类字段（测试类型 / 优先级）
//!
//! 后端给出的分类值能识别时归入标准值，否则保留清理后的原文，导出和统计都用原文。

use serde::{Deserialize, Serialize};

/// 出现这些词时不做模糊归类（"Not high"、"Non-Positive"）
const NEGATIONS: [&str; 4] = ["not", "non", "no", "without"];

/// 标准值或原文
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label<T> {
    Known(T),
    Other(String),
}

impl<T: AsRef<str>> Label<T> {
    /// 解析原文；空白文本视为缺失
    pub fn parse(text: &str, find: impl Fn(&str) -> Option<T>) -> Option<Self> {
        let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if cleaned.is_empty() {
            return None;
        }
        Some(match find(&cleaned) {
            Some(known) => Label::Known(known),
            None => Label::Other(cleaned),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Label::Known(known) => known.as_ref(),
            Label::Other(text) => text,
        }
    }

    pub fn known(&self) -> Option<&T> {
        match self {
            Label::Known(known) => Some(known),
            Label::Other(_) => None,
        }
    }
}

impl<T: AsRef<str>> std::fmt::Display for Label<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 按别名表查找标准值
///
/// 依次尝试：完全一致、整词匹配、包含匹配（只用于三个字符以上的别名）。
/// 带否定词的文本只接受完全一致。
pub fn match_alias<T: Copy>(text: &str, aliases: &[(&str, T)]) -> Option<T> {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }

    if let Some((_, value)) = aliases.iter().find(|(alias, _)| *alias == lower) {
        return Some(*value);
    }

    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();
    if words.iter().any(|word| NEGATIONS.contains(word)) {
        return None;
    }

    aliases
        .iter()
        .find(|(alias, _)| words.contains(alias))
        .or_else(|| {
            aliases
                .iter()
                .find(|(alias, _)| alias.len() > 2 && lower.contains(alias))
        })
        .map(|(_, value)| *value)
}
