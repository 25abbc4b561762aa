//! 文档内容校验 - 业务能力层
//!
//! 在任何后端调用之前拦截空文档和过短的文档。

use crate::config::Config;
use crate::error::ContentRejection;

#[derive(Debug, Clone, Copy)]
pub struct ContentGate {
    min_length: usize,
}

impl ContentGate {
    pub const DEFAULT_MIN_LENGTH: usize = 100;

    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.min_content_length)
    }

    /// 校验文档文本，返回去除首尾空白后的内容
    pub fn admit<'a>(&self, text: Option<&'a str>) -> Result<&'a str, ContentRejection> {
        let trimmed = text.map(str::trim).unwrap_or_default();
        if trimmed.is_empty() {
            return Err(ContentRejection::EmptyDocument);
        }

        let length = trimmed.chars().count();
        if length < self.min_length {
            return Err(ContentRejection::TooShort {
                length,
                minimum: self.min_length,
            });
        }

        Ok(trimmed)
    }
}

impl Default for ContentGate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_absent() {
        let gate = ContentGate::default();
        assert_eq!(gate.admit(None), Err(ContentRejection::EmptyDocument));
        assert_eq!(gate.admit(Some("")), Err(ContentRejection::EmptyDocument));
        assert_eq!(gate.admit(Some(" \n\t ")), Err(ContentRejection::EmptyDocument));
    }

    #[test]
    fn test_threshold_uses_trimmed_length() {
        let gate = ContentGate::default();
        let short = format!("   {}   ", "a".repeat(99));
        assert_eq!(
            gate.admit(Some(&short)),
            Err(ContentRejection::TooShort {
                length: 99,
                minimum: 100
            })
        );

        let exact = "a".repeat(100);
        assert_eq!(gate.admit(Some(&exact)), Ok(exact.as_str()));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let gate = ContentGate::new(10);
        // 10 个汉字是 30 个字节
        assert!(gate.admit(Some("功能需求文档测试用例")).is_ok());
        assert!(gate.admit(Some("功能需求")).is_err());
    }
}
