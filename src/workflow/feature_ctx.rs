//! 功能处理上下文
//!
//! 封装"我正在处理哪个会话的第几个功能"这一信息

use std::fmt::Display;

/// 功能处理上下文
#[derive(Debug, Clone)]
pub struct FeatureCtx {
    /// 会话 ID 短格式（仅用于日志）
    pub session_tag: String,

    /// 功能序号（从1开始）
    pub position: usize,

    /// 功能总数
    pub total: usize,
}

impl FeatureCtx {
    pub fn new(session_tag: impl Into<String>, position: usize, total: usize) -> Self {
        Self {
            session_tag: session_tag.into(),
            position,
            total,
        }
    }
}

impl Display for FeatureCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[会话 {}][功能 {}/{}]",
            self.session_tag, self.position, self.total
        )
    }
}
