//! 错误类型
//!
//! 错误信息会原样出现在会话状态（`JobState.message`）里，所以 Display 文本面向最终用户。

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use crate::models::JobPhase;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 文档内容不可用（空文档 / 太短）
    #[error(transparent)]
    Input(#[from] ContentRejection),
    /// 文档读取错误
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// LLM 服务错误
    #[error(transparent)]
    Llm(#[from] LlmError),
    /// 导出错误
    #[error(transparent)]
    Export(#[from] ExportError),
    /// 会话错误
    #[error(transparent)]
    Session(#[from] SessionError),
    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// 其他错误
    #[error("Unexpected error: {0}")]
    Other(String),
}

/// 文档内容校验失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentRejection {
    /// 文档为空
    #[error("Insufficient document content: the document is empty")]
    EmptyDocument,
    /// 文档太短
    #[error(
        "Insufficient document content: {length} characters after trimming, at least {minimum} required"
    )]
    TooShort { length: usize, minimum: usize },
}

/// 文档读取错误
#[derive(Debug, Error)]
pub enum DocumentError {
    /// 文件不存在
    #[error("Document not found: {}", path.display())]
    NotFound { path: PathBuf },
    /// 不支持的文件格式
    #[error("Unsupported document format: {extension}")]
    UnsupportedFormat { extension: String },
    /// 读取失败
    #[error("Failed to read document {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API call failed (model: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// API 调用超时
    #[error("LLM API call timed out after {seconds}s (model: {model})")]
    Timeout { model: String, seconds: u64 },
    /// 返回内容为空
    #[error("LLM returned empty content (model: {model})")]
    EmptyContent { model: String },
    /// 返回内容不是合法 JSON
    #[error("Could not parse backend response as JSON: {source}")]
    JsonParseFailed {
        #[source]
        source: serde_json::Error,
    },
    /// 返回的 JSON 缺少预期的集合字段
    #[error("Backend response is missing the `{key}` collection")]
    MissingKey { key: &'static str },
}

/// 导出错误
#[derive(Debug, Error)]
pub enum ExportError {
    /// 没有可导出的测试用例
    #[error("No test cases to export")]
    NoTestCases,
    /// 工作簿生成或写入失败
    #[error("Could not create Excel file {}: {source}", path.display())]
    WorkbookFailed {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },
    /// CSV 写入失败
    #[error("Could not write CSV file {}: {source}", path.display())]
    CsvFailed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    /// 文件系统错误
    #[error("File system error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 会话已取消，写好的文件已删除
    #[error("Export cancelled")]
    Cancelled,
    /// 后台写入任务异常退出
    #[error("Export task failed: {0}")]
    TaskFailed(String),
}

/// 会话错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// 会话不存在
    #[error("Session not found: {session_id}")]
    NotFound { session_id: Uuid },
    /// 非法状态迁移（调用方的编程错误）
    #[error("Invalid job transition: {from} -> {to}")]
    InvalidTransition { from: JobPhase, to: JobPhase },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("Failed to read config file {}: {source}", path.display())]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("Failed to parse config file {}: {source}", path.display())]
    TomlParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// 缺少必填配置
    #[error("Missing required setting: {name}")]
    MissingSetting { name: &'static str },

    /// 环境变量解析失败
    #[error("Environment variable {var_name}: value '{value}' is not a valid {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

// ========== 便捷构造函数 ==========

impl LlmError {
    /// 创建 LLM API 调用错误
    pub fn api_call_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
