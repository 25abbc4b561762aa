use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;
use crate::services::exporter::ExportFormat;

/// 程序配置文件
///
/// 加载顺序：默认值 → TOML 文件（可选）→ 环境变量
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    /// 单次调用超时（秒），不设置则不限时
    pub llm_timeout_secs: Option<u64>,
    /// 调用失败后的重试次数，0 表示不重试
    pub llm_max_retries: u32,
    /// 重试间隔（毫秒），按次数线性递增
    pub llm_retry_backoff_ms: u64,
    /// 两次功能级调用之间的固定间隔（毫秒）
    pub rate_limit_delay_ms: u64,
    // --- 文档 ---
    /// 文档最少字符数（去除首尾空白后）
    pub min_content_length: usize,
    /// 发送给后端的最大字符数，超出部分直接截断
    pub max_document_chars: usize,
    /// 处理完成后是否删除上传的原始文件
    pub cleanup_uploads: bool,
    // --- 导出 ---
    pub download_folder: PathBuf,
    pub export_format: ExportFormat,
    // --- 会话 ---
    /// 已结束会话的保留时间（秒）
    pub session_ttl_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_temperature: 0.3,
            llm_max_tokens: 8192,
            llm_timeout_secs: None,
            llm_max_retries: 0,
            llm_retry_backoff_ms: 2000,
            rate_limit_delay_ms: 1000,
            min_content_length: 100,
            max_document_chars: 50_000,
            cleanup_uploads: false,
            download_folder: PathBuf::from("downloads"),
            export_format: ExportFormat::Xlsx,
            session_ttl_secs: 3600,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载（未设置的项使用默认值）
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，环境变量优先
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.with_env_overrides())
    }

    /// 用环境变量覆盖当前配置
    pub fn with_env_overrides(self) -> Self {
        let base = self;
        Self {
            llm_api_key: env_string("LLM_API_KEY").unwrap_or(base.llm_api_key),
            llm_api_base_url: env_string("LLM_API_BASE_URL").unwrap_or(base.llm_api_base_url),
            llm_model_name: env_string("LLM_MODEL_NAME").unwrap_or(base.llm_model_name),
            llm_temperature: env_or("LLM_TEMPERATURE", base.llm_temperature),
            llm_max_tokens: env_or("LLM_MAX_TOKENS", base.llm_max_tokens),
            llm_timeout_secs: env_parsed("LLM_TIMEOUT_SECS").or(base.llm_timeout_secs),
            llm_max_retries: env_or("LLM_MAX_RETRIES", base.llm_max_retries),
            llm_retry_backoff_ms: env_or("LLM_RETRY_BACKOFF_MS", base.llm_retry_backoff_ms),
            rate_limit_delay_ms: env_or("RATE_LIMIT_DELAY_MS", base.rate_limit_delay_ms),
            min_content_length: env_or("MIN_CONTENT_LENGTH", base.min_content_length),
            max_document_chars: env_or("MAX_DOCUMENT_CHARS", base.max_document_chars),
            cleanup_uploads: env_or("CLEANUP_UPLOADS", base.cleanup_uploads),
            download_folder: env_string("DOWNLOAD_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(base.download_folder),
            export_format: env_or("EXPORT_FORMAT", base.export_format),
            session_ttl_secs: env_or("SESSION_TTL_SECS", base.session_ttl_secs),
            verbose_logging: env_or("VERBOSE_LOGGING", base.verbose_logging),
        }
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    pub fn llm_timeout(&self) -> Option<Duration> {
        self.llm_timeout_secs.map(Duration::from_secs)
    }

    pub fn llm_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.llm_retry_backoff_ms)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    let raw = env_string(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            let err = ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value: raw,
                expected_type: std::any::type_name::<T>().to_string(),
            };
            warn!("⚠️ {}，使用默认值", err);
            None
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env_parsed(name).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_pipeline_contract() {
        let config = Config::default();
        assert_eq!(config.min_content_length, 100);
        assert_eq!(config.max_document_chars, 50_000);
        assert_eq!(config.rate_limit_delay(), Duration::from_secs(1));
        assert_eq!(config.llm_timeout(), None);
        assert_eq!(config.llm_max_retries, 0);
    }

    #[test]
    fn test_toml_file_partial_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "llm_model_name = \"custom-model\"\nrate_limit_delay_ms = 250\nexport_format = \"csv\""
        )
        .unwrap();

        let config = Config::from_toml_file(file.path()).unwrap();
        assert_eq!(config.rate_limit_delay_ms, 250);
        assert_eq!(config.export_format, ExportFormat::Csv);
        // 未出现在文件中的字段保持默认值
        assert_eq!(config.min_content_length, 100);
    }

    #[test]
    fn test_toml_parse_error_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rate_limit_delay_ms = \"soon\"").unwrap();

        let err = Config::from_toml_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParseFailed { .. }));
    }
}
