//! LLM 服务 - 业务能力层
//!
//! 只负责"调用模型拿到 JSON 文本"，不关心流程和解析
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::LlmError;
use crate::infrastructure::GenerationBackend;
use crate::models::Feature;

const SYSTEM_MESSAGE: &str = "You are an expert test case generator. \
    You always answer with a single valid JSON object and nothing else.";

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 完成功能提取和测试用例生成
/// - 提供通用的 LLM 调用接口（超时 + 重试）
/// - 只处理单个文档或单个功能
/// - 不解析响应内容
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Option<Duration>,
    max_retries: u32,
    retry_backoff: Duration,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
            timeout: config.llm_timeout(),
            max_retries: config.llm_max_retries,
            retry_backoff: config.llm_retry_backoff(),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// 失败时按配置重试，第 n 次重试前等待 `retry_backoff × n`。
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（去除首尾空白）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String, LlmError> {
        let mut attempt = 0;
        loop {
            match self.send_once(user_message, system_message).await {
                Ok(content) => return Ok(content),
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    attempt += 1;
                    let wait = self.retry_backoff * attempt;
                    warn!(
                        "⚠️ LLM 调用失败，{} ms 后第 {}/{} 次重试: {}",
                        wait.as_millis(),
                        attempt,
                        self.max_retries,
                        e
                    );
                    sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String, LlmError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.chars().count());

        let request = self
            .build_request(user_message, system_message)
            .map_err(|e| LlmError::api_call_failed(&self.model_name, e))?;

        let chat = self.client.chat();
        let call = chat.create(request);
        let response = match self.timeout {
            Some(limit) => timeout(limit, call).await.map_err(|_| LlmError::Timeout {
                model: self.model_name.clone(),
                seconds: limit.as_secs(),
            })?,
            None => call.await,
        }
        .map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            LlmError::api_call_failed(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        // 提取响应内容
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }

    fn build_request(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<async_openai::types::chat::CreateChatCompletionRequest, OpenAIError> {
        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
    }
}

#[async_trait]
impl GenerationBackend for LlmService {
    async fn extract_features(&self, document: &str) -> Result<String, LlmError> {
        let prompt = build_feature_prompt(document);
        self.send_to_llm(&prompt, Some(SYSTEM_MESSAGE)).await
    }

    async fn generate_test_cases(&self, feature: &Feature) -> Result<String, LlmError> {
        let prompt = build_test_case_prompt(feature);
        self.send_to_llm(&prompt, Some(SYSTEM_MESSAGE)).await
    }
}

/// 超时和接口错误可以重试，请求构造错误不重试
fn is_retryable(error: &LlmError) -> bool {
    match error {
        LlmError::Timeout { .. } => true,
        LlmError::ApiCallFailed { source, .. } => !matches!(
            source.downcast_ref::<OpenAIError>(),
            Some(OpenAIError::InvalidArgument(_))
        ),
        _ => false,
    }
}

// ========== 提示词 ==========

/// 功能提取提示词
pub fn build_feature_prompt(document: &str) -> String {
    format!(
        r#"Analyze the following Functional Requirements Document (FRD) and extract all features/functionalities.

Return the features in this JSON format:

{{
    "features": [
        {{
            "feature_id": "F001",
            "feature_name": "Feature Name",
            "description": "Detailed description from FRD",
            "requirements": ["requirement 1", "requirement 2"],
            "acceptance_criteria": ["criteria 1", "criteria 2"],
            "priority": "High/Medium/Low",
            "module": "Module name",
            "frd_line": "Original FRD line that describes this feature"
        }}
    ]
}}

FRD Content:
{document}

Important:
1. Return only valid JSON format
2. Extract all distinct features mentioned in the document
3. Include the original FRD line for each feature"#
    )
}

/// 测试用例生成提示词
pub fn build_test_case_prompt(feature: &Feature) -> String {
    let requirements = bullet_list(&feature.requirements);
    let acceptance = bullet_list(&feature.acceptance_criteria);
    let feature_id = &feature.feature_id;
    let feature_name = &feature.feature_name;
    let module = &feature.module;
    let frd_line = &feature.source_reference;

    format!(
        r#"Based on the feature information below, generate comprehensive test cases.

Feature Information:
- Feature ID: {feature_id}
- Feature Name: {feature_name}
- Description: {description}
- FRD Line: {frd_line}
- Module: {module}
- Priority: {priority}
- Requirements:
{requirements}
- Acceptance Criteria:
{acceptance}

Cover ALL of the following categories:

1. POSITIVE: happy path, valid input, expected functionality
2. NEGATIVE: invalid input, error handling, boundary violations
3. EDGE: boundary values, extreme scenarios, unusual input combinations
4. ADVANCED COVERAGE: conflict resolution and messaging, error recovery and retry,
   fallback behaviour, multi-object creation, backward compatibility, integration
   with other features, performance under extreme conditions, data validation,
   workflow interruption and resumption, state consistency after operations

Write the steps of every test case in this format:
"The following test scenario for the {feature_name} feature is derived from the corresponding line in the FRD document:

1. [Step 1]
2. [Step 2]
...

Exp: [Expected Result]"

Return response in JSON format:
{{
    "test_cases": [
        {{
            "test_case_id": "TC001",
            "test_case_name": "Test case name",
            "feature_id": "{feature_id}",
            "feature_name": "{feature_name}",
            "module": "{module}",
            "test_type": "Positive/Negative/Boundary/Edge/Conflict/Fallback/Integration/Compatibility",
            "priority": "High/Medium/Low",
            "preconditions": "Prerequisites for test execution",
            "test_steps_formatted": "The following test scenario ...\n\n1. Step 1\n2. Step 2\n\nExp: Expected result",
            "test_data": "Required test data",
            "expected_result": "Expected outcome",
            "category": "Functional/Non-functional/Integration/Compatibility/Performance",
            "frd_reference": "{frd_line}",
            "gap_coverage": "Specific gap or advanced scenario this test covers"
        }}
    ]
}}

Generate 15-25 test cases covering ALL categories above."#,
        description = feature.description,
        priority = feature.priority,
    )
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "  (none)".to_string();
    }
    items
        .iter()
        .map(|item| format!("  * {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;

    fn login() -> Feature {
        Feature {
            feature_id: "F001".to_string(),
            feature_name: "Login".to_string(),
            description: "Users authenticate with email and password".to_string(),
            module: "Auth".to_string(),
            requirements: vec!["Email must be valid".to_string()],
            acceptance_criteria: Vec::new(),
            priority: Priority::High,
            source_reference: "3.1 Users shall log in".to_string(),
        }
    }

    #[test]
    fn test_feature_prompt_embeds_document_and_shape() {
        let prompt = build_feature_prompt("The system shall export reports.");
        assert!(prompt.contains("The system shall export reports."));
        assert!(prompt.contains("\"features\""));
        assert!(prompt.contains("\"frd_line\""));
    }

    #[test]
    fn test_test_case_prompt_embeds_feature() {
        let prompt = build_test_case_prompt(&login());
        assert!(prompt.contains("- Feature ID: F001"));
        assert!(prompt.contains("\"feature_name\": \"Login\""));
        assert!(prompt.contains("  * Email must be valid"));
        assert!(prompt.contains("- Acceptance Criteria:\n  (none)"));
        assert!(prompt.contains("\"frd_reference\": \"3.1 Users shall log in\""));
        assert!(prompt.contains("\"test_cases\""));
        assert!(prompt.contains("- Priority: High"));
    }

    #[test]
    fn test_retry_policy() {
        assert!(is_retryable(&LlmError::Timeout {
            model: "m".to_string(),
            seconds: 1
        }));
        assert!(!is_retryable(&LlmError::EmptyContent {
            model: "m".to_string()
        }));
        assert!(!is_retryable(&LlmError::api_call_failed(
            "m",
            OpenAIError::InvalidArgument("bad".to_string())
        )));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_reported() {
        let config = Config {
            llm_api_key: "test-key".to_string(),
            llm_api_base_url: "http://127.0.0.1:1/v1".to_string(),
            llm_timeout_secs: Some(5),
            llm_max_retries: 0,
            ..Default::default()
        };
        let service = LlmService::new(&config);

        let err = service.send_to_llm("ping", Some("system")).await.unwrap_err();
        assert!(
            matches!(err, LlmError::ApiCallFailed { .. } | LlmError::Timeout { .. }),
            "got: {}",
            err
        );
    }

    /// 测试 LLM API 连接性
    ///
    /// 运行方式：
    /// ```bash
    /// LLM_API_KEY=... cargo test test_live_feature_extraction -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_live_feature_extraction() {
        let _ = tracing_subscriber::fmt::try_init();

        let service = LlmService::new(&Config::from_env());
        let document = "1. Login: users sign in with email and password.\n\
                        2. Export: users download their reports as PDF.";

        match service.extract_features(document).await {
            Ok(response) => {
                println!("\n========== LLM 响应 ==========");
                println!("{}", response);
                println!("==============================\n");
                assert!(response.contains("features"));
            }
            Err(e) => panic!("LLM 调用失败: {}", e),
        }
    }
}
