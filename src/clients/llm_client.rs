//! LLM 评分客户端 - 基础设施层
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（如 Ollama `/v1`、Azure OpenAI 等）

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use tracing::{debug, warn};

use crate::clients::outcome::{ProviderOutcome, PROVIDER_TIMEOUT_SECS};
use crate::config::Config;
use crate::error::ProviderError;

/// 一次补全请求：系统指令 + 用户提示词
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// 文本评分服务
///
/// 实现方不得 panic，所有失败都以 `ProviderOutcome` 返回。
#[async_trait]
pub trait TextGrader: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> ProviderOutcome<String>;
}

/// 基于 async-openai 的 LLM 客户端
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    timeout: Duration,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> Self {
        Self::with_timeout(config, Duration::from_secs(PROVIDER_TIMEOUT_SECS))
    }

    pub(crate) fn with_timeout(config: &Config, timeout: Duration) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config).with_backoff(single_attempt()),
            model_name: config.llm_model_name.clone(),
            timeout,
        }
    }

    fn build_request(
        &self,
        request: &CompletionRequest,
    ) -> Result<CreateChatCompletionRequest, OpenAIError> {
        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system.as_str())
            .build()?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(request.user.as_str())
            .build()?;

        let messages = vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ];

        CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens)
            .build()
    }
}

/// 只请求一次：async-openai 默认会对 429 / 5xx 反复重试
fn single_attempt() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

/// 把 async-openai 的错误归类为调用结果
fn classify_error(err: OpenAIError) -> ProviderOutcome<String> {
    match err {
        OpenAIError::JSONDeserialize(..) => ProviderOutcome::MalformedResponse(err.to_string()),
        OpenAIError::InvalidArgument(msg) => {
            ProviderOutcome::Unreachable(ProviderError::InvalidRequest(msg))
        }
        other => ProviderOutcome::Unreachable(ProviderError::Network(other.to_string())),
    }
}

#[async_trait]
impl TextGrader for LlmClient {
    async fn complete(&self, request: &CompletionRequest) -> ProviderOutcome<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", request.user.len());

        let chat_request = match self.build_request(request) {
            Ok(r) => r,
            Err(e) => {
                warn!("构建 LLM 请求失败: {}", e);
                return classify_error(e);
            }
        };

        let response =
            match tokio::time::timeout(self.timeout, self.client.chat().create(chat_request)).await {
                Err(_) => {
                    warn!("LLM API 调用超时 ({}s)", self.timeout.as_secs());
                    return ProviderOutcome::Unreachable(ProviderError::Timeout {
                        secs: self.timeout.as_secs(),
                    });
                }
                Ok(Err(e)) => {
                    warn!("LLM API 调用失败: {}", e);
                    return classify_error(e);
                }
                Ok(Ok(response)) => response,
            };

        debug!("LLM API 调用成功");

        match response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
        {
            Some(content) if !content.trim().is_empty() => ProviderOutcome::Success(content),
            _ => {
                warn!("LLM 返回内容为空");
                ProviderOutcome::NoMatch
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_uses_model_and_tuning() {
        let client = LlmClient::new(&Config::default());
        let request = CompletionRequest {
            system: "rubric".to_string(),
            user: "answer".to_string(),
            temperature: 0.3,
            max_tokens: 1000,
        };

        let built = client.build_request(&request).unwrap();
        assert_eq!(built.model, "phi4");
        assert_eq!(built.messages.len(), 2);
        assert_eq!(built.temperature, Some(0.3));
    }

    #[test]
    fn test_invalid_argument_is_unreachable() {
        let outcome = classify_error(OpenAIError::InvalidArgument("bad".to_string()));
        assert_eq!(
            outcome,
            ProviderOutcome::Unreachable(ProviderError::InvalidRequest("bad".to_string()))
        );
    }

    mod against_mock_server {
        use std::sync::Arc;
        use std::time::{Duration, Instant};

        use crate::clients::{CompletionRequest, LlmClient, ProviderOutcome, TextGrader};
        use crate::config::Config;
        use crate::error::ProviderError;
        use crate::services::ContentScorer;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        fn config_for(server: &MockServer) -> Config {
            Config {
                llm_api_key: "test-key".to_string(),
                llm_api_base_url: format!("{}/v1", server.uri()),
                ..Config::default()
            }
        }

        fn grading_request() -> CompletionRequest {
            CompletionRequest {
                system: "rubric".to_string(),
                user: "answer".to_string(),
                temperature: 0.3,
                max_tokens: 1000,
            }
        }

        #[tokio::test]
        async fn test_server_error_is_not_retried() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/v1/chat/completions"))
                .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
                .mount(&server)
                .await;

            let client = LlmClient::new(&config_for(&server));
            let started = Instant::now();
            let outcome = client.complete(&grading_request()).await;

            assert!(started.elapsed() < Duration::from_secs(5));
            assert!(matches!(outcome, ProviderOutcome::Unreachable(ProviderError::Network(_))));
            let requests = server.received_requests().await.unwrap();
            assert_eq!(requests.len(), 1);
        }

        #[tokio::test]
        async fn test_rate_limit_is_not_retried() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/v1/chat/completions"))
                .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                    "error": {
                        "message": "slow down",
                        "type": "rate_limit_exceeded",
                        "param": null,
                        "code": null
                    }
                })))
                .mount(&server)
                .await;

            let outcome = LlmClient::new(&config_for(&server))
                .complete(&grading_request())
                .await;

            assert!(matches!(outcome, ProviderOutcome::Unreachable(_)));
            assert_eq!(server.received_requests().await.unwrap().len(), 1);
        }

        #[tokio::test]
        async fn test_slow_provider_times_out() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/v1/chat/completions"))
                .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
                .mount(&server)
                .await;

            let client = LlmClient::with_timeout(&config_for(&server), Duration::from_millis(200));
            let outcome = client.complete(&grading_request()).await;
            assert!(matches!(
                outcome,
                ProviderOutcome::Unreachable(ProviderError::Timeout { .. })
            ));

            let scorer = ContentScorer::with_grader(Arc::new(LlmClient::with_timeout(
                &config_for(&server),
                Duration::from_millis(200),
            )));
            let result = scorer.score("I like reading.", None).await;
            assert!(result.is_failed());
            assert_eq!(result.grade, 0.0);
            assert!(result.feedback.contains("timed out"));
        }
    }

    /// 测试真实 LLM 服务连通性
    ///
    /// 运行方式：
    /// ```bash
    /// cargo test test_llm_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_llm_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let client = LlmClient::new(&Config::from_env().expect("配置无效"));
        let outcome = client
            .complete(&CompletionRequest {
                system: "You are a concise assistant.".to_string(),
                user: "Say hello in one word.".to_string(),
                temperature: 0.3,
                max_tokens: 20,
            })
            .await;

        println!("LLM 响应: {:?}", outcome);
        assert!(outcome.is_success());
    }
}
