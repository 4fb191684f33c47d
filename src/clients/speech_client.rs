//! Azure 发音评测客户端 - 基础设施层
//!
//! 通过 Speech-to-Text REST 接口做单次识别，评测配置以 base64 JSON 形式放在
//! `Pronunciation-Assessment` 请求头中。

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use crate::clients::outcome::{ProviderOutcome, PROVIDER_TIMEOUT_SECS};
use crate::config::Config;
use crate::error::ProviderError;

/// 默认识别语言
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// 一次发音评测请求
#[derive(Debug, Clone, PartialEq)]
pub struct PronunciationRequest {
    pub audio: Vec<u8>,
    pub reference_text: String,
    pub language: String,
}

impl PronunciationRequest {
    pub fn new(audio: Vec<u8>, reference_text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            audio,
            reference_text: reference_text.into(),
            language: language.into(),
        }
    }

    /// 评测配置：音素粒度、百分制、开启韵律评测
    pub fn assessment_config(&self) -> JsonValue {
        json!({
            "ReferenceText": self.reference_text,
            "GradingSystem": "HundredMark",
            "Granularity": "Phoneme",
            "Dimension": "Comprehensive",
            "EnableProsodyAssessment": true,
        })
    }
}

/// 评测服务返回的原始分数
#[derive(Debug, Clone, PartialEq)]
pub struct PronunciationScores {
    pub accuracy: f64,
    pub fluency: f64,
    pub prosody: f64,
    /// 服务返回的详细 JSON（原文）
    pub raw_detail: Option<String>,
}

/// 语音评测服务
///
/// 实现方不得 panic，所有失败都以 `ProviderOutcome` 返回。
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    async fn assess(&self, request: &PronunciationRequest) -> ProviderOutcome<PronunciationScores>;
}

/// Azure Speech REST 客户端
pub struct AzureSpeechClient {
    http: reqwest::Client,
    subscription_key: String,
    endpoint: String,
    timeout: Duration,
}

impl AzureSpeechClient {
    /// 创建新的 Azure 语音客户端
    pub fn new(config: &Config) -> Self {
        Self::with_timeout(config, Duration::from_secs(PROVIDER_TIMEOUT_SECS))
    }

    pub(crate) fn with_timeout(config: &Config, timeout: Duration) -> Self {
        let endpoint = config.azure_speech_endpoint.clone().unwrap_or_else(|| {
            format!(
                "https://{}.stt.speech.microsoft.com",
                config.azure_speech_region
            )
        });

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("创建带超时的 HTTP 客户端失败，使用默认客户端: {}", e);
                reqwest::Client::new()
            });

        Self {
            http,
            subscription_key: config.azure_speech_key.clone(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn recognition_url(&self) -> String {
        format!(
            "{}/speech/recognition/conversation/cognitiveservices/v1",
            self.endpoint
        )
    }

    async fn send(&self, request: &PronunciationRequest) -> Result<(u16, String), ProviderError> {
        let header = serde_json::to_vec(&request.assessment_config())
            .map(|bytes| STANDARD.encode(bytes))
            .map_err(|e| ProviderError::InvalidRequest(e.to_string()))?;

        let response = self
            .http
            .post(self.recognition_url())
            .query(&[("language", request.language.as_str()), ("format", "detailed")])
            .header("Ocp-Apim-Subscription-Key", &self.subscription_key)
            .header("Content-Type", "audio/wav; codecs=audio/pcm; samplerate=16000")
            .header("Accept", "application/json")
            .header("Pronunciation-Assessment", header)
            .body(request.audio.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        secs: self.timeout.as_secs(),
                    }
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok((status, body))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecognitionResponse {
    recognition_status: String,
    #[serde(default, rename = "NBest")]
    n_best: Vec<JsonValue>,
}

/// 解析识别响应
///
/// 分数可能直接位于 `NBest[0]`，也可能嵌套在 `PronunciationAssessment` 下。
pub fn parse_recognition(body: &str) -> ProviderOutcome<PronunciationScores> {
    let response: RecognitionResponse = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => return ProviderOutcome::MalformedResponse(e.to_string()),
    };

    match response.recognition_status.as_str() {
        "Success" => {}
        "NoMatch" | "InitialSilenceTimeout" | "BabbleTimeout" => return ProviderOutcome::NoMatch,
        other => return ProviderOutcome::Declined(other.to_string()),
    }

    let Some(best) = response.n_best.first() else {
        return ProviderOutcome::MalformedResponse("NBest is empty".to_string());
    };
    let scores = best.get("PronunciationAssessment").unwrap_or(best);

    let field = |name: &str| scores.get(name).and_then(|v| v.as_f64());
    match (field("AccuracyScore"), field("FluencyScore"), field("ProsodyScore")) {
        (Some(accuracy), Some(fluency), Some(prosody)) => ProviderOutcome::Success(PronunciationScores {
            accuracy,
            fluency,
            prosody,
            raw_detail: Some(body.to_string()),
        }),
        _ => ProviderOutcome::MalformedResponse(
            "missing AccuracyScore/FluencyScore/ProsodyScore".to_string(),
        ),
    }
}

#[async_trait]
impl SpeechProvider for AzureSpeechClient {
    async fn assess(&self, request: &PronunciationRequest) -> ProviderOutcome<PronunciationScores> {
        debug!(
            "调用 Azure 发音评测，语言: {}，音频大小: {} 字节",
            request.language,
            request.audio.len()
        );

        let (status, body) = match self.send(request).await {
            Ok(r) => r,
            Err(e) => {
                warn!("Azure 发音评测调用失败: {}", e);
                return ProviderOutcome::Unreachable(e);
            }
        };

        if !(200..300).contains(&status) {
            warn!("Azure 发音评测返回错误状态码: {}", status);
            return ProviderOutcome::Unreachable(ProviderError::Status { code: status, body });
        }

        parse_recognition(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flat_scores() {
        let body = r#"{"RecognitionStatus":"Success","NBest":[{"AccuracyScore":85.0,"FluencyScore":80.0,"ProsodyScore":78.0,"PronScore":81.2}]}"#;
        match parse_recognition(body) {
            ProviderOutcome::Success(scores) => {
                assert_eq!(scores.accuracy, 85.0);
                assert_eq!(scores.fluency, 80.0);
                assert_eq!(scores.prosody, 78.0);
                assert_eq!(scores.raw_detail.as_deref(), Some(body));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_parse_nested_scores() {
        let body = r#"{"RecognitionStatus":"Success","NBest":[{"PronunciationAssessment":{"AccuracyScore":90,"FluencyScore":70,"ProsodyScore":60}}]}"#;
        assert!(parse_recognition(body).is_success());
    }

    #[test]
    fn test_parse_status_mapping() {
        assert_eq!(
            parse_recognition(r#"{"RecognitionStatus":"NoMatch"}"#),
            ProviderOutcome::NoMatch
        );
        assert_eq!(
            parse_recognition(r#"{"RecognitionStatus":"InitialSilenceTimeout"}"#),
            ProviderOutcome::NoMatch
        );
        assert_eq!(
            parse_recognition(r#"{"RecognitionStatus":"Error"}"#),
            ProviderOutcome::Declined("Error".to_string())
        );
    }

    #[test]
    fn test_parse_missing_prosody_is_malformed() {
        let body = r#"{"RecognitionStatus":"Success","NBest":[{"AccuracyScore":85.0,"FluencyScore":80.0}]}"#;
        assert!(matches!(
            parse_recognition(body),
            ProviderOutcome::MalformedResponse(_)
        ));
        assert!(matches!(
            parse_recognition("not json"),
            ProviderOutcome::MalformedResponse(_)
        ));
    }

    #[test]
    fn test_assessment_config() {
        let request = PronunciationRequest::new(vec![], "Hello world", DEFAULT_LANGUAGE);
        let config = request.assessment_config();
        assert_eq!(config["ReferenceText"], "Hello world");
        assert_eq!(config["GradingSystem"], "HundredMark");
        assert_eq!(config["Granularity"], "Phoneme");
        assert_eq!(config["EnableProsodyAssessment"], true);
    }

    #[tokio::test]
    async fn test_slow_recognition_times_out() {
        use crate::services::SpeechScorer;
        use std::sync::Arc;
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"RecognitionStatus":"NoMatch"}"#)
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let config = Config {
            azure_speech_key: "test-key".to_string(),
            azure_speech_endpoint: Some(server.uri()),
            ..Config::default()
        };
        let client = AzureSpeechClient::with_timeout(&config, Duration::from_millis(200));
        let outcome = client
            .assess(&PronunciationRequest::new(vec![0u8; 8], "Hello", DEFAULT_LANGUAGE))
            .await;
        assert!(matches!(
            outcome,
            ProviderOutcome::Unreachable(ProviderError::Timeout { .. })
        ));

        let scorer = SpeechScorer::with_provider(Arc::new(AzureSpeechClient::with_timeout(
            &config,
            Duration::from_millis(200),
        )));
        let result = scorer.assess(vec![0u8; 8], "Hello", DEFAULT_LANGUAGE).await;
        assert_eq!(result.error(), Some("Assessment error"));
        assert_eq!(result.total(), 0.0);
    }

    #[test]
    fn test_endpoint_from_region() {
        let config = Config {
            azure_speech_region: "westus".to_string(),
            ..Config::default()
        };
        let client = AzureSpeechClient::new(&config);
        assert_eq!(
            client.recognition_url(),
            "https://westus.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1"
        );
    }
}
