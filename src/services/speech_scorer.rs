//! 发音评分服务 - 业务能力层
//!
//! 只负责"发音评测"能力：调用语音服务、计算五分制总分、失败时给出默认结果。

use std::sync::Arc;

use serde_json::{json, Value as JsonValue};
use tracing::{info, warn};

use crate::clients::{
    AzureSpeechClient, PronunciationRequest, PronunciationScores, ProviderOutcome, SpeechProvider,
};
use crate::config::Config;
use crate::models::SpeechAssessment;

pub const NO_SPEECH_RECOGNIZED: &str = "No speech recognized";
pub const RECOGNITION_FAILED: &str = "Recognition failed";
pub const ASSESSMENT_ERROR: &str = "Assessment error";

/// 发音评分服务
///
/// 不持有可变状态，可被任意并发调用。
#[derive(Clone)]
pub struct SpeechScorer {
    provider: Arc<dyn SpeechProvider>,
}

impl SpeechScorer {
    /// 使用 Azure 语音服务创建
    pub fn new(config: &Config) -> Self {
        Self::with_provider(Arc::new(AzureSpeechClient::new(config)))
    }

    pub fn with_provider(provider: Arc<dyn SpeechProvider>) -> Self {
        Self { provider }
    }

    /// 评测一段录音
    ///
    /// 从不返回错误：任何失败都得到四项为 0、`detail.error` 说明原因的结果。
    pub async fn assess(
        &self,
        audio: Vec<u8>,
        reference_text: &str,
        language: &str,
    ) -> SpeechAssessment {
        let request = PronunciationRequest::new(audio, reference_text, language);

        match self.provider.assess(&request).await {
            ProviderOutcome::Success(scores) => {
                let assessment = Self::from_scores(scores);
                info!("✓ 发音评测完成，总分: {}", assessment.total());
                assessment
            }
            ProviderOutcome::NoMatch => {
                warn!("未能从音频中识别到语音");
                SpeechAssessment::failed(NO_SPEECH_RECOGNIZED)
            }
            ProviderOutcome::Declined(reason) => {
                warn!("语音识别失败: {}", reason);
                SpeechAssessment::failed(RECOGNITION_FAILED)
            }
            ProviderOutcome::Unreachable(err) => {
                warn!("发音评测调用失败: {}", err);
                SpeechAssessment::failed(ASSESSMENT_ERROR)
            }
            ProviderOutcome::MalformedResponse(msg) => {
                warn!("发音评测响应格式错误: {}", msg);
                SpeechAssessment::failed(ASSESSMENT_ERROR)
            }
        }
    }

    fn from_scores(scores: PronunciationScores) -> SpeechAssessment {
        let detail = parse_detail(scores.raw_detail.as_deref());
        SpeechAssessment::from_scores(scores.accuracy, scores.fluency, scores.prosody, detail)
    }
}

/// 解析详细结果，缺失或无法解析时返回空对象
fn parse_detail(raw: Option<&str>) -> JsonValue {
    let Some(raw) = raw else {
        return json!({});
    };
    match serde_json::from_str::<JsonValue>(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("无法解析发音评测详细结果: {}", e);
            json!({})
        }
    }
}
