//! 传输层请求 / 响应结构

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::models::{QuestionContext, QuestionType, SessionItem, SessionScores, SessionSummaryInput};

/// 内容评分请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraderRequest {
    pub answer: String,
    #[serde(default)]
    pub question: Option<QuestionContext>,
}

/// 题库查询参数，如 `?type=image-description`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionFilter {
    #[serde(default, rename = "type")]
    pub question_type: Option<QuestionType>,
}

/// 整轮总结请求
///
/// 优先使用 `items`；兼容旧版按下标对齐的三个列表。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverallFeedbackRequest {
    #[serde(default)]
    pub items: Vec<SessionItem>,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub responses: Vec<String>,
    #[serde(default)]
    pub individual_feedbacks: Vec<String>,
    #[serde(default)]
    pub scores: SessionScores,
}

impl OverallFeedbackRequest {
    pub fn into_summary_input(self) -> SessionSummaryInput {
        if !self.items.is_empty() {
            return SessionSummaryInput::new(self.items, self.scores);
        }
        SessionSummaryInput::from_parallel(
            &self.questions,
            &self.responses,
            &self.individual_feedbacks,
            self.scores,
        )
    }
}

/// 整轮总结响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallFeedbackResponse {
    pub feedback: String,
}

/// 前端语音 SDK 使用的凭据（原样透传）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechCredentials {
    pub subscription_key: String,
    pub region: String,
    #[serde(default)]
    pub token: Option<String>,
}

impl SpeechCredentials {
    pub fn from_config(config: &Config) -> Self {
        Self {
            subscription_key: config.azure_speech_key.clone(),
            region: config.azure_speech_region.clone(),
            token: None,
        }
    }
}
