//! 评分结果模型
//!
//! 所有记录在构造后不可变，每次请求重新构建。

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// 发音总分权重：准确度 40%，流利度 30%，韵律 30%
pub const ACCURACY_WEIGHT: f64 = 0.4;
pub const FLUENCY_WEIGHT: f64 = 0.3;
pub const PROSODY_WEIGHT: f64 = 0.3;
/// 百分制换算到五分制的除数
pub const HUNDRED_TO_FIVE: f64 = 20.0;

/// 内容评分失败时的反馈前缀
pub const CONTENT_ERROR_PREFIX: &str = "Sorry, we encountered an error assessing your response";

/// 保留一位小数，对精确二进制值做四舍六入五成双
pub fn round_one_decimal(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}

fn clamp_hundred(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// 发音评测结果
///
/// `total` 只能由三个分项推导得到；失败时四个分数一起置零。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeechAssessment {
    accuracy: f64,
    fluency: f64,
    prosody: f64,
    total: f64,
    #[serde(rename = "detail_result")]
    detail: JsonValue,
}

impl SpeechAssessment {
    /// 根据三个百分制分项构建评测结果
    pub fn from_scores(accuracy: f64, fluency: f64, prosody: f64, detail: JsonValue) -> Self {
        let accuracy = clamp_hundred(accuracy);
        let fluency = clamp_hundred(fluency);
        let prosody = clamp_hundred(prosody);
        Self {
            accuracy,
            fluency,
            prosody,
            total: Self::composite(accuracy, fluency, prosody),
            detail,
        }
    }

    /// 失败时的默认结果，`detail` 中携带原因
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            accuracy: 0.0,
            fluency: 0.0,
            prosody: 0.0,
            total: 0.0,
            detail: json!({ "error": reason.into() }),
        }
    }

    /// 五分制总分：`round((a*0.4 + f*0.3 + p*0.3) / 20, 1)`
    pub fn composite(accuracy: f64, fluency: f64, prosody: f64) -> f64 {
        let weighted =
            accuracy * ACCURACY_WEIGHT + fluency * FLUENCY_WEIGHT + prosody * PROSODY_WEIGHT;
        round_one_decimal(weighted / HUNDRED_TO_FIVE)
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn fluency(&self) -> f64 {
        self.fluency
    }

    pub fn prosody(&self) -> f64 {
        self.prosody
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn detail(&self) -> &JsonValue {
        &self.detail
    }

    /// 失败原因（仅默认结果才有）
    pub fn error(&self) -> Option<&str> {
        self.detail.get("error").and_then(|v| v.as_str())
    }

    pub fn is_failed(&self) -> bool {
        self.error().is_some()
    }
}

/// 内容评分结果
///
/// `grade` 是评分模型给出的整体判断，不由三个分项重新计算。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAssessment {
    pub vocabulary: f64,
    pub grammar: f64,
    pub relevance: f64,
    pub grade: f64,
    pub feedback: String,
    /// 评分失败的原因，只在服务内部使用，不参与序列化
    #[serde(skip)]
    pub error: Option<String>,
}

impl ContentAssessment {
    /// 失败时的默认结果
    pub fn failed(error: impl std::fmt::Display) -> Self {
        let reason = error.to_string();
        Self {
            vocabulary: 0.0,
            grammar: 0.0,
            relevance: 0.0,
            grade: 0.0,
            feedback: format!("{}: {}", CONTENT_ERROR_PREFIX, reason),
            error: Some(reason),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// 一次作答中的语音部分
///
/// 纯文本作答使用 `NotRecorded`，不会用占位分数参与总分计算。
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechInput {
    Recorded(SpeechAssessment),
    NotRecorded,
}

impl From<Option<SpeechAssessment>> for SpeechInput {
    fn from(value: Option<SpeechAssessment>) -> Self {
        match value {
            Some(assessment) => SpeechInput::Recorded(assessment),
            None => SpeechInput::NotRecorded,
        }
    }
}

/// 单次作答的综合结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedResult {
    pub speech: Option<SpeechAssessment>,
    pub content: ContentAssessment,
    /// 百分制总分
    #[serde(rename = "overall_score")]
    pub overall: f64,
    /// 语音分是否计入总分
    pub speech_included: bool,
    pub feedback: String,
}
