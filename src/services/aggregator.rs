//! 综合评分 - 业务能力层
//!
//! 两个分项都换算到百分制：内容等级 ×20，发音总分 ×20。
//! 只有真实测得的分项参与总分：评分失败的一侧（发音或内容）不计入，
//! 两侧都有效时取平均，都失败时总分为 0。

use crate::models::assessment::{round_one_decimal, HUNDRED_TO_FIVE};
use crate::models::{AggregatedResult, ContentAssessment, SpeechAssessment, SpeechInput};

/// 五分制换算到百分制
pub fn five_to_hundred(score: f64) -> f64 {
    let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 5.0) };
    score * HUNDRED_TO_FIVE
}

/// 百分制总分
pub fn overall_score(content: &ContentAssessment, speech: Option<&SpeechAssessment>) -> f64 {
    let content_100 = (!content.is_failed()).then(|| five_to_hundred(content.grade));
    let speech_100 = speech
        .filter(|s| !s.is_failed())
        .map(|s| five_to_hundred(s.total()));

    let overall = match (content_100, speech_100) {
        (Some(c), Some(s)) => (c + s) / 2.0,
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => 0.0,
    };
    round_one_decimal(overall).clamp(0.0, 100.0)
}

/// 合并一次作答的发音和内容结果
pub fn aggregate(speech: SpeechInput, content: ContentAssessment) -> AggregatedResult {
    let speech = match speech {
        SpeechInput::Recorded(assessment) => Some(assessment),
        SpeechInput::NotRecorded => None,
    };

    let speech_included = speech.as_ref().is_some_and(|s| !s.is_failed());
    let overall = overall_score(&content, speech.as_ref());

    let feedback = match speech.as_ref().and_then(|s| s.error()) {
        Some(reason) => format!(
            "{}\n\nPronunciation could not be assessed: {}.",
            content.feedback, reason
        ),
        None => content.feedback.clone(),
    };

    AggregatedResult {
        speech,
        content,
        overall,
        speech_included,
        feedback,
    }
}
