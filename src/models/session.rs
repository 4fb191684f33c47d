use serde::{Deserialize, Serialize};

/// 一道题的作答记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionItem {
    pub question: String,
    pub response: String,
    pub feedback: String,
}

/// 本轮练习的语音平均分
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechAverages {
    pub accuracy: f64,
    pub fluency: f64,
    pub prosody: f64,
}

/// 本轮练习的内容平均分
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentAverages {
    pub vocabulary: f64,
    pub grammar: f64,
    pub relevance: f64,
}

/// 平均分，缺失的组或字段都按 0 处理
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionScores {
    pub speech: SpeechAverages,
    pub content: ContentAverages,
}

/// 整轮总结的输入
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummaryInput {
    #[serde(default)]
    pub items: Vec<SessionItem>,
    #[serde(default)]
    pub scores: SessionScores,
}

impl SessionSummaryInput {
    pub fn new(items: Vec<SessionItem>, scores: SessionScores) -> Self {
        Self { items, scores }
    }

    /// 由三个按下标对齐的列表构建，长度不一致时以最短者为准
    pub fn from_parallel(
        questions: &[String],
        responses: &[String],
        feedbacks: &[String],
        scores: SessionScores,
    ) -> Self {
        let items = questions
            .iter()
            .zip(responses)
            .zip(feedbacks)
            .map(|((question, response), feedback)| SessionItem {
                question: question.clone(),
                response: response.clone(),
                feedback: feedback.clone(),
            })
            .collect();
        Self { items, scores }
    }
}
