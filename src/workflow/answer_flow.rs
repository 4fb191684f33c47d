//! 作答评分流程 - 流程层
//!
//! 核心职责：定义"一次作答"的完整评分流程
//!
//! 流程顺序：
//! 1. 有录音时，发音评测与内容评分并发执行
//! 2. 没有录音时，只做内容评分
//! 3. 合并为综合结果

use tracing::info;

use crate::config::Config;
use crate::models::{AggregatedResult, QuestionContext, SpeechInput};
use crate::services::{aggregate, ContentScorer, SpeechScorer};
use crate::utils::truncate_text;

/// 一次作答附带的录音
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSubmission {
    pub audio: Vec<u8>,
    pub reference_text: String,
    pub language: String,
}

/// 一次作答
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerSubmission {
    pub answer: String,
    pub question: Option<QuestionContext>,
    pub audio: Option<AudioSubmission>,
}

/// 作答评分流程
///
/// - 编排发音评测和内容评分
/// - 不持有可变状态
/// - 只依赖业务能力（services）
#[derive(Clone)]
pub struct AnswerFlow {
    speech_scorer: SpeechScorer,
    content_scorer: ContentScorer,
}

impl AnswerFlow {
    /// 创建新的作答评分流程
    pub fn new(config: &Config) -> Self {
        Self::with_scorers(SpeechScorer::new(config), ContentScorer::new(config))
    }

    pub fn with_scorers(speech_scorer: SpeechScorer, content_scorer: ContentScorer) -> Self {
        Self {
            speech_scorer,
            content_scorer,
        }
    }

    pub fn speech_scorer(&self) -> &SpeechScorer {
        &self.speech_scorer
    }

    pub fn content_scorer(&self) -> &ContentScorer {
        &self.content_scorer
    }

    pub async fn run(&self, submission: AnswerSubmission) -> AggregatedResult {
        info!("📝 评分作答: {}", truncate_text(&submission.answer, 80));

        let question = submission.question.as_ref();
        let result = match submission.audio {
            Some(audio) => {
                let (speech, content) = futures::join!(
                    self.speech_scorer
                        .assess(audio.audio, &audio.reference_text, &audio.language),
                    self.content_scorer.score(&submission.answer, question),
                );
                aggregate(SpeechInput::Recorded(speech), content)
            }
            None => {
                let content = self.content_scorer.score(&submission.answer, question).await;
                aggregate(SpeechInput::NotRecorded, content)
            }
        };

        info!(
            "✓ 作答评分完成，总分: {} (语音计入: {})",
            result.overall, result.speech_included
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{
        CompletionRequest, PronunciationRequest, PronunciationScores, ProviderOutcome,
        SpeechProvider, TextGrader,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedSpeech {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SpeechProvider for FixedSpeech {
        async fn assess(&self, request: &PronunciationRequest) -> ProviderOutcome<PronunciationScores> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.language, "en-GB");
            ProviderOutcome::Success(PronunciationScores {
                accuracy: 85.0,
                fluency: 80.0,
                prosody: 78.0,
                raw_detail: None,
            })
        }
    }

    struct FixedGrader;

    #[async_trait]
    impl TextGrader for FixedGrader {
        async fn complete(&self, _request: &CompletionRequest) -> ProviderOutcome<String> {
            ProviderOutcome::Success(
                r#"{"vocabulary":80,"grammar":75,"relevance":90,"grade":4.2,"feedback":"Good job"}"#
                    .to_string(),
            )
        }
    }

    fn flow(speech: Arc<FixedSpeech>) -> AnswerFlow {
        AnswerFlow::with_scorers(
            SpeechScorer::with_provider(speech),
            ContentScorer::with_grader(Arc::new(FixedGrader)),
        )
    }

    #[tokio::test]
    async fn test_with_audio_combines_both() {
        let speech = Arc::new(FixedSpeech {
            calls: AtomicUsize::new(0),
        });
        let result = flow(speech.clone())
            .run(AnswerSubmission {
                answer: "I like reading.".to_string(),
                question: None,
                audio: Some(AudioSubmission {
                    audio: vec![0; 16],
                    reference_text: "I like reading.".to_string(),
                    language: "en-GB".to_string(),
                }),
            })
            .await;

        assert_eq!(speech.calls.load(Ordering::SeqCst), 1);
        assert!(result.speech_included);
        assert_eq!(result.overall, 83.0);
    }

    #[tokio::test]
    async fn test_without_audio_skips_speech() {
        let speech = Arc::new(FixedSpeech {
            calls: AtomicUsize::new(0),
        });
        let result = flow(speech.clone())
            .run(AnswerSubmission {
                answer: "I like reading.".to_string(),
                question: None,
                audio: None,
            })
            .await;

        assert_eq!(speech.calls.load(Ordering::SeqCst), 0);
        assert!(!result.speech_included);
        assert_eq!(result.overall, 84.0);
    }
}
