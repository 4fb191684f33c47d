//! 内容评分服务 - 业务能力层
//!
//! 只负责"内容评分"能力：构建提示词、调用 LLM、解析评分结果。

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info, warn};

use crate::clients::{CompletionRequest, LlmClient, ProviderOutcome, TextGrader};
use crate::config::Config;
use crate::models::{ContentAssessment, QuestionContext, SessionSummaryInput};
use crate::services::prompts::{build_grading_prompt, GRADING_SYSTEM_PROMPT};
use crate::services::session_summarizer::SessionSummarizer;
use crate::utils::truncate_text;

pub const SCORING_TEMPERATURE: f32 = 0.3;
pub const SCORING_MAX_TOKENS: u32 = 1000;

/// 无法提取结构化结果时使用的占位分数
pub const HEURISTIC_TRAIT_SCORE: f64 = 70.0;
pub const HEURISTIC_GRADE: f64 = 3.5;

pub const NO_FEEDBACK: &str = "No feedback provided";
pub const UNPARSABLE_ASSESSMENT: &str = "Could not parse assessment";

/// 内容评分服务
///
/// 不持有可变状态，可被任意并发调用。
#[derive(Clone)]
pub struct ContentScorer {
    grader: Arc<dyn TextGrader>,
    summarizer: SessionSummarizer,
}

impl ContentScorer {
    /// 使用 OpenAI 兼容的 LLM 服务创建
    pub fn new(config: &Config) -> Self {
        Self::with_grader(Arc::new(LlmClient::new(config)))
    }

    pub fn with_grader(grader: Arc<dyn TextGrader>) -> Self {
        Self {
            summarizer: SessionSummarizer::new(grader.clone()),
            grader,
        }
    }

    /// 对一份作答评分
    ///
    /// 从不返回错误：调用失败时四项为 0，反馈为带错误信息的致歉文本。
    pub async fn score(&self, answer: &str, question: Option<&QuestionContext>) -> ContentAssessment {
        debug!("内容评分: {}", truncate_text(answer, 100));

        let request = CompletionRequest {
            system: GRADING_SYSTEM_PROMPT.to_string(),
            user: build_grading_prompt(answer, question),
            temperature: SCORING_TEMPERATURE,
            max_tokens: SCORING_MAX_TOKENS,
        };

        let outcome = self.grader.complete(&request).await;
        let result = match outcome {
            ProviderOutcome::Success(text) => parse_grading_response(&text),
            other => {
                let reason = other
                    .failure_reason()
                    .unwrap_or_else(|| "unknown provider failure".to_string());
                warn!("内容评分调用失败: {}", reason);
                ContentAssessment::failed(reason)
            }
        };

        info!("✓ 内容评分完成，整体等级: {}", result.grade);
        result
    }

    /// 生成整轮练习的总结反馈
    pub async fn generate_summary(&self, input: &SessionSummaryInput) -> String {
        self.summarizer.summarize(input).await
    }
}

/// 结构化解析的结果
#[derive(Debug, Clone, PartialEq)]
enum StructuredParse {
    /// 得到了 JSON 对象且字段均可转换
    Parsed(ContentAssessment),
    /// 不是 JSON 对象
    NotJson,
    /// 是 JSON 对象，但某个分数字段无法转换为数字
    InvalidField(String),
}

/// 解析评分模型的回复
///
/// 先尝试严格的 JSON 解析（包括 ```json 代码块），失败后走占位分数兜底。
pub fn parse_grading_response(text: &str) -> ContentAssessment {
    match parse_structured(text) {
        StructuredParse::Parsed(result) => result,
        StructuredParse::NotJson => {
            warn!("评分回复不是 JSON，使用占位分数: {}", truncate_text(text, 80));
            heuristic_assessment(text)
        }
        StructuredParse::InvalidField(reason) => {
            warn!("无法解析评分回复: {}", reason);
            ContentAssessment::failed(UNPARSABLE_ASSESSMENT)
        }
    }
}

fn parse_structured(text: &str) -> StructuredParse {
    let trimmed = text.trim();
    let object = json_object(trimmed).or_else(|| fenced_block(trimmed).and_then(json_object));

    match object {
        Some(map) => match assessment_from_object(&map) {
            Ok(result) => StructuredParse::Parsed(result),
            Err(reason) => StructuredParse::InvalidField(reason),
        },
        None => StructuredParse::NotJson,
    }
}

fn json_object(text: &str) -> Option<Map<String, JsonValue>> {
    match serde_json::from_str::<JsonValue>(text) {
        Ok(JsonValue::Object(map)) => Some(map),
        _ => None,
    }
}

fn fenced_block(text: &str) -> Option<&str> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    let fence = FENCE
        .get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*\})\s*```").ok())
        .as_ref()?;
    fence
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn assessment_from_object(map: &Map<String, JsonValue>) -> Result<ContentAssessment, String> {
    Ok(ContentAssessment {
        vocabulary: coerce_score(map, "vocabulary")?,
        grammar: coerce_score(map, "grammar")?,
        relevance: coerce_score(map, "relevance")?,
        grade: coerce_score(map, "grade")?,
        feedback: coerce_feedback(map),
        error: None,
    })
}

/// 分数原样透传，不做范围校验或重新取整；缺失时为 0
fn coerce_score(map: &Map<String, JsonValue>, key: &str) -> Result<f64, String> {
    match map.get(key) {
        None | Some(JsonValue::Null) => Ok(0.0),
        Some(JsonValue::Number(n)) => n
            .as_f64()
            .ok_or_else(|| format!("{} is not representable as f64: {}", key, n)),
        Some(JsonValue::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("{} is not a number ({:?}): {}", key, s, e)),
        Some(other) => Err(format!("{} is not a number: {}", key, other)),
    }
}

fn coerce_feedback(map: &Map<String, JsonValue>) -> String {
    match map.get("feedback") {
        Some(JsonValue::String(s)) if !s.trim().is_empty() => s.clone(),
        None | Some(JsonValue::Null) | Some(JsonValue::String(_)) => NO_FEEDBACK.to_string(),
        Some(other) => other.to_string(),
    }
}

/// 占位兜底：不是真正的提取器，分数不代表实际水平
fn heuristic_assessment(text: &str) -> ContentAssessment {
    ContentAssessment {
        vocabulary: HEURISTIC_TRAIT_SCORE,
        grammar: HEURISTIC_TRAIT_SCORE,
        relevance: HEURISTIC_TRAIT_SCORE,
        grade: HEURISTIC_GRADE,
        feedback: text.to_string(),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 固定返回值的评分服务，同时记录收到的请求
    struct StubGrader {
        outcome: ProviderOutcome<String>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl StubGrader {
        fn new(outcome: ProviderOutcome<String>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGrader for StubGrader {
        async fn complete(&self, request: &CompletionRequest) -> ProviderOutcome<String> {
            self.seen.lock().unwrap().push(request.clone());
            self.outcome.clone()
        }
    }

    #[tokio::test]
    async fn test_well_formed_json_passes_through() {
        let grader = StubGrader::new(ProviderOutcome::Success(
            r#"{"vocabulary":80,"grammar":75,"relevance":90,"grade":4.2,"feedback":"Good job"}"#
                .to_string(),
        ));
        let result = ContentScorer::with_grader(grader.clone())
            .score("I like swimming.", None)
            .await;

        assert_eq!(
            result,
            ContentAssessment {
                vocabulary: 80.0,
                grammar: 75.0,
                relevance: 90.0,
                grade: 4.2,
                feedback: "Good job".to_string(),
                error: None,
            }
        );

        let seen = grader.seen.lock().unwrap();
        assert_eq!(seen[0].temperature, 0.3);
        assert_eq!(seen[0].max_tokens, 1000);
        assert_eq!(seen[0].system, GRADING_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_non_json_uses_placeholder_scores() {
        let grader = StubGrader::new(ProviderOutcome::Success(
            "Great answer, well structured!".to_string(),
        ));
        let result = ContentScorer::with_grader(grader).score("answer", None).await;

        assert_eq!(result.vocabulary, 70.0);
        assert_eq!(result.grammar, 70.0);
        assert_eq!(result.relevance, 70.0);
        assert_eq!(result.grade, 3.5);
        assert_eq!(result.feedback, "Great answer, well structured!");
    }

    #[tokio::test]
    async fn test_provider_failure_yields_error_default() {
        let grader = StubGrader::new(ProviderOutcome::Unreachable(ProviderError::Network(
            "connection refused".to_string(),
        )));
        let result = ContentScorer::with_grader(grader).score("answer", None).await;

        assert_eq!(result.vocabulary, 0.0);
        assert_eq!(result.grammar, 0.0);
        assert_eq!(result.relevance, 0.0);
        assert_eq!(result.grade, 0.0);
        assert!(result.feedback.contains("error assessing your response"));
        assert!(result.feedback.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_timeout_takes_same_path_as_network_failure() {
        let grader = StubGrader::new(ProviderOutcome::Unreachable(ProviderError::Timeout {
            secs: 120,
        }));
        let result = ContentScorer::with_grader(grader).score("answer", None).await;
        assert!(result.is_failed());
        assert_eq!(result.grade, 0.0);
    }

    #[tokio::test]
    async fn test_scoring_is_idempotent() {
        let grader = StubGrader::new(ProviderOutcome::Success(
            r#"{"vocabulary":66.5,"grammar":71,"relevance":88,"grade":3.9,"feedback":"Solid."}"#
                .to_string(),
        ));
        let scorer = ContentScorer::with_grader(grader.clone());
        let ctx = QuestionContext::new(Some("Why?".into()), None);

        let first = scorer.score("Because.", Some(&ctx)).await;
        let second = scorer.score("Because.", Some(&ctx)).await;

        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
        let seen = grader.seen.lock().unwrap();
        assert_eq!(seen[0], seen[1]);
    }

    #[test]
    fn test_missing_keys_default() {
        let result = parse_grading_response(r#"{"grammar": 60}"#);
        assert_eq!(result.vocabulary, 0.0);
        assert_eq!(result.grammar, 60.0);
        assert_eq!(result.grade, 0.0);
        assert_eq!(result.feedback, NO_FEEDBACK);
    }

    #[test]
    fn test_out_of_range_values_pass_through() {
        let result = parse_grading_response(r#"{"vocabulary":150,"grammar":-3,"relevance":90,"grade":7,"feedback":"x"}"#);
        assert_eq!(result.vocabulary, 150.0);
        assert_eq!(result.grammar, -3.0);
        assert_eq!(result.grade, 7.0);
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let result = parse_grading_response(r#"{"vocabulary":"80","grammar":" 75.5 ","relevance":90,"grade":"4"}"#);
        assert_eq!(result.vocabulary, 80.0);
        assert_eq!(result.grammar, 75.5);
        assert_eq!(result.grade, 4.0);
    }

    #[test]
    fn test_uncoercible_field_is_error_default() {
        let result = parse_grading_response(r#"{"vocabulary":"excellent","grammar":75,"relevance":90,"grade":4}"#);
        assert_eq!(result.vocabulary, 0.0);
        assert_eq!(result.grade, 0.0);
        assert!(result.feedback.contains(UNPARSABLE_ASSESSMENT));
    }

    #[test]
    fn test_fenced_json_is_structured() {
        let text = "Here is my assessment:\n```json\n{\"vocabulary\":80,\"grammar\":75,\"relevance\":90,\"grade\":4.2,\"feedback\":\"Good job\"}\n```";
        let result = parse_grading_response(text);
        assert_eq!(result.vocabulary, 80.0);
        assert_eq!(result.feedback, "Good job");
    }

    #[test]
    fn test_truncated_json_falls_back_to_placeholder() {
        let text = r#"{"vocabulary":80,"grammar":75"#;
        let result = parse_grading_response(text);
        assert_eq!(result.grade, HEURISTIC_GRADE);
        assert_eq!(result.feedback, text);
    }

    #[test]
    fn test_json_array_is_not_structured() {
        let result = parse_grading_response("[1, 2, 3]");
        assert_eq!(result.vocabulary, HEURISTIC_TRAIT_SCORE);
    }
}
