//! 路由处理函数
//!
//! 只做参数提取和转发，评分逻辑全部在 workflow / services 中。

use std::collections::HashMap;

use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use serde_json::{json, Value as JsonValue};
use tracing::info;

use crate::api::types::{
    GraderRequest, OverallFeedbackRequest, OverallFeedbackResponse, QuestionFilter, SpeechCredentials,
};
use crate::api::AppState;
use crate::clients::DEFAULT_LANGUAGE;
use crate::error::{AppError, AppResult};
use crate::models::{
    AggregatedResult, ContentAssessment, PracticeQuestion, QuestionBank, QuestionContext, SpeechAssessment,
};
use crate::utils::truncate_text;
use crate::workflow::{AnswerSubmission, AudioSubmission};

pub async fn root() -> Json<JsonValue> {
    Json(json!({ "message": "English Speaking Practice API", "version": env!("CARGO_PKG_VERSION") }))
}

pub async fn health() -> Json<JsonValue> {
    Json(json!({ "status": "healthy", "service": "english-speaking-practice" }))
}

pub async fn list_questions(
    State(state): State<AppState>,
    Query(filter): Query<QuestionFilter>,
) -> Json<QuestionBank> {
    match filter.question_type {
        Some(question_type) => Json(state.questions.by_type(question_type)),
        None => Json(state.questions.as_ref().clone()),
    }
}

pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<PracticeQuestion>> {
    state
        .questions
        .find(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::question_not_found(id))
}

pub async fn score_answer(
    State(state): State<AppState>,
    Json(request): Json<GraderRequest>,
) -> Json<ContentAssessment> {
    info!("评分作答: {}", truncate_text(&request.answer, 100));

    let result = state
        .flow
        .content_scorer()
        .score(&request.answer, request.question.as_ref())
        .await;
    Json(result)
}

pub async fn overall_feedback(
    State(state): State<AppState>,
    Json(request): Json<OverallFeedbackRequest>,
) -> Json<OverallFeedbackResponse> {
    let input = request.into_summary_input();
    info!("生成整轮总结，共 {} 道题", input.items.len());

    let feedback = state.flow.content_scorer().generate_summary(&input).await;
    Json(OverallFeedbackResponse { feedback })
}

pub async fn speech_credentials(State(state): State<AppState>) -> Json<SpeechCredentials> {
    Json(state.credentials.as_ref().clone())
}

pub async fn assess_pronunciation(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<SpeechAssessment>> {
    let mut form = MultipartForm::read(multipart).await?;
    // 空的音频也交给评测服务，由它给出默认结果
    let audio = form.take_audio().ok_or_else(|| AppError::missing_field("audio"))?;
    let reference_text = form
        .take_text("reference_text")
        .ok_or_else(|| AppError::missing_field("reference_text"))?;
    let language = form
        .take_text("language")
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    info!("评测发音，参考文本: {}", truncate_text(&reference_text, 100));

    let result = state
        .flow
        .speech_scorer()
        .assess(audio, &reference_text, &language)
        .await;
    Ok(Json(result))
}

/// 一次提交同时评测录音和内容
pub async fn assess_answer(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<AggregatedResult>> {
    let mut form = MultipartForm::read(multipart).await?;
    let answer = form
        .take_text("answer")
        .ok_or_else(|| AppError::missing_field("answer"))?;
    let question = QuestionContext::new(form.take_text("question_text"), form.take_text("question_image"));
    let question = match form.take_text("question_id") {
        Some(id) if question.is_empty() => {
            let practice = state
                .questions
                .find(&id)
                .ok_or_else(|| AppError::question_not_found(id.clone()))?;
            Some(practice.to_context())
        }
        _ => (!question.is_empty()).then_some(question),
    };

    // 空的音频字段视为未录音
    let audio = form.take_audio().filter(|bytes| !bytes.is_empty()).map(|audio| AudioSubmission {
        audio,
        reference_text: form.take_text("reference_text").unwrap_or_else(|| answer.clone()),
        language: form
            .take_text("language")
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
    });

    let result = state
        .flow
        .run(AnswerSubmission {
            answer,
            question,
            audio,
        })
        .await;
    Ok(Json(result))
}

/// 读取完的 multipart 表单
#[derive(Default)]
struct MultipartForm {
    texts: HashMap<String, String>,
    audio: Option<Vec<u8>>,
}

impl MultipartForm {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::invalid_field("multipart", e))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "audio" {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::invalid_field("audio", e))?;
                form.audio = Some(bytes.to_vec());
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::invalid_field(name.clone(), e))?;
                form.texts.insert(name, text);
            }
        }
        Ok(form)
    }

    /// 非空的文本字段
    fn take_text(&mut self, name: &str) -> Option<String> {
        self.texts.remove(name).filter(|v| !v.trim().is_empty())
    }

    /// 音频字段（可能为空）
    fn take_audio(&mut self) -> Option<Vec<u8>> {
        self.audio.take()
    }
}
