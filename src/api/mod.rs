//! API 模块
//!
//! 负责 HTTP 传输：请求校验、表单读取、序列化。所有路由都在 `/api` 下。

pub mod handlers;
pub mod types;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::config::Config;
use crate::models::QuestionBank;
use crate::workflow::AnswerFlow;

pub use types::{
    GraderRequest, OverallFeedbackRequest, OverallFeedbackResponse, QuestionFilter, SpeechCredentials,
};

/// 上传音频的最大字节数
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// 路由共享状态
///
/// 只包含不可变数据和无状态服务，克隆开销很小。
#[derive(Clone)]
pub struct AppState {
    pub flow: AnswerFlow,
    pub credentials: Arc<SpeechCredentials>,
    pub questions: Arc<QuestionBank>,
}

impl AppState {
    pub fn new(config: &Config, questions: QuestionBank) -> Self {
        Self::with_flow(AnswerFlow::new(config), SpeechCredentials::from_config(config), questions)
    }

    pub fn with_flow(flow: AnswerFlow, credentials: SpeechCredentials, questions: QuestionBank) -> Self {
        Self {
            flow,
            credentials: Arc::new(credentials),
            questions: Arc::new(questions),
        }
    }
}

/// 构建路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api", get(handlers::root))
        .route("/api/", get(handlers::root))
        .route("/api/health", get(handlers::health))
        .route("/api/questions", get(handlers::list_questions))
        .route("/api/questions/{id}", get(handlers::get_question))
        .route("/api/grader/score-answer", post(handlers::score_answer))
        .route("/api/grader/overall-feedback", post(handlers::overall_feedback))
        .route("/api/speech/credentials", get(handlers::speech_credentials))
        .route("/api/speech/assess-pronunciation", post(handlers::assess_pronunciation))
        .route("/api/assessment", post(handlers::assess_answer))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
