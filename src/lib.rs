//! # Speaking Grader
//!
//! 英语口说练习评分服务：录音送发音评测，作答文本送 LLM 评分，合并为一份报告，
//! 并可在练习结束时生成整轮总结。
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Clients）
//! - `clients/` - 外部服务调用，只返回 `ProviderOutcome`，从不向上抛错
//! - `AzureSpeechClient` - Azure 发音评测 REST 接口
//! - `LlmClient` - OpenAI 兼容的 LLM 接口
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每次只处理一份作答
//! - `SpeechScorer` - 发音评分，五分制总分
//! - `ContentScorer` - 内容评分，提示词构建与回复解析
//! - `SessionSummarizer` - 整轮总结
//! - `aggregator` - 综合评分规则
//!
//! ### ③ 流程层（Workflow）
//! - `AnswerFlow` - 一次作答的评分流程（发音 ∥ 内容 → 合并）
//!
//! ### ④ 编排层（Transport）
//! - `api/` - axum 路由
//! - `App` - 应用生命周期
//!
//! ## 模块结构

pub mod api;
pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{AggregatedResult, ContentAssessment, SpeechAssessment, SpeechInput};
pub use services::{ContentScorer, SessionSummarizer, SpeechScorer};
pub use workflow::{AnswerFlow, AnswerSubmission};
