//! 整轮总结服务 - 业务能力层

use std::sync::Arc;

use tracing::{info, warn};

use crate::clients::{CompletionRequest, ProviderOutcome, TextGrader};
use crate::models::SessionSummaryInput;
use crate::services::prompts::{build_summary_prompt, SUMMARY_SYSTEM_PROMPT};

pub const SUMMARY_TEMPERATURE: f32 = 0.4;
pub const SUMMARY_MAX_TOKENS: u32 = 1500;

/// 总结失败时返回的固定文本
pub const SUMMARY_APOLOGY: &str =
    "Sorry, we encountered an error generating your overall feedback. Please try again.";

/// 整轮总结服务
#[derive(Clone)]
pub struct SessionSummarizer {
    grader: Arc<dyn TextGrader>,
}

impl SessionSummarizer {
    pub fn new(grader: Arc<dyn TextGrader>) -> Self {
        Self { grader }
    }

    /// 生成总结反馈
    ///
    /// 只调用一次评分模型；失败时整体返回致歉文本，不做逐题兜底。
    pub async fn summarize(&self, input: &SessionSummaryInput) -> String {
        info!("生成整轮总结，共 {} 道题", input.items.len());

        let request = CompletionRequest {
            system: SUMMARY_SYSTEM_PROMPT.to_string(),
            user: build_summary_prompt(input),
            temperature: SUMMARY_TEMPERATURE,
            max_tokens: SUMMARY_MAX_TOKENS,
        };

        match self.grader.complete(&request).await {
            ProviderOutcome::Success(text) if !text.trim().is_empty() => {
                info!("✓ 整轮总结生成成功");
                text.trim().to_string()
            }
            other => {
                warn!(
                    "整轮总结生成失败: {}",
                    other
                        .failure_reason()
                        .unwrap_or_else(|| "empty completion".to_string())
                );
                SUMMARY_APOLOGY.to_string()
            }
        }
    }
}
