//! 外部服务调用结果
//!
//! 每次调用都落到以下几种结果之一，评分服务按结果类型选择默认值策略。

use crate::error::ProviderError;

/// 所有外部调用统一的超时时间（秒）
pub const PROVIDER_TIMEOUT_SECS: u64 = 120;

/// 外部服务调用结果
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutcome<T> {
    /// 调用成功并拿到了有效数据
    Success(T),
    /// 服务正常响应，但没有可用内容（未识别到语音 / 空回复）
    NoMatch,
    /// 服务拒绝处理或识别失败，附带服务给出的原因
    Declined(String),
    /// 网络错误、超时或错误状态码
    Unreachable(ProviderError),
    /// 响应格式与约定不符
    MalformedResponse(String),
}

impl<T> ProviderOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ProviderOutcome::Success(_))
    }

    /// 非成功结果的可读描述
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            ProviderOutcome::Success(_) => None,
            ProviderOutcome::NoMatch => Some("provider returned no content".to_string()),
            ProviderOutcome::Declined(reason) => Some(format!("provider declined: {}", reason)),
            ProviderOutcome::Unreachable(err) => Some(err.to_string()),
            ProviderOutcome::MalformedResponse(msg) => Some(format!("malformed provider response: {}", msg)),
        }
    }
}
