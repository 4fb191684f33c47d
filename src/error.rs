use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// 应用程序错误类型
///
/// 评分服务本身从不返回错误，这里的错误只出现在启动流程和传输层。
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 请求参数错误
    #[error("请求错误: {0}")]
    Request(#[from] RequestError),
    /// 文件读写错误
    #[error("文件错误 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 文件内容解析错误
    #[error("解析失败 ({path}): {reason}")]
    Parse { path: String, reason: String },
}

/// 外部服务（语音评测 / LLM）调用错误
///
/// 超时与其他网络错误走同一条默认结果路径，不做重试。
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    /// 网络请求失败
    #[error("network error: {0}")]
    Network(String),
    /// 请求超时
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },
    /// 服务返回错误状态码
    #[error("provider returned status {code}: {body}")]
    Status { code: u16, body: String },
    /// 请求构建失败
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// 传输层请求错误
#[derive(Debug, Error)]
pub enum RequestError {
    /// 缺少必填字段
    #[error("missing field: {0}")]
    MissingField(String),
    /// 字段格式不正确
    #[error("invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },
    /// 请求的题目不存在
    #[error("question not found: {0}")]
    QuestionNotFound(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }

    /// 创建文件解析错误
    pub fn parse_failed(path: impl Into<String>, reason: impl ToString) -> Self {
        AppError::Parse {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// 创建缺少字段错误
    pub fn missing_field(field: impl Into<String>) -> Self {
        AppError::Request(RequestError::MissingField(field.into()))
    }

    /// 创建字段格式错误
    pub fn invalid_field(field: impl Into<String>, reason: impl ToString) -> Self {
        AppError::Request(RequestError::InvalidField {
            field: field.into(),
            reason: reason.to_string(),
        })
    }

    /// 创建题目不存在错误
    pub fn question_not_found(id: impl Into<String>) -> Self {
        AppError::Request(RequestError::QuestionNotFound(id.into()))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Request(RequestError::QuestionNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Request(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("请求处理失败: {}", self);
        } else {
            tracing::warn!("请求参数错误: {}", self);
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
