use crate::error::{AppError, AppResult, ConfigError};

/// 程序配置
///
/// 进程启动时构建一次，以引用形式传入各个服务的构造函数。
#[derive(Clone, Debug)]
pub struct Config {
    // --- Azure 语音评测配置 ---
    pub azure_speech_key: String,
    pub azure_speech_region: String,
    /// 覆盖默认的 Azure 端点（测试或私有部署时使用）
    pub azure_speech_endpoint: Option<String>,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 服务配置 ---
    pub api_host: String,
    pub api_port: u16,
    pub log_level: String,
    pub debug: bool,
    /// 练习题库 TOML 文件路径
    pub question_bank_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            azure_speech_key: String::new(),
            azure_speech_region: "eastasia".to_string(),
            azure_speech_endpoint: None,
            llm_api_key: "ollama".to_string(),
            llm_api_base_url: "http://localhost:11434/v1".to_string(),
            llm_model_name: "phi4".to_string(),
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
            log_level: "info".to_string(),
            debug: false,
            question_bank_path: "questions.toml".to_string(),
        }
    }
}

impl Config {
    /// 从环境变量构建配置
    ///
    /// 未设置的变量使用默认值；已设置但无法解析的 `API_PORT` 视为配置错误。
    pub fn from_env() -> AppResult<Self> {
        let default = Self::default();
        Ok(Self {
            azure_speech_key: std::env::var("AZURE_SPEECH_KEY").unwrap_or(default.azure_speech_key),
            azure_speech_region: std::env::var("AZURE_SPEECH_REGION").unwrap_or(default.azure_speech_region),
            azure_speech_endpoint: std::env::var("AZURE_SPEECH_ENDPOINT").ok().or(default.azure_speech_endpoint),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            api_host: std::env::var("API_HOST").unwrap_or(default.api_host),
            api_port: parse_port(std::env::var("API_PORT").ok(), default.api_port)?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or(default.log_level),
            debug: std::env::var("DEBUG").ok().and_then(|v| v.parse().ok()).unwrap_or(default.debug),
            question_bank_path: std::env::var("QUESTION_BANK_PATH").unwrap_or(default.question_bank_path),
        })
    }

    /// 检查必需的凭据
    ///
    /// 缺失的凭据不会阻止服务启动，对应的评分调用会退化为默认结果。
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut problems = Vec::new();
        if self.azure_speech_key.trim().is_empty() {
            problems.push(ConfigError::EnvVarNotFound {
                var_name: "AZURE_SPEECH_KEY".to_string(),
            });
        }
        if self.azure_speech_region.trim().is_empty() && self.azure_speech_endpoint.is_none() {
            problems.push(ConfigError::EnvVarNotFound {
                var_name: "AZURE_SPEECH_REGION".to_string(),
            });
        }
        problems
    }

    /// 服务监听地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

fn parse_port(raw: Option<String>, default: u16) -> Result<u16, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => match value.trim().parse::<u16>() {
            Ok(port) => Ok(port),
            Err(_) => Err(ConfigError::EnvVarParseFailed {
                var_name: "API_PORT".to_string(),
                value,
                expected_type: "u16".to_string(),
            }),
        },
    }
}
