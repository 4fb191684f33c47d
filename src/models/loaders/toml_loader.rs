use crate::error::{AppError, AppResult};
use crate::models::question::QuestionBank;
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载练习题库
pub async fn load_question_bank(toml_file_path: &Path) -> AppResult<QuestionBank> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(toml_file_path.display().to_string(), e))?;

    let bank: QuestionBank = toml::from_str(&content)
        .map_err(|e| AppError::parse_failed(toml_file_path.display().to_string(), e))?;

    tracing::info!(
        "成功加载 {} 道练习题: {}",
        bank.questions.len(),
        toml_file_path.display()
    );

    Ok(bank)
}

/// 加载题库，文件不存在或解析失败时退回内置示例题库
pub async fn load_question_bank_or_builtin(toml_file_path: &Path) -> QuestionBank {
    if !toml_file_path.exists() {
        tracing::info!(
            "题库文件不存在 ({})，使用内置示例题库",
            toml_file_path.display()
        );
        return QuestionBank::builtin();
    }

    match load_question_bank(toml_file_path).await {
        Ok(bank) => bank,
        Err(e) => {
            tracing::warn!("加载题库失败，使用内置示例题库: {}", e);
            QuestionBank::builtin()
        }
    }
}
