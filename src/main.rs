use anyhow::Result;
use speaking_grader::utils::logging;
use speaking_grader::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 读取 .env（可选）
    let _ = dotenvy::dotenv();

    // 加载配置
    let config = Config::from_env()?;

    // 初始化日志
    logging::init(&config.log_level);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
