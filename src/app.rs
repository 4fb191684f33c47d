//! 应用生命周期 - 编排层
//!
//! 1. **初始化**：校验配置、加载题库、创建评分服务
//! 2. **运行**：绑定端口并提供 HTTP 服务，Ctrl+C 时优雅退出

use std::path::Path;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::{self, AppState};
use crate::config::Config;
use crate::models::load_question_bank_or_builtin;
use crate::utils::logging::{log_shutdown, log_startup};

/// 应用主结构
pub struct App {
    config: Config,
    state: AppState,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        for problem in config.validate() {
            warn!("⚠️ {}，相关评分将返回默认结果", problem);
        }

        let questions = load_question_bank_or_builtin(Path::new(&config.question_bank_path)).await;
        let state = AppState::new(&config, questions);

        Ok(Self { config, state })
    }

    /// 运行 HTTP 服务
    pub async fn run(self) -> Result<()> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("无法绑定地址: {}", addr))?;
        info!("🌐 服务监听于 http://{}/api", listener.local_addr()?);

        let app = api::router(self.state);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP 服务异常退出")?;

        log_shutdown();
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("无法监听 Ctrl+C 信号: {}", e);
        std::future::pending::<()>().await;
    }
}
