//! 主应用程序入口
//!
//! 加载配置、组装基础设施与用例服务，启动 Axum Web API 服务。

use std::sync::Arc;

use anyhow::Context;
use application::SystemClock;
use config::AppConfig;
use infrastructure::Infrastructure;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志，RUST_LOG 未设置时使用 info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::load().context("加载配置失败")?;
    tracing::info!(
        database = %config.sanitized_database_url(),
        bind = %config.bind_address(),
        "配置加载完成"
    );

    let infra = Infrastructure::connect(&config)
        .await
        .context("初始化基础设施失败")?;
    let state = AppState::new(infra, &config, Arc::new(SystemClock));
    let app = router(state, &config.server.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("无法监听 {}", config.bind_address()))?;
    tracing::info!("服务启动在 http://{}", config.bind_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "无法监听退出信号");
        std::future::pending::<()>().await;
    }
}
