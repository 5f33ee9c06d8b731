//! 主应用程序入口
//!
//! 加载配置、连接存储，然后启动 GraphQL 服务。

use config::AppConfig;
use infrastructure::Infrastructure;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, GRAPHQL_PATH};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    if config.uses_dev_secret() {
        tracing::warn!("正在使用开发环境 JWT 密钥，生产环境请设置 JWT_SECRET");
    }

    let infrastructure = Infrastructure::connect(&config).await?;
    let state = AppState::new(infrastructure, &config);

    let app = router(state);
    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!("社交网络服务启动在 http://{address}{GRAPHQL_PATH}");
    axum::serve(listener, app).await?;

    Ok(())
}
