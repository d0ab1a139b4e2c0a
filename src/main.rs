// ==========================================
// GICS 行业分类浏览系统 - HTTP 服务主入口
// ==========================================
// 流程: 加载配置 → 初始化日志 → 打开数据库 → 默认数据集导入 → 启动服务
// ==========================================

use anyhow::Context;
use gics_explorer::{build_router, logging, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", gics_explorer::APP_NAME);
    tracing::info!("系统版本: {}", gics_explorer::VERSION);
    tracing::info!("==================================================");

    let config = AppConfig::from_env();
    tracing::info!("使用数据库: {}", config.db_path);

    let state = AppState::new(&config.db_path).context("无法初始化AppState")?;

    // 默认数据集导入失败不阻塞启动
    state
        .bootstrap_default_dataset(config.default_ingest.as_ref())
        .await;

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("无法监听 {}", config.bind_addr))?;
    tracing::info!("服务已启动: http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
