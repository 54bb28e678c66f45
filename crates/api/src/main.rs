use anyhow::Context;

use freezer_api::{app, config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    freezer_observability::init_for_env(&config::app_env());

    let config = config::AppConfig::load();
    let app = app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
