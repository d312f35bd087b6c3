use anistore_app::config::AppConfig;
use anistore_app::startup;
use anistore_db::repo::users;
use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let startup = startup::open_store(&config).await?;

    let user_count = users::count_users(startup.store.pool())
        .await
        .context("failed to count users")?;
    info!(users = user_count, "record store ready");

    startup.store.pool().close().await;
    Ok(())
}
