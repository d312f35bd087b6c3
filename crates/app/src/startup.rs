use anistore_db::seed::{self, SeedReport};
use anistore_db::Store;
use anyhow::Context;
use tracing::info;

use crate::config::AppConfig;

/// An opened, migrated store and what seeding did to it.
#[derive(Debug)]
pub struct Startup {
    pub store: Store,
    /// `None` when seeding is disabled.
    pub seeded: Option<SeedReport>,
}

/// Connect, apply migrations, then seed empty tables if the config asks for it.
pub async fn open_store(config: &AppConfig) -> anyhow::Result<Startup> {
    info!(db_path = %config.db_path, max_connections = config.max_connections, "connecting to database");
    let pool = anistore_db::connect_with(&config.db_path, config.max_connections)
        .await
        .context("failed to connect to database")?;

    anistore_db::migrate::run(&pool)
        .await
        .context("failed to run migrations")?;
    info!("migrations complete");

    let store = Store::new(pool);
    let seeded = if config.seed {
        let report = seed::seed_defaults(&store)
            .await
            .context("failed to seed default records")?;
        info!(tables = report.seeded.len(), "seeding complete");
        Some(report)
    } else {
        None
    };

    Ok(Startup { store, seeded })
}
