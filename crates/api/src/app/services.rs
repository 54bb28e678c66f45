//! Store selection and service construction.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use freezer_infra::{FreezerService, InMemoryFreezerStore, PostgresFreezerStore, SharedStore};

use crate::config::AppConfig;

/// Shared state handed to every handler through `Extension`.
pub struct AppServices {
    pub freezer: FreezerService,
    pub app_env: String,
}

/// Postgres when `DATABASE_URL` is set, the in-memory store otherwise.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let store: SharedStore = match &config.database_url {
        Some(url) => {
            let store = PostgresFreezerStore::connect(url, config.db_max_connections)
                .await
                .context("failed to connect to postgres")?;
            info!(max_connections = config.db_max_connections, "using postgres store");
            Arc::new(store)
        }
        None => {
            info!("DATABASE_URL not set; using in-memory store");
            Arc::new(InMemoryFreezerStore::new())
        }
    };

    Ok(AppServices {
        freezer: FreezerService::new(store, config.service_settings()),
        app_env: config.app_env.clone(),
    })
}
