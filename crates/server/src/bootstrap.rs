use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use harborcall_core::config::{AppConfig, ConfigError, LoadOptions};
use harborcall_core::MenuResolver;
use harborcall_db::repositories::{SqlNotificationLedger, SqlPermitStore};
use harborcall_db::{connect_with_settings, migrations, DbPool};
use harborcall_notify::transport::TransportError;
use harborcall_notify::{EmailRelayClient, NotificationDispatcher, SmsGatewayClient};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub resolver: Arc<MenuResolver>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("notification transport setup failed: {0}")]
    Transport(#[from] TransportError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let permit_store = Arc::new(SqlPermitStore::new(db_pool.clone()));
    let ledger = Arc::new(SqlNotificationLedger::new(db_pool.clone()));
    let sms = Arc::new(SmsGatewayClient::from_config(&config.sms)?);
    let email = Arc::new(EmailRelayClient::from_config(&config.email)?);

    let dispatcher =
        Arc::new(NotificationDispatcher::new(permit_store.clone(), ledger, sms, email));
    let resolver = Arc::new(MenuResolver::new(permit_store, dispatcher));

    Ok(Application { config, db_pool, resolver })
}

#[cfg(test)]
mod tests {
    use harborcall_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn memory_options() -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:?cache=shared".to_owned()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_connects_migrates_and_wires_the_resolver() {
        let app = bootstrap(memory_options()).await.expect("bootstrap should succeed");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('permits', 'rights_holders', 'departure_notifications')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected baseline tables after bootstrap");
        assert_eq!(table_count, 3, "bootstrap should expose baseline dialog-path tables");

        app.db_pool.close().await;
    }
}
