use alert_provisioning::{config::Config, startup};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let db = match startup::connect_to_database(&config).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to prepare database: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        rule_base_interval_seconds = %config.rule_base_interval_seconds,
        transaction_timeout = ?config.transaction_timeout,
        "Database migrated, provisioning store ready"
    );

    if let Err(e) = db.close().await {
        tracing::warn!("Failed to close database connection: {}", e);
    }
}
