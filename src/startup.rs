use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::{
    config::Config,
    data::{transaction::DbTransactionManager, DbStore},
    error::Error,
    service::provisioning::DbProvisioningService,
};

/// Connect to the database and run migrations
pub async fn connect_to_database(config: &Config) -> Result<DatabaseConnection, Error> {
    let mut opt = ConnectOptions::new(&config.database_url);
    opt.sqlx_logging(false);
    if let Some(max_connections) = config.database_max_connections {
        opt.max_connections(max_connections);
    }

    let db = Database::connect(opt).await?;

    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Build the provisioning service over the database-backed stores
pub fn build_provisioning_service(config: &Config) -> DbProvisioningService {
    DbProvisioningService::new(
        DbStore,
        DbStore,
        DbStore,
        DbTransactionManager::new(config.transaction_timeout),
        config.rule_base_interval_seconds,
    )
}
