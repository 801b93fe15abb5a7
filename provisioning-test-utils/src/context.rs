//! Test context structure and utilities.
//!
//! This module provides the `TestContext` returned by `TestBuilder`. The context owns an
//! in-memory SQLite database with the full provisioning schema applied through the
//! production `Migrator`, so unique indexes behave exactly as they do in Postgres.

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::error::TestError;

/// Test context structure returned by `TestBuilder`
///
/// # Usage
///
/// Most users should create this via [`TestBuilder`](crate::TestBuilder) rather
/// than constructing it directly.
///
/// ```ignore
/// let test = TestBuilder::new().build().await?;
///
/// // Access the database
/// let db = &test.db;
///
/// // Access fixtures helpers
/// test.rules().insert_mock_rule(1, "ns", "group", "uid-a", 60).await?;
/// ```
pub struct TestContext {
    /// Database connection to in-memory SQLite database
    pub db: DatabaseConnection,
}

impl TestContext {
    /// Create a new test context.
    ///
    /// Each pooled SQLite memory connection would see its own empty database, so the
    /// pool is pinned to a single connection. Transactions opened by the code under test
    /// therefore serialize on that connection.
    ///
    /// # Returns
    /// - `Ok(TestContext)` - Database connected and migrated
    /// - `Err(TestError::DbErr)` - Database connection or migration failed
    pub(crate) async fn new() -> Result<Self, TestError> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let db = Database::connect(opt).await?;

        Migrator::up(&db, None).await?;

        Ok(TestContext { db })
    }
}
