pub use sea_orm_migration::prelude::*;

mod m20260301_000001_alert_rule;
mod m20260301_000002_alert_rule_version;
mod m20260301_000003_alert_configuration;
mod m20260301_000004_alert_configuration_history;
mod m20260301_000005_provenance_type;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_alert_rule::Migration),
            Box::new(m20260301_000002_alert_rule_version::Migration),
            Box::new(m20260301_000003_alert_configuration::Migration),
            Box::new(m20260301_000004_alert_configuration_history::Migration),
            Box::new(m20260301_000005_provenance_type::Migration),
        ]
    }
}
