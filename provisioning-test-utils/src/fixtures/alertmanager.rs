use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use crate::{error::TestError, model::AlertConfigurationModel, TestContext};

impl TestContext {
    pub fn alertmanager<'a>(&'a self) -> AlertmanagerFixtures<'a> {
        AlertmanagerFixtures { setup: self }
    }
}

pub struct AlertmanagerFixtures<'a> {
    pub setup: &'a TestContext,
}

impl<'a> AlertmanagerFixtures<'a> {
    /// Insert the latest Alertmanager configuration for an org at version 1.
    ///
    /// A matching history row is inserted alongside.
    ///
    /// # Returns
    /// - `Ok(AlertConfigurationModel)` - The inserted configuration row
    /// - `Err(TestError::DbErr)` - Insert failed, e.g. the org already has a configuration
    pub async fn insert_configuration(
        &self,
        org_id: i64,
        configuration: &str,
    ) -> Result<AlertConfigurationModel, TestError> {
        let now = Utc::now().naive_utc();

        let config = entity::prelude::AlertConfiguration::insert(
            entity::alert_configuration::ActiveModel {
                org_id: sea_orm::ActiveValue::Set(org_id),
                alertmanager_configuration: sea_orm::ActiveValue::Set(configuration.to_string()),
                version: sea_orm::ActiveValue::Set(1),
                is_default: sea_orm::ActiveValue::Set(false),
                created_at: sea_orm::ActiveValue::Set(now),
                updated_at: sea_orm::ActiveValue::Set(now),
                ..Default::default()
            },
        )
        .exec_with_returning(&self.setup.db)
        .await?;

        entity::prelude::AlertConfigurationHistory::insert(
            entity::alert_configuration_history::ActiveModel {
                org_id: sea_orm::ActiveValue::Set(org_id),
                version: sea_orm::ActiveValue::Set(1),
                alertmanager_configuration: sea_orm::ActiveValue::Set(configuration.to_string()),
                is_default: sea_orm::ActiveValue::Set(false),
                created_at: sea_orm::ActiveValue::Set(now),
                ..Default::default()
            },
        )
        .exec(&self.setup.db)
        .await?;

        Ok(config)
    }

    /// Count history rows stored for an org.
    pub async fn count_history(&self, org_id: i64) -> Result<u64, TestError> {
        Ok(entity::prelude::AlertConfigurationHistory::find()
            .filter(entity::alert_configuration_history::Column::OrgId.eq(org_id))
            .count(&self.setup.db)
            .await?)
    }
}
