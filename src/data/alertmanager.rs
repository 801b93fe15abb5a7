//! Alertmanager configuration repositories and store.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use migration::Expr;
use sea_orm::{
    ActiveValue, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::{
    data::{
        context::{with_connection, DbContext},
        map_unique_violation, DbStore,
    },
    error::{conflict::ConflictError, Error},
    model::alertmanager::{
        AlertmanagerConfiguration, AlertmanagerConfigurationVersion,
        SaveAlertmanagerConfigurationCmd,
    },
    service::provisioning::persist::AmConfigStore,
};

/// One "latest" configuration row per organization.
pub struct AlertConfigurationRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> AlertConfigurationRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn find_latest(
        &self,
        org_id: i64,
    ) -> Result<Option<entity::alert_configuration::Model>, DbErr> {
        entity::prelude::AlertConfiguration::find()
            .filter(entity::alert_configuration::Column::OrgId.eq(org_id))
            .one(self.db)
            .await
    }

    pub async fn find_version(&self, org_id: i64) -> Result<Option<i64>, DbErr> {
        entity::prelude::AlertConfiguration::find()
            .select_only()
            .column(entity::alert_configuration::Column::Version)
            .filter(entity::alert_configuration::Column::OrgId.eq(org_id))
            .into_tuple::<i64>()
            .one(self.db)
            .await
    }

    /// Inserts the first configuration of an org at version 1.
    pub async fn create(
        &self,
        org_id: i64,
        configuration: String,
        is_default: bool,
        now: NaiveDateTime,
    ) -> Result<entity::alert_configuration::Model, DbErr> {
        entity::prelude::AlertConfiguration::insert(entity::alert_configuration::ActiveModel {
            org_id: ActiveValue::Set(org_id),
            alertmanager_configuration: ActiveValue::Set(configuration),
            version: ActiveValue::Set(1),
            is_default: ActiveValue::Set(is_default),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        })
        .exec_with_returning(self.db)
        .await
    }

    /// Compare-and-set on the stored version.
    ///
    /// # Returns
    /// - `Ok(1)` - The configuration was replaced and its version incremented
    /// - `Ok(0)` - No configuration exists or its version moved on
    pub async fn update_versioned(
        &self,
        org_id: i64,
        configuration: String,
        is_default: bool,
        expected_version: i64,
        now: NaiveDateTime,
    ) -> Result<u64, DbErr> {
        let result = entity::prelude::AlertConfiguration::update_many()
            .col_expr(
                entity::alert_configuration::Column::AlertmanagerConfiguration,
                Expr::value(configuration),
            )
            .col_expr(
                entity::alert_configuration::Column::IsDefault,
                Expr::value(is_default),
            )
            .col_expr(
                entity::alert_configuration::Column::Version,
                Expr::value(expected_version + 1),
            )
            .col_expr(entity::alert_configuration::Column::UpdatedAt, Expr::value(now))
            .filter(entity::alert_configuration::Column::OrgId.eq(org_id))
            .filter(entity::alert_configuration::Column::Version.eq(expected_version))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

/// Append-only history of saved configurations.
pub struct AlertConfigurationHistoryRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> AlertConfigurationHistoryRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn insert(
        &self,
        config: &entity::alert_configuration::Model,
    ) -> Result<entity::alert_configuration_history::Model, DbErr> {
        entity::prelude::AlertConfigurationHistory::insert(
            entity::alert_configuration_history::ActiveModel {
                org_id: ActiveValue::Set(config.org_id),
                version: ActiveValue::Set(config.version),
                alertmanager_configuration: ActiveValue::Set(
                    config.alertmanager_configuration.clone(),
                ),
                is_default: ActiveValue::Set(config.is_default),
                created_at: ActiveValue::Set(config.updated_at),
                ..Default::default()
            },
        )
        .exec_with_returning(self.db)
        .await
    }

    /// Most recent entries first, at most `limit` of them.
    pub async fn list(
        &self,
        org_id: i64,
        limit: u64,
    ) -> Result<Vec<entity::alert_configuration_history::Model>, DbErr> {
        entity::prelude::AlertConfigurationHistory::find()
            .filter(entity::alert_configuration_history::Column::OrgId.eq(org_id))
            .order_by_desc(entity::alert_configuration_history::Column::Version)
            .order_by_desc(entity::alert_configuration_history::Column::Id)
            .limit(limit)
            .all(self.db)
            .await
    }
}

#[async_trait]
impl AmConfigStore for DbStore {
    async fn get_latest_alertmanager_configuration(
        &self,
        ctx: &DbContext,
        org_id: i64,
    ) -> Result<AlertmanagerConfiguration, Error> {
        let model = with_connection!(ctx, |db| {
            AlertConfigurationRepository::new(db)
                .find_latest(org_id)
                .await
        })?;

        model
            .map(AlertmanagerConfiguration::from)
            .ok_or_else(|| Error::not_found("alertmanager configuration", org_id))
    }

    async fn update_alertmanager_configuration(
        &self,
        ctx: &DbContext,
        cmd: SaveAlertmanagerConfigurationCmd,
    ) -> Result<AlertmanagerConfiguration, Error> {
        let SaveAlertmanagerConfigurationCmd {
            org_id,
            configuration,
            is_default,
            expected_version,
        } = cmd;

        ctx.in_transaction(|ctx| async move {
            let now = Utc::now().naive_utc();

            let model = match expected_version {
                None => {
                    let existing = with_connection!(&ctx, |db| {
                        AlertConfigurationRepository::new(db)
                            .find_version(org_id)
                            .await
                    })?;
                    if existing.is_some() {
                        return Err(ConflictError::ConfigurationExists(org_id).into());
                    }

                    with_connection!(&ctx, |db| {
                        AlertConfigurationRepository::new(db)
                            .create(org_id, configuration, is_default, now)
                            .await
                    })
                    .map_err(|err| match map_unique_violation(err) {
                        Error::Conflict(_) => Error::from(ConflictError::ConfigurationExists(org_id)),
                        err => err,
                    })?
                }
                Some(expected) => {
                    let updated = with_connection!(&ctx, |db| {
                        AlertConfigurationRepository::new(db)
                            .update_versioned(org_id, configuration, is_default, expected, now)
                            .await
                    })?;

                    if updated == 0 {
                        let actual = with_connection!(&ctx, |db| {
                            AlertConfigurationRepository::new(db)
                                .find_version(org_id)
                                .await
                        })?;

                        return Err(match actual {
                            None => Error::not_found("alertmanager configuration", org_id),
                            Some(actual) => ConflictError::VersionMismatch {
                                resource: "alertmanager configuration",
                                id: org_id.to_string(),
                                expected,
                                actual,
                            }
                            .into(),
                        });
                    }

                    with_connection!(&ctx, |db| {
                        AlertConfigurationRepository::new(db)
                            .find_latest(org_id)
                            .await
                    })?
                    .ok_or_else(|| {
                        Error::InternalError(format!(
                            "alertmanager configuration for org {} vanished inside its own transaction",
                            org_id
                        ))
                    })?
                }
            };

            with_connection!(&ctx, |db| {
                AlertConfigurationHistoryRepository::new(db)
                    .insert(&model)
                    .await
            })?;

            tracing::debug!(
                org_id = %org_id,
                version = %model.version,
                "Saved alertmanager configuration"
            );

            Ok(AlertmanagerConfiguration::from(model))
        })
        .await
    }

    async fn get_alertmanager_configuration_history(
        &self,
        ctx: &DbContext,
        org_id: i64,
        limit: u64,
    ) -> Result<Vec<AlertmanagerConfigurationVersion>, Error> {
        let models = with_connection!(ctx, |db| {
            AlertConfigurationHistoryRepository::new(db)
                .list(org_id, limit)
                .await
        })?;

        Ok(models
            .into_iter()
            .map(AlertmanagerConfigurationVersion::from)
            .collect())
    }
}
