use sea_orm_migration::{prelude::*, schema::*};

static IDX_ALERT_CONFIGURATION_HISTORY_ORG_ID_VERSION: &str =
    "idx-alert_configuration_history-org_id-version";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AlertConfigurationHistory::Table)
                    .if_not_exists()
                    .col(pk_auto(AlertConfigurationHistory::Id))
                    .col(big_integer(AlertConfigurationHistory::OrgId))
                    .col(big_integer(AlertConfigurationHistory::Version))
                    .col(text(AlertConfigurationHistory::AlertmanagerConfiguration))
                    .col(boolean(AlertConfigurationHistory::IsDefault))
                    .col(timestamp(AlertConfigurationHistory::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_ALERT_CONFIGURATION_HISTORY_ORG_ID_VERSION)
                    .table(AlertConfigurationHistory::Table)
                    .col(AlertConfigurationHistory::OrgId)
                    .col(AlertConfigurationHistory::Version)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_ALERT_CONFIGURATION_HISTORY_ORG_ID_VERSION)
                    .table(AlertConfigurationHistory::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .table(AlertConfigurationHistory::Table)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum AlertConfigurationHistory {
    Table,
    Id,
    OrgId,
    Version,
    AlertmanagerConfiguration,
    IsDefault,
    CreatedAt,
}
