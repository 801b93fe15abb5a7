use sea_orm_migration::{prelude::*, schema::*};

static IDX_ALERT_CONFIGURATION_ORG_ID: &str = "idx-alert_configuration-org_id";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AlertConfiguration::Table)
                    .if_not_exists()
                    .col(pk_auto(AlertConfiguration::Id))
                    .col(big_integer(AlertConfiguration::OrgId))
                    .col(text(AlertConfiguration::AlertmanagerConfiguration))
                    .col(big_integer(AlertConfiguration::Version))
                    .col(boolean(AlertConfiguration::IsDefault))
                    .col(timestamp(AlertConfiguration::CreatedAt))
                    .col(timestamp(AlertConfiguration::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // One latest configuration row per organization
        manager
            .create_index(
                Index::create()
                    .name(IDX_ALERT_CONFIGURATION_ORG_ID)
                    .table(AlertConfiguration::Table)
                    .col(AlertConfiguration::OrgId)
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
                    .name(IDX_ALERT_CONFIGURATION_ORG_ID)
                    .table(AlertConfiguration::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(AlertConfiguration::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum AlertConfiguration {
    Table,
    Id,
    OrgId,
    AlertmanagerConfiguration,
    Version,
    IsDefault,
    CreatedAt,
    UpdatedAt,
}
