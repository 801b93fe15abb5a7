use sea_orm_migration::{prelude::*, schema::*};

static IDX_ALERT_RULE_VERSION_RULE_ORG_ID_RULE_UID_VERSION: &str =
    "idx-alert_rule_version-rule_org_id-rule_uid-version";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AlertRuleVersion::Table)
                    .if_not_exists()
                    .col(pk_auto(AlertRuleVersion::Id))
                    .col(big_integer(AlertRuleVersion::RuleOrgId))
                    .col(string(AlertRuleVersion::RuleUid))
                    .col(string(AlertRuleVersion::RuleNamespaceUid))
                    .col(string(AlertRuleVersion::RuleGroup))
                    .col(integer(AlertRuleVersion::RuleGroupIdx))
                    .col(big_integer(AlertRuleVersion::Version))
                    .col(string(AlertRuleVersion::Title))
                    .col(big_integer(AlertRuleVersion::IntervalSeconds))
                    .col(text(AlertRuleVersion::Data))
                    .col(timestamp(AlertRuleVersion::Created))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_ALERT_RULE_VERSION_RULE_ORG_ID_RULE_UID_VERSION)
                    .table(AlertRuleVersion::Table)
                    .col(AlertRuleVersion::RuleOrgId)
                    .col(AlertRuleVersion::RuleUid)
                    .col(AlertRuleVersion::Version)
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
                    .name(IDX_ALERT_RULE_VERSION_RULE_ORG_ID_RULE_UID_VERSION)
                    .table(AlertRuleVersion::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(AlertRuleVersion::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum AlertRuleVersion {
    Table,
    Id,
    RuleOrgId,
    RuleUid,
    RuleNamespaceUid,
    RuleGroup,
    RuleGroupIdx,
    Version,
    Title,
    IntervalSeconds,
    Data,
    Created,
}
