use sea_orm_migration::{prelude::*, schema::*};

static IDX_ALERT_RULE_ORG_ID_UID: &str = "idx-alert_rule-org_id-uid";
static IDX_ALERT_RULE_ORG_ID_NAMESPACE_UID_RULE_GROUP: &str =
    "idx-alert_rule-org_id-namespace_uid-rule_group";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AlertRule::Table)
                    .if_not_exists()
                    .col(pk_auto(AlertRule::Id))
                    .col(big_integer(AlertRule::OrgId))
                    .col(string(AlertRule::Uid))
                    .col(string(AlertRule::NamespaceUid))
                    .col(string(AlertRule::RuleGroup))
                    .col(integer(AlertRule::RuleGroupIdx))
                    .col(string(AlertRule::Title))
                    .col(big_integer(AlertRule::IntervalSeconds))
                    .col(big_integer(AlertRule::Version))
                    .col(text(AlertRule::Data))
                    .col(timestamp(AlertRule::Updated))
                    .to_owned(),
            )
            .await?;

        // UIDs are only unique within an organization
        manager
            .create_index(
                Index::create()
                    .name(IDX_ALERT_RULE_ORG_ID_UID)
                    .table(AlertRule::Table)
                    .col(AlertRule::OrgId)
                    .col(AlertRule::Uid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_ALERT_RULE_ORG_ID_NAMESPACE_UID_RULE_GROUP)
                    .table(AlertRule::Table)
                    .col(AlertRule::OrgId)
                    .col(AlertRule::NamespaceUid)
                    .col(AlertRule::RuleGroup)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_ALERT_RULE_ORG_ID_NAMESPACE_UID_RULE_GROUP)
                    .table(AlertRule::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name(IDX_ALERT_RULE_ORG_ID_UID)
                    .table(AlertRule::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(AlertRule::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum AlertRule {
    Table,
    Id,
    OrgId,
    Uid,
    NamespaceUid,
    RuleGroup,
    RuleGroupIdx,
    Title,
    IntervalSeconds,
    Version,
    Data,
    Updated,
}
