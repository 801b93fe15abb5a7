use chrono::NaiveDateTime;
use sea_orm::{
    ActiveValue, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};

const BATCH_SIZE: usize = 100;

/// Append-only history of rule rows.
pub struct AlertRuleVersionRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> AlertRuleVersionRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Snapshot the given rule rows as they are after a write.
    pub async fn insert_many(
        &self,
        rules: &[entity::alert_rule::Model],
        now: NaiveDateTime,
    ) -> Result<(), DbErr> {
        for batch in rules.chunks(BATCH_SIZE) {
            let versions = batch
                .iter()
                .map(|rule| entity::alert_rule_version::ActiveModel {
                    rule_org_id: ActiveValue::Set(rule.org_id),
                    rule_uid: ActiveValue::Set(rule.uid.clone()),
                    rule_namespace_uid: ActiveValue::Set(rule.namespace_uid.clone()),
                    rule_group: ActiveValue::Set(rule.rule_group.clone()),
                    rule_group_idx: ActiveValue::Set(rule.rule_group_idx),
                    version: ActiveValue::Set(rule.version),
                    title: ActiveValue::Set(rule.title.clone()),
                    interval_seconds: ActiveValue::Set(rule.interval_seconds),
                    data: ActiveValue::Set(rule.data.clone()),
                    created: ActiveValue::Set(now),
                    ..Default::default()
                });

            entity::prelude::AlertRuleVersion::insert_many(versions)
                .exec(self.db)
                .await?;
        }

        Ok(())
    }

    /// History of one rule, newest version first.
    pub async fn list(
        &self,
        org_id: i64,
        uid: &str,
    ) -> Result<Vec<entity::alert_rule_version::Model>, DbErr> {
        entity::prelude::AlertRuleVersion::find()
            .filter(entity::alert_rule_version::Column::RuleOrgId.eq(org_id))
            .filter(entity::alert_rule_version::Column::RuleUid.eq(uid))
            .order_by_desc(entity::alert_rule_version::Column::Version)
            .order_by_desc(entity::alert_rule_version::Column::Id)
            .all(self.db)
            .await
    }

    pub async fn delete_by_rule_uids(&self, org_id: i64, uids: &[String]) -> Result<u64, DbErr> {
        let mut deleted = 0;

        for batch in uids.chunks(BATCH_SIZE) {
            let result = entity::prelude::AlertRuleVersion::delete_many()
                .filter(entity::alert_rule_version::Column::RuleOrgId.eq(org_id))
                .filter(entity::alert_rule_version::Column::RuleUid.is_in(batch.iter().cloned()))
                .exec(self.db)
                .await?;
            deleted += result.rows_affected;
        }

        Ok(deleted)
    }
}
