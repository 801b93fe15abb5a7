//! Alert rule repositories and the rule store.

pub mod store;
pub mod version;

use chrono::NaiveDateTime;
use migration::Expr;
use sea_orm::{
    ActiveValue, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::model::alert_rule::{AlertRule, ListAlertRulesQuery, RuleGroupKey};

const BATCH_SIZE: usize = 100;

pub struct AlertRuleRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> AlertRuleRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn find_by_uid(
        &self,
        org_id: i64,
        uid: &str,
    ) -> Result<Option<entity::alert_rule::Model>, DbErr> {
        entity::prelude::AlertRule::find()
            .filter(entity::alert_rule::Column::OrgId.eq(org_id))
            .filter(entity::alert_rule::Column::Uid.eq(uid))
            .one(self.db)
            .await
    }

    /// Rules matching the query, ordered by namespace, group, group index and row id.
    pub async fn list(
        &self,
        query: &ListAlertRulesQuery,
    ) -> Result<Vec<entity::alert_rule::Model>, DbErr> {
        let mut select = entity::prelude::AlertRule::find()
            .filter(entity::alert_rule::Column::OrgId.eq(query.org_id));

        if !query.namespace_uids.is_empty() {
            select = select.filter(
                entity::alert_rule::Column::NamespaceUid.is_in(query.namespace_uids.iter().cloned()),
            );
        }
        if let Some(rule_group) = &query.rule_group {
            select = select.filter(entity::alert_rule::Column::RuleGroup.eq(rule_group.as_str()));
        }
        if !query.rule_uids.is_empty() {
            select = select
                .filter(entity::alert_rule::Column::Uid.is_in(query.rule_uids.iter().cloned()));
        }

        select
            .order_by_asc(entity::alert_rule::Column::NamespaceUid)
            .order_by_asc(entity::alert_rule::Column::RuleGroup)
            .order_by_asc(entity::alert_rule::Column::RuleGroupIdx)
            .order_by_asc(entity::alert_rule::Column::Id)
            .all(self.db)
            .await
    }

    /// Interval of any rule in the group, `None` if the group has no rules.
    pub async fn find_group_interval(
        &self,
        org_id: i64,
        namespace_uid: &str,
        rule_group: &str,
    ) -> Result<Option<i64>, DbErr> {
        entity::prelude::AlertRule::find()
            .select_only()
            .column(entity::alert_rule::Column::IntervalSeconds)
            .filter(entity::alert_rule::Column::OrgId.eq(org_id))
            .filter(entity::alert_rule::Column::NamespaceUid.eq(namespace_uid))
            .filter(entity::alert_rule::Column::RuleGroup.eq(rule_group))
            .into_tuple::<i64>()
            .one(self.db)
            .await
    }

    /// Distinct intervals of the group's rules, ignoring the rules in `excluded`.
    pub async fn find_group_intervals_excluding(
        &self,
        key: &RuleGroupKey,
        excluded: &[String],
    ) -> Result<Vec<i64>, DbErr> {
        let mut select = entity::prelude::AlertRule::find()
            .select_only()
            .column(entity::alert_rule::Column::IntervalSeconds)
            .distinct()
            .filter(entity::alert_rule::Column::OrgId.eq(key.org_id))
            .filter(entity::alert_rule::Column::NamespaceUid.eq(key.namespace_uid.as_str()))
            .filter(entity::alert_rule::Column::RuleGroup.eq(key.rule_group.as_str()));

        if !excluded.is_empty() {
            select = select
                .filter(entity::alert_rule::Column::Uid.is_not_in(excluded.iter().cloned()));
        }

        select.into_tuple::<i64>().all(self.db).await
    }

    /// Subset of `uids` that already exist in the org.
    pub async fn find_existing_uids(
        &self,
        org_id: i64,
        uids: &[String],
    ) -> Result<Vec<String>, DbErr> {
        let mut existing = Vec::new();

        for batch in uids.chunks(BATCH_SIZE) {
            let found = entity::prelude::AlertRule::find()
                .select_only()
                .column(entity::alert_rule::Column::Uid)
                .filter(entity::alert_rule::Column::OrgId.eq(org_id))
                .filter(entity::alert_rule::Column::Uid.is_in(batch.iter().cloned()))
                .into_tuple::<String>()
                .all(self.db)
                .await?;
            existing.extend(found);
        }

        Ok(existing)
    }

    /// Current version of a rule, `None` if it does not exist.
    pub async fn find_version(&self, org_id: i64, uid: &str) -> Result<Option<i64>, DbErr> {
        entity::prelude::AlertRule::find()
            .select_only()
            .column(entity::alert_rule::Column::Version)
            .filter(entity::alert_rule::Column::OrgId.eq(org_id))
            .filter(entity::alert_rule::Column::Uid.eq(uid))
            .into_tuple::<i64>()
            .one(self.db)
            .await
    }

    /// Inserts rules at version 1 in chunks of `BATCH_SIZE`.
    ///
    /// # Arguments
    /// - `rules`: Vector of a tuple containing the rule and its serialized body
    ///
    /// # Notes
    /// - If you need all chunks to apply or none, pass a transaction as the connection
    pub async fn insert_many(
        &self,
        rules: Vec<(AlertRule, String)>,
        now: NaiveDateTime,
    ) -> Result<Vec<entity::alert_rule::Model>, DbErr> {
        let mut inserted = Vec::with_capacity(rules.len());

        for batch in rules.chunks(BATCH_SIZE) {
            let models = batch.iter().map(|(rule, data)| entity::alert_rule::ActiveModel {
                org_id: ActiveValue::Set(rule.org_id),
                uid: ActiveValue::Set(rule.uid.clone()),
                namespace_uid: ActiveValue::Set(rule.namespace_uid.clone()),
                rule_group: ActiveValue::Set(rule.rule_group.clone()),
                rule_group_idx: ActiveValue::Set(rule.rule_group_index),
                title: ActiveValue::Set(rule.title.clone()),
                interval_seconds: ActiveValue::Set(rule.interval_seconds),
                version: ActiveValue::Set(1),
                data: ActiveValue::Set(data.clone()),
                updated: ActiveValue::Set(now),
                ..Default::default()
            });

            let models = entity::prelude::AlertRule::insert_many(models)
                .exec_with_returning(self.db)
                .await?;
            inserted.extend(models);
        }

        Ok(inserted)
    }

    /// Overwrites a rule only if it is still at `expected_version`, bumping the version.
    ///
    /// # Returns
    /// - `Ok(1)` - The rule was updated
    /// - `Ok(0)` - The rule does not exist or its version moved on
    pub async fn update_versioned(
        &self,
        rule: &AlertRule,
        data: String,
        expected_version: i64,
        now: NaiveDateTime,
    ) -> Result<u64, DbErr> {
        let result = entity::prelude::AlertRule::update_many()
            .col_expr(
                entity::alert_rule::Column::NamespaceUid,
                Expr::value(rule.namespace_uid.clone()),
            )
            .col_expr(
                entity::alert_rule::Column::RuleGroup,
                Expr::value(rule.rule_group.clone()),
            )
            .col_expr(
                entity::alert_rule::Column::RuleGroupIdx,
                Expr::value(rule.rule_group_index),
            )
            .col_expr(entity::alert_rule::Column::Title, Expr::value(rule.title.clone()))
            .col_expr(
                entity::alert_rule::Column::IntervalSeconds,
                Expr::value(rule.interval_seconds),
            )
            .col_expr(entity::alert_rule::Column::Data, Expr::value(data))
            .col_expr(
                entity::alert_rule::Column::Version,
                Expr::value(expected_version + 1),
            )
            .col_expr(entity::alert_rule::Column::Updated, Expr::value(now))
            .filter(entity::alert_rule::Column::OrgId.eq(rule.org_id))
            .filter(entity::alert_rule::Column::Uid.eq(rule.uid.as_str()))
            .filter(entity::alert_rule::Column::Version.eq(expected_version))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Sets the interval of every rule in a group. Versions are left untouched.
    ///
    /// # Returns
    /// - `Ok(u64)` - Number of rules in the group
    pub async fn update_group_interval(
        &self,
        org_id: i64,
        namespace_uid: &str,
        rule_group: &str,
        interval_seconds: i64,
        now: NaiveDateTime,
    ) -> Result<u64, DbErr> {
        let result = entity::prelude::AlertRule::update_many()
            .col_expr(
                entity::alert_rule::Column::IntervalSeconds,
                Expr::value(interval_seconds),
            )
            .col_expr(entity::alert_rule::Column::Updated, Expr::value(now))
            .filter(entity::alert_rule::Column::OrgId.eq(org_id))
            .filter(entity::alert_rule::Column::NamespaceUid.eq(namespace_uid))
            .filter(entity::alert_rule::Column::RuleGroup.eq(rule_group))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn delete_by_uids(&self, org_id: i64, uids: &[String]) -> Result<u64, DbErr> {
        let mut deleted = 0;

        for batch in uids.chunks(BATCH_SIZE) {
            let result = entity::prelude::AlertRule::delete_many()
                .filter(entity::alert_rule::Column::OrgId.eq(org_id))
                .filter(entity::alert_rule::Column::Uid.is_in(batch.iter().cloned()))
                .exec(self.db)
                .await?;
            deleted += result.rows_affected;
        }

        Ok(deleted)
    }
}
