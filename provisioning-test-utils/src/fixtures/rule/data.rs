use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use crate::{
    error::TestError,
    fixtures::rule::{
        factory::{mock_rule_body, mock_rule_title},
        RuleFixtures,
    },
    model::AlertRuleModel,
};

impl<'a> RuleFixtures<'a> {
    /// Insert a mock alert rule at version 1 into the database.
    ///
    /// The group index is one past the number of rules already in the group. A version
    /// history row is inserted alongside.
    ///
    /// # Returns
    /// - `Ok(AlertRuleModel)` - The inserted rule row
    /// - `Err(TestError::DbErr)` - Insert failed, e.g. the UID already exists in the org
    pub async fn insert_mock_rule(
        &self,
        org_id: i64,
        namespace_uid: &str,
        rule_group: &str,
        uid: &str,
        interval_seconds: i64,
    ) -> Result<AlertRuleModel, TestError> {
        let existing = entity::prelude::AlertRule::find()
            .filter(entity::alert_rule::Column::OrgId.eq(org_id))
            .filter(entity::alert_rule::Column::NamespaceUid.eq(namespace_uid))
            .filter(entity::alert_rule::Column::RuleGroup.eq(rule_group))
            .count(&self.setup.db)
            .await?;

        let title = mock_rule_title(uid);
        let data = serde_json::to_string(&mock_rule_body(&title))?;
        let now = Utc::now().naive_utc();

        let rule = entity::prelude::AlertRule::insert(entity::alert_rule::ActiveModel {
            org_id: sea_orm::ActiveValue::Set(org_id),
            uid: sea_orm::ActiveValue::Set(uid.to_string()),
            namespace_uid: sea_orm::ActiveValue::Set(namespace_uid.to_string()),
            rule_group: sea_orm::ActiveValue::Set(rule_group.to_string()),
            rule_group_idx: sea_orm::ActiveValue::Set(existing as i32 + 1),
            title: sea_orm::ActiveValue::Set(title.clone()),
            interval_seconds: sea_orm::ActiveValue::Set(interval_seconds),
            version: sea_orm::ActiveValue::Set(1),
            data: sea_orm::ActiveValue::Set(data.clone()),
            updated: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        })
        .exec_with_returning(&self.setup.db)
        .await?;

        entity::prelude::AlertRuleVersion::insert(entity::alert_rule_version::ActiveModel {
            rule_org_id: sea_orm::ActiveValue::Set(org_id),
            rule_uid: sea_orm::ActiveValue::Set(rule.uid.clone()),
            rule_namespace_uid: sea_orm::ActiveValue::Set(rule.namespace_uid.clone()),
            rule_group: sea_orm::ActiveValue::Set(rule.rule_group.clone()),
            rule_group_idx: sea_orm::ActiveValue::Set(rule.rule_group_idx),
            version: sea_orm::ActiveValue::Set(1),
            title: sea_orm::ActiveValue::Set(title),
            interval_seconds: sea_orm::ActiveValue::Set(interval_seconds),
            data: sea_orm::ActiveValue::Set(data),
            created: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        })
        .exec(&self.setup.db)
        .await?;

        Ok(rule)
    }

    /// Read a rule row directly, bypassing the repository under test.
    ///
    /// # Returns
    /// - `Ok(Some(AlertRuleModel))` - Rule exists in the org
    /// - `Ok(None)` - No rule with that UID in the org
    pub async fn find_rule(
        &self,
        org_id: i64,
        uid: &str,
    ) -> Result<Option<AlertRuleModel>, TestError> {
        let rule = entity::prelude::AlertRule::find()
            .filter(entity::alert_rule::Column::OrgId.eq(org_id))
            .filter(entity::alert_rule::Column::Uid.eq(uid))
            .one(&self.setup.db)
            .await?;

        Ok(rule)
    }

    /// Count rule rows across all organizations.
    pub async fn count_rules(&self) -> Result<u64, TestError> {
        Ok(entity::prelude::AlertRule::find()
            .count(&self.setup.db)
            .await?)
    }

    /// Count version history rows recorded for a rule.
    pub async fn count_versions(&self, org_id: i64, uid: &str) -> Result<u64, TestError> {
        Ok(entity::prelude::AlertRuleVersion::find()
            .filter(entity::alert_rule_version::Column::RuleOrgId.eq(org_id))
            .filter(entity::alert_rule_version::Column::RuleUid.eq(uid))
            .count(&self.setup.db)
            .await?)
    }
}
