//! Single alert rule operations.
//!
//! A rule always lives in a group. Creating or moving a rule into a group that already has
//! rules adopts that group's interval so the group stays consistent.

use crate::{
    data::context::DbContext,
    error::{validation::ValidationError, Error},
    model::{
        alert_rule::{
            AlertRule, AlertRuleVersion, GetAlertRuleByUidQuery, ListAlertRulesQuery,
            ProvisionedAlertRule, UpdateRule,
        },
        provenance::{ResourceRef, WriteSource},
    },
    service::provisioning::{
        persist::{AmConfigStore, ProvenanceStore, RuleStore, TransactionManager},
        provenance::check_provenance,
        ProvisioningService,
    },
};

impl<R, P, A, T> ProvisioningService<R, P, A, T>
where
    R: RuleStore,
    P: ProvenanceStore,
    A: AmConfigStore,
    T: TransactionManager,
{
    pub async fn get_alert_rule(
        &self,
        ctx: &DbContext,
        org_id: i64,
        uid: &str,
    ) -> Result<ProvisionedAlertRule, Error> {
        self.txn_manager
            .in_transaction(ctx, |ctx| async move {
                self.read_provisioned_rule(&ctx, org_id, uid).await
            })
            .await
    }

    /// Stored snapshots of a rule, newest first.
    pub async fn get_alert_rule_versions(
        &self,
        ctx: &DbContext,
        org_id: i64,
        uid: &str,
    ) -> Result<Vec<AlertRuleVersion>, Error> {
        self.rule_store
            .get_alert_rule_versions(ctx, org_id, uid)
            .await
            .map_err(|e| e.in_step("read rule versions"))
    }

    /// Create a rule at the end of its target group.
    ///
    /// The interval of an existing target group wins over the submitted one. A rule
    /// starting a new group must carry a valid interval.
    pub async fn create_alert_rule(
        &self,
        ctx: &DbContext,
        org_id: i64,
        rule: AlertRule,
        source: WriteSource,
    ) -> Result<ProvisionedAlertRule, Error> {
        validate_rule_placement(&rule)?;

        let created = self
            .txn_manager
            .in_transaction(ctx, |ctx| async move {
                let (interval_seconds, rule_group_index) =
                    self.placement_in_group(&ctx, org_id, &rule).await?;

                let rule = AlertRule {
                    org_id,
                    interval_seconds,
                    rule_group_index,
                    ..rule
                };

                let inserted = self
                    .rule_store
                    .insert_alert_rules(&ctx, vec![rule])
                    .await
                    .map_err(|e| e.in_step("insert rule"))?;
                let uid = inserted.into_keys().next().ok_or_else(|| {
                    Error::InternalError("rule insert returned no UID".to_string())
                })?;

                self.apply_provenance(
                    &ctx,
                    &ResourceRef::alert_rule(uid.as_str()),
                    org_id,
                    source.provenance,
                )
                .await
                .map_err(|e| e.in_step("write rule provenance"))?;

                self.read_provisioned_rule(&ctx, org_id, &uid).await
            })
            .await?;

        tracing::info!(
            org_id = %org_id,
            uid = %created.rule.uid,
            rule_group = %created.rule.group_key(),
            "Created alert rule"
        );

        Ok(created)
    }

    /// Replace a rule, possibly moving it to another group.
    ///
    /// The group index is kept when the group is unchanged; a moved rule is appended to
    /// its new group and adopts that group's interval. A non-zero `rule.version` is
    /// checked against the stored version.
    ///
    /// # Notes
    /// - `rule.interval_seconds` is ignored unless the rule lands in an empty group. Within
    ///   the same group the stored interval is kept; use `update_rule_group_interval` to
    ///   change it
    pub async fn update_alert_rule(
        &self,
        ctx: &DbContext,
        org_id: i64,
        rule: AlertRule,
        source: WriteSource,
    ) -> Result<ProvisionedAlertRule, Error> {
        validate_rule_placement(&rule)?;
        if rule.uid.is_empty() {
            return Err(ValidationError::MissingField("uid").into());
        }

        let uid = rule.uid.clone();

        let updated = self
            .txn_manager
            .in_transaction(ctx, |ctx| async move {
                let current = self.read_provisioned_rule(&ctx, org_id, &rule.uid).await?;
                check_provenance(&current.rule, current.provenance, source)?;

                let existing = current.rule;
                let same_group = existing.namespace_uid == rule.namespace_uid
                    && existing.rule_group == rule.rule_group;

                let (interval_seconds, rule_group_index) = if same_group {
                    (existing.interval_seconds, existing.rule_group_index)
                } else {
                    self.placement_in_group(&ctx, org_id, &rule).await?
                };

                let expected_version = if rule.version > 0 {
                    rule.version
                } else {
                    existing.version
                };
                let new = AlertRule {
                    org_id,
                    interval_seconds,
                    rule_group_index,
                    ..rule
                };
                let existing = AlertRule {
                    version: expected_version,
                    ..existing
                };

                self.rule_store
                    .update_alert_rules(&ctx, vec![UpdateRule { existing, new }])
                    .await
                    .map_err(|e| e.in_step("update rule"))?;

                self.apply_provenance(
                    &ctx,
                    &ResourceRef::alert_rule(uid.as_str()),
                    org_id,
                    source.provenance,
                )
                .await
                .map_err(|e| e.in_step("write rule provenance"))?;

                self.read_provisioned_rule(&ctx, org_id, &uid).await
            })
            .await?;

        tracing::info!(
            org_id = %org_id,
            uid = %updated.rule.uid,
            version = %updated.rule.version,
            "Updated alert rule"
        );

        Ok(updated)
    }

    /// Delete a rule and its provenance. Deleting a missing rule succeeds.
    pub async fn delete_alert_rule(
        &self,
        ctx: &DbContext,
        org_id: i64,
        uid: &str,
        source: WriteSource,
    ) -> Result<(), Error> {
        let deleted = self
            .txn_manager
            .in_transaction(ctx, |ctx| async move {
                let current = match self.read_provisioned_rule(&ctx, org_id, uid).await {
                    Ok(current) => current,
                    Err(err) if err.is_not_found() => return Ok(false),
                    Err(err) => return Err(err),
                };
                check_provenance(&current.rule, current.provenance, source)?;

                self.rule_store
                    .delete_alert_rules_by_uid(&ctx, org_id, &[uid.to_string()])
                    .await
                    .map_err(|e| e.in_step("delete rule"))?;
                self.provenance_store
                    .delete_provenance(&ctx, &current.rule, org_id)
                    .await
                    .map_err(|e| e.in_step("delete rule provenance"))?;

                Ok(true)
            })
            .await?;

        if deleted {
            tracing::info!(org_id = %org_id, uid = %uid, "Deleted alert rule");
        }

        Ok(())
    }

    async fn read_provisioned_rule(
        &self,
        ctx: &DbContext,
        org_id: i64,
        uid: &str,
    ) -> Result<ProvisionedAlertRule, Error> {
        let rule = self
            .rule_store
            .get_alert_rule_by_uid(
                ctx,
                &GetAlertRuleByUidQuery {
                    org_id,
                    uid: uid.to_string(),
                },
            )
            .await
            .map_err(|e| e.in_step("read rule"))?;

        let provenance = self
            .provenance_store
            .get_provenance(ctx, &rule, org_id)
            .await
            .map_err(|e| e.in_step("read rule provenance"))?;

        Ok(ProvisionedAlertRule { rule, provenance })
    }

    /// Interval and index for a rule appended to its target group.
    async fn placement_in_group(
        &self,
        ctx: &DbContext,
        org_id: i64,
        rule: &AlertRule,
    ) -> Result<(i64, i32), Error> {
        let siblings = self
            .rule_store
            .list_alert_rules(
                ctx,
                &ListAlertRulesQuery::for_group(org_id, &rule.namespace_uid, &rule.rule_group),
            )
            .await
            .map_err(|e| e.in_step("read target rule group"))?;

        match siblings.iter().max_by_key(|sibling| sibling.rule_group_index) {
            Some(last) => Ok((last.interval_seconds, last.rule_group_index + 1)),
            None => {
                self.validate_interval(rule.interval_seconds)?;
                Ok((rule.interval_seconds, 1))
            }
        }
    }
}

fn validate_rule_placement(rule: &AlertRule) -> Result<(), ValidationError> {
    if rule.title.trim().is_empty() {
        return Err(ValidationError::MissingField("title"));
    }
    if rule.namespace_uid.is_empty() {
        return Err(ValidationError::MissingField("namespace_uid"));
    }
    if rule.rule_group.trim().is_empty() {
        return Err(ValidationError::MissingField("rule_group"));
    }

    Ok(())
}
