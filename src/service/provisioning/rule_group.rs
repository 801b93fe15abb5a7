//! Rule group operations.

use std::collections::{HashMap, HashSet};

use crate::{
    data::context::DbContext,
    error::{validation::ValidationError, Error},
    model::{
        alert_rule::{
            AlertRule, AlertRuleGroup, ListAlertRulesQuery, ProvisionedAlertRule,
            ProvisionedRuleGroup, RuleGroupChanges, RuleGroupKey, UpdateRule,
        },
        provenance::{Provenance, ResourceRef, ResourceType, WriteSource},
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
    /// Rules of a group with their provenance, ordered by group index.
    ///
    /// # Returns
    /// - `Ok(ProvisionedRuleGroup)` - The group and its shared interval
    /// - `Err(Error::NotFound)` - The group has no rules
    pub async fn get_rule_group(
        &self,
        ctx: &DbContext,
        org_id: i64,
        namespace_uid: &str,
        rule_group: &str,
    ) -> Result<ProvisionedRuleGroup, Error> {
        self.txn_manager
            .in_transaction(ctx, |ctx| async move {
                let rules = self
                    .rule_store
                    .list_alert_rules(
                        &ctx,
                        &ListAlertRulesQuery::for_group(org_id, namespace_uid, rule_group),
                    )
                    .await
                    .map_err(|e| e.in_step("read rule group"))?;

                let Some(interval_seconds) = rules.first().map(|rule| rule.interval_seconds)
                else {
                    return Err(Error::not_found(
                        "rule group",
                        RuleGroupKey::new(org_id, namespace_uid, rule_group),
                    ));
                };

                let provenances = self
                    .provenance_store
                    .get_provenances(&ctx, org_id, ResourceType::AlertRule)
                    .await
                    .map_err(|e| e.in_step("read rule provenance"))?;

                Ok(ProvisionedRuleGroup {
                    title: rule_group.to_string(),
                    namespace_uid: namespace_uid.to_string(),
                    interval_seconds,
                    rules: with_provenance(rules, &provenances),
                })
            })
            .await
    }

    /// Make the stored group match `group` exactly.
    ///
    /// Incoming rules whose UID exists in the group are updated, rules whose UID exists
    /// elsewhere in the org are moved into the group, and the rest are inserted. Stored
    /// rules of the group missing from the request are deleted. Unchanged rules are not
    /// rewritten. All rules of the request end up with `source` as their provenance.
    pub async fn replace_rule_group(
        &self,
        ctx: &DbContext,
        org_id: i64,
        group: AlertRuleGroup,
        source: WriteSource,
    ) -> Result<RuleGroupChanges, Error> {
        self.validate_rule_group(&group)?;

        let key = RuleGroupKey::new(org_id, &group.namespace_uid, &group.title);

        let changes = self
            .txn_manager
            .in_transaction(ctx, |ctx| async move {
                let current = self
                    .rule_store
                    .list_alert_rules(
                        &ctx,
                        &ListAlertRulesQuery::for_group(
                            org_id,
                            &group.namespace_uid,
                            &group.title,
                        ),
                    )
                    .await
                    .map_err(|e| e.in_step("read existing rule group"))?;

                let moving_uids: Vec<String> = {
                    let in_group: HashSet<&str> =
                        current.iter().map(|rule| rule.uid.as_str()).collect();

                    group
                        .rules
                        .iter()
                        .filter(|rule| {
                            !rule.uid.is_empty() && !in_group.contains(rule.uid.as_str())
                        })
                        .map(|rule| rule.uid.clone())
                        .collect()
                };

                let moving = if moving_uids.is_empty() {
                    Vec::new()
                } else {
                    self.rule_store
                        .list_alert_rules(
                            &ctx,
                            &ListAlertRulesQuery::for_uids(org_id, moving_uids),
                        )
                        .await
                        .map_err(|e| e.in_step("read rules moving into group"))?
                };

                let provenances = self
                    .provenance_store
                    .get_provenances(&ctx, org_id, ResourceType::AlertRule)
                    .await
                    .map_err(|e| e.in_step("read rule provenance"))?;
                let stored_provenance =
                    |uid: &str| provenances.get(uid).copied().unwrap_or_default();

                let incoming_uids: HashSet<&str> =
                    group.rules.iter().map(|rule| rule.uid.as_str()).collect();
                let deletes: Vec<AlertRule> = current
                    .iter()
                    .filter(|rule| !incoming_uids.contains(rule.uid.as_str()))
                    .cloned()
                    .collect();

                let keeps_stored_rules = current.len() > deletes.len();

                let mut stored: HashMap<String, AlertRule> = current
                    .into_iter()
                    .chain(moving)
                    .map(|rule| (rule.uid.clone(), rule))
                    .collect();

                let mut inserts = Vec::new();
                let mut updates = Vec::new();
                // (uid, stored provenance) of every existing rule kept in the group
                let mut kept: Vec<(String, Provenance)> = Vec::new();

                for (index, rule) in group.rules.iter().enumerate() {
                    let rule = AlertRule {
                        org_id,
                        namespace_uid: group.namespace_uid.clone(),
                        rule_group: group.title.clone(),
                        rule_group_index: index as i32 + 1,
                        interval_seconds: group.interval_seconds,
                        ..rule.clone()
                    };

                    match stored.remove(&rule.uid) {
                        Some(existing) => {
                            let provenance = stored_provenance(&existing.uid);
                            check_provenance(&existing, provenance, source)?;
                            kept.push((existing.uid.clone(), provenance));

                            if !existing.has_same_definition(&rule) {
                                updates.push(UpdateRule {
                                    existing,
                                    new: rule,
                                });
                            }
                        }
                        None => inserts.push(rule),
                    }
                }

                for rule in &deletes {
                    check_provenance(rule, stored_provenance(&rule.uid), source)?;
                }

                let mut changes = RuleGroupChanges {
                    deleted: deletes.iter().map(|rule| rule.uid.clone()).collect(),
                    updated: updates.iter().map(|update| update.new.uid.clone()).collect(),
                    inserted: Vec::new(),
                };

                self.rule_store
                    .delete_alert_rules_by_uid(&ctx, org_id, &changes.deleted)
                    .await
                    .map_err(|e| e.in_step("delete removed rules"))?;

                // Realigned before the updates so rules moving in match the rules staying.
                if keeps_stored_rules {
                    self.rule_store
                        .update_rule_group(
                            &ctx,
                            org_id,
                            &group.namespace_uid,
                            &group.title,
                            group.interval_seconds,
                        )
                        .await
                        .map_err(|e| e.in_step("update rule group interval"))?;
                }

                self.rule_store
                    .update_alert_rules(&ctx, updates)
                    .await
                    .map_err(|e| e.in_step("update existing rules"))?;

                let inserted = self
                    .rule_store
                    .insert_alert_rules(&ctx, inserts)
                    .await
                    .map_err(|e| e.in_step("insert new rules"))?;
                changes.inserted = inserted.into_keys().collect();

                for (uid, provenance) in &kept {
                    if *provenance != source.provenance {
                        self.apply_provenance(
                            &ctx,
                            &ResourceRef::alert_rule(uid.as_str()),
                            org_id,
                            source.provenance,
                        )
                        .await
                        .map_err(|e| e.in_step("write rule provenance"))?;
                    }
                }
                for uid in &changes.inserted {
                    self.apply_provenance(
                        &ctx,
                        &ResourceRef::alert_rule(uid.as_str()),
                        org_id,
                        source.provenance,
                    )
                    .await
                    .map_err(|e| e.in_step("write rule provenance"))?;
                }
                for uid in &changes.deleted {
                    self.provenance_store
                        .delete_provenance(&ctx, &ResourceRef::alert_rule(uid.as_str()), org_id)
                        .await
                        .map_err(|e| e.in_step("delete rule provenance"))?;
                }

                changes.inserted.sort();
                changes.updated.sort();
                changes.deleted.sort();

                Ok(changes)
            })
            .await?;

        tracing::info!(
            rule_group = %key,
            inserted = changes.inserted.len(),
            updated = changes.updated.len(),
            deleted = changes.deleted.len(),
            provenance = %source.provenance,
            "Replaced rule group"
        );

        Ok(changes)
    }

    /// Change the interval shared by every rule of a group.
    pub async fn update_rule_group_interval(
        &self,
        ctx: &DbContext,
        org_id: i64,
        namespace_uid: &str,
        rule_group: &str,
        interval_seconds: i64,
        source: WriteSource,
    ) -> Result<(), Error> {
        self.validate_interval(interval_seconds)?;

        self.txn_manager
            .in_transaction(ctx, |ctx| async move {
                let rules = self
                    .rule_store
                    .list_alert_rules(
                        &ctx,
                        &ListAlertRulesQuery::for_group(org_id, namespace_uid, rule_group),
                    )
                    .await
                    .map_err(|e| e.in_step("read rule group"))?;

                if rules.is_empty() {
                    return Err(Error::not_found(
                        "rule group",
                        RuleGroupKey::new(org_id, namespace_uid, rule_group),
                    ));
                }

                let provenances = self
                    .provenance_store
                    .get_provenances(&ctx, org_id, ResourceType::AlertRule)
                    .await
                    .map_err(|e| e.in_step("read rule provenance"))?;
                for rule in &rules {
                    let stored = provenances.get(&rule.uid).copied().unwrap_or_default();
                    check_provenance(rule, stored, source)?;
                }

                self.rule_store
                    .update_rule_group(&ctx, org_id, namespace_uid, rule_group, interval_seconds)
                    .await
                    .map_err(|e| e.in_step("update rule group interval"))?;

                for rule in &rules {
                    self.apply_provenance(&ctx, rule, org_id, source.provenance)
                        .await
                        .map_err(|e| e.in_step("write rule provenance"))?;
                }

                Ok(())
            })
            .await?;

        tracing::info!(
            org_id = %org_id,
            namespace_uid = %namespace_uid,
            rule_group = %rule_group,
            interval_seconds = %interval_seconds,
            "Updated rule group interval"
        );

        Ok(())
    }

    /// Delete every rule of a group. Deleting an empty group succeeds.
    ///
    /// # Returns
    /// - `Ok(Vec<String>)` - Sorted UIDs of the deleted rules
    pub async fn delete_rule_group(
        &self,
        ctx: &DbContext,
        org_id: i64,
        namespace_uid: &str,
        rule_group: &str,
        source: WriteSource,
    ) -> Result<Vec<String>, Error> {
        let deleted = self
            .txn_manager
            .in_transaction(ctx, |ctx| async move {
                let rules = self
                    .rule_store
                    .list_alert_rules(
                        &ctx,
                        &ListAlertRulesQuery::for_group(org_id, namespace_uid, rule_group),
                    )
                    .await
                    .map_err(|e| e.in_step("read rule group"))?;

                if rules.is_empty() {
                    return Ok(Vec::new());
                }

                let provenances = self
                    .provenance_store
                    .get_provenances(&ctx, org_id, ResourceType::AlertRule)
                    .await
                    .map_err(|e| e.in_step("read rule provenance"))?;
                for rule in &rules {
                    let stored = provenances.get(&rule.uid).copied().unwrap_or_default();
                    check_provenance(rule, stored, source)?;
                }

                let mut uids: Vec<String> = rules.into_iter().map(|rule| rule.uid).collect();
                uids.sort();

                self.rule_store
                    .delete_alert_rules_by_uid(&ctx, org_id, &uids)
                    .await
                    .map_err(|e| e.in_step("delete rule group"))?;

                for uid in &uids {
                    self.provenance_store
                        .delete_provenance(&ctx, &ResourceRef::alert_rule(uid.as_str()), org_id)
                        .await
                        .map_err(|e| e.in_step("delete rule provenance"))?;
                }

                Ok(uids)
            })
            .await?;

        if !deleted.is_empty() {
            tracing::info!(
                org_id = %org_id,
                namespace_uid = %namespace_uid,
                rule_group = %rule_group,
                deleted = deleted.len(),
                "Deleted rule group"
            );
        }

        Ok(deleted)
    }

    fn validate_rule_group(&self, group: &AlertRuleGroup) -> Result<(), Error> {
        if group.title.trim().is_empty() {
            return Err(ValidationError::MissingField("rule_group").into());
        }
        if group.namespace_uid.is_empty() {
            return Err(ValidationError::MissingField("namespace_uid").into());
        }
        self.validate_interval(group.interval_seconds)?;

        let mut seen = HashSet::new();
        for rule in &group.rules {
            if rule.title.trim().is_empty() {
                return Err(ValidationError::MissingField("title").into());
            }
            if !rule.uid.is_empty() && !seen.insert(rule.uid.as_str()) {
                return Err(ValidationError::DuplicateUid(rule.uid.clone()).into());
            }
        }

        Ok(())
    }
}

pub(super) fn with_provenance(
    rules: Vec<AlertRule>,
    provenances: &HashMap<String, Provenance>,
) -> Vec<ProvisionedAlertRule> {
    rules
        .into_iter()
        .map(|rule| ProvisionedAlertRule {
            provenance: provenances.get(&rule.uid).copied().unwrap_or_default(),
            rule,
        })
        .collect()
}
