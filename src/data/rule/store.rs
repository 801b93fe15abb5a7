use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    data::{
        context::{with_connection, DbContext},
        map_unique_violation,
        rule::{version::AlertRuleVersionRepository, AlertRuleRepository},
        DbStore,
    },
    error::{conflict::ConflictError, validation::ValidationError, Error},
    model::alert_rule::{
        AlertRule, AlertRuleVersion, GetAlertRuleByUidQuery, ListAlertRulesQuery, RuleGroupKey,
        UpdateRule,
    },
    service::provisioning::persist::RuleStore,
    util::uid::generate_short_uid,
};

#[async_trait]
impl RuleStore for DbStore {
    async fn get_alert_rule_by_uid(
        &self,
        ctx: &DbContext,
        query: &GetAlertRuleByUidQuery,
    ) -> Result<AlertRule, Error> {
        let model = with_connection!(ctx, |db| {
            AlertRuleRepository::new(db)
                .find_by_uid(query.org_id, &query.uid)
                .await
        })?;

        match model {
            Some(model) => Ok(AlertRule::try_from(model)?),
            None => Err(Error::not_found("alert rule", &query.uid)),
        }
    }

    async fn list_alert_rules(
        &self,
        ctx: &DbContext,
        query: &ListAlertRulesQuery,
    ) -> Result<Vec<AlertRule>, Error> {
        let models = with_connection!(ctx, |db| AlertRuleRepository::new(db).list(query).await)?;

        Ok(models
            .into_iter()
            .map(AlertRule::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_rule_group_interval(
        &self,
        ctx: &DbContext,
        org_id: i64,
        namespace_uid: &str,
        rule_group: &str,
    ) -> Result<i64, Error> {
        let interval = with_connection!(ctx, |db| {
            AlertRuleRepository::new(db)
                .find_group_interval(org_id, namespace_uid, rule_group)
                .await
        })?;

        interval.ok_or_else(|| {
            Error::not_found("rule group", RuleGroupKey::new(org_id, namespace_uid, rule_group))
        })
    }

    async fn insert_alert_rules(
        &self,
        ctx: &DbContext,
        mut rules: Vec<AlertRule>,
    ) -> Result<HashMap<String, i32>, Error> {
        if rules.is_empty() {
            return Ok(HashMap::new());
        }

        for rule in rules.iter_mut().filter(|rule| rule.uid.is_empty()) {
            rule.uid = generate_short_uid();
        }
        validate_insert_batch(&rules)?;

        let rows = serialize_bodies(rules)?;

        let models = ctx
            .in_transaction(|ctx| async move {
                ensure_uids_available(&ctx, &rows).await?;
                ensure_group_intervals_match(&ctx, &rows).await?;

                let now = Utc::now().naive_utc();
                with_connection!(&ctx, |db| {
                    let models = AlertRuleRepository::new(db)
                        .insert_many(rows, now)
                        .await
                        .map_err(map_unique_violation)?;
                    AlertRuleVersionRepository::new(db)
                        .insert_many(&models, now)
                        .await?;

                    Ok(models)
                })
            })
            .await?;

        tracing::debug!(count = models.len(), "Inserted alert rules");

        Ok(models
            .into_iter()
            .map(|model| (model.uid, model.id))
            .collect())
    }

    async fn update_rule_group(
        &self,
        ctx: &DbContext,
        org_id: i64,
        namespace_uid: &str,
        rule_group: &str,
        interval_seconds: i64,
    ) -> Result<(), Error> {
        if interval_seconds <= 0 {
            return Err(ValidationError::InvalidInterval {
                interval: interval_seconds,
                base: 1,
            }
            .into());
        }

        let now = Utc::now().naive_utc();
        let updated = with_connection!(ctx, |db| {
            AlertRuleRepository::new(db)
                .update_group_interval(org_id, namespace_uid, rule_group, interval_seconds, now)
                .await
        })?;

        if updated == 0 {
            return Err(Error::not_found(
                "rule group",
                RuleGroupKey::new(org_id, namespace_uid, rule_group),
            ));
        }

        tracing::debug!(
            org_id = %org_id,
            namespace_uid = %namespace_uid,
            rule_group = %rule_group,
            interval_seconds = %interval_seconds,
            rules = %updated,
            "Updated rule group interval"
        );

        Ok(())
    }

    /// Every update is checked against the version the caller read. Rules of a target
    /// group left out of the batch must already use the batch's interval for that group;
    /// callers changing a group's interval realign it with `update_rule_group` first.
    async fn update_alert_rules(
        &self,
        ctx: &DbContext,
        updates: Vec<UpdateRule>,
    ) -> Result<(), Error> {
        if updates.is_empty() {
            return Ok(());
        }

        validate_update_batch(&updates)?;

        let rows = updates
            .into_iter()
            .map(|update| {
                let data = serde_json::to_string(&update.new.body)?;
                Ok((update, data))
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;

        ctx.in_transaction(|ctx| async move {
            ensure_untouched_rules_match(&ctx, &rows).await?;

            let now = Utc::now().naive_utc();
            let mut snapshots = Vec::with_capacity(rows.len());

            for (UpdateRule { existing, new }, data) in rows {
                let expected = existing.version;
                let updated = with_connection!(&ctx, |db| {
                    AlertRuleRepository::new(db)
                        .update_versioned(&new, data.clone(), expected, now)
                        .await
                })?;

                if updated == 0 {
                    let actual = with_connection!(&ctx, |db| {
                        AlertRuleRepository::new(db)
                            .find_version(new.org_id, &new.uid)
                            .await
                    })?;

                    return Err(match actual {
                        None => Error::not_found("alert rule", &new.uid),
                        Some(actual) => ConflictError::VersionMismatch {
                            resource: "alert rule",
                            id: new.uid.clone(),
                            expected,
                            actual,
                        }
                        .into(),
                    });
                }

                snapshots.push(entity::alert_rule::Model {
                    id: existing.id,
                    org_id: new.org_id,
                    uid: new.uid,
                    namespace_uid: new.namespace_uid,
                    rule_group: new.rule_group,
                    rule_group_idx: new.rule_group_index,
                    title: new.title,
                    interval_seconds: new.interval_seconds,
                    version: expected + 1,
                    data,
                    updated: now,
                });
            }

            with_connection!(&ctx, |db| {
                AlertRuleVersionRepository::new(db)
                    .insert_many(&snapshots, now)
                    .await
            })?;

            tracing::debug!(count = snapshots.len(), "Updated alert rules");

            Ok(())
        })
        .await
    }

    async fn delete_alert_rules_by_uid(
        &self,
        ctx: &DbContext,
        org_id: i64,
        uids: &[String],
    ) -> Result<(), Error> {
        if uids.is_empty() {
            return Ok(());
        }

        ctx.in_transaction(|ctx| async move {
            let deleted = with_connection!(&ctx, |db| {
                let deleted = AlertRuleRepository::new(db)
                    .delete_by_uids(org_id, uids)
                    .await?;
                AlertRuleVersionRepository::new(db)
                    .delete_by_rule_uids(org_id, uids)
                    .await?;

                Ok::<_, Error>(deleted)
            })?;

            tracing::debug!(org_id = %org_id, deleted = %deleted, "Deleted alert rules");

            Ok(())
        })
        .await
    }

    async fn get_alert_rule_versions(
        &self,
        ctx: &DbContext,
        org_id: i64,
        uid: &str,
    ) -> Result<Vec<AlertRuleVersion>, Error> {
        let models = with_connection!(ctx, |db| {
            AlertRuleVersionRepository::new(db).list(org_id, uid).await
        })?;

        Ok(models
            .into_iter()
            .map(AlertRuleVersion::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

fn serialize_bodies(rules: Vec<AlertRule>) -> Result<Vec<(AlertRule, String)>, Error> {
    rules
        .into_iter()
        .map(|rule| {
            let data = serde_json::to_string(&rule.body)?;
            Ok((rule, data))
        })
        .collect()
}

fn validate_rule_fields(rule: &AlertRule) -> Result<(), ValidationError> {
    if rule.title.trim().is_empty() {
        return Err(ValidationError::MissingField("title"));
    }
    if rule.namespace_uid.is_empty() {
        return Err(ValidationError::MissingField("namespace_uid"));
    }
    if rule.rule_group.trim().is_empty() {
        return Err(ValidationError::MissingField("rule_group"));
    }
    if rule.interval_seconds <= 0 {
        return Err(ValidationError::InvalidInterval {
            interval: rule.interval_seconds,
            base: 1,
        });
    }

    Ok(())
}

/// Rules of one group within a batch must agree on the interval.
fn validate_group_intervals<'r>(
    rules: impl Iterator<Item = &'r AlertRule>,
) -> Result<(), ValidationError> {
    let mut intervals: HashMap<RuleGroupKey, i64> = HashMap::new();

    for rule in rules {
        let expected = *intervals
            .entry(rule.group_key())
            .or_insert(rule.interval_seconds);

        if expected != rule.interval_seconds {
            return Err(ValidationError::IntervalMismatch {
                namespace_uid: rule.namespace_uid.clone(),
                rule_group: rule.rule_group.clone(),
                expected,
                actual: rule.interval_seconds,
            });
        }
    }

    Ok(())
}

pub(crate) fn validate_insert_batch(rules: &[AlertRule]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();

    for rule in rules {
        validate_rule_fields(rule)?;

        if !seen.insert((rule.org_id, rule.uid.as_str())) {
            return Err(ValidationError::DuplicateUid(rule.uid.clone()));
        }
    }

    validate_group_intervals(rules.iter())
}

pub(crate) fn validate_update_batch(updates: &[UpdateRule]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();

    for UpdateRule { existing, new } in updates {
        if existing.uid != new.uid || existing.org_id != new.org_id {
            return Err(ValidationError::UidChanged {
                from: existing.uid.clone(),
                to: new.uid.clone(),
            });
        }

        validate_rule_fields(new)?;

        if !seen.insert((new.org_id, new.uid.as_str())) {
            return Err(ValidationError::DuplicateUpdateTarget(new.uid.clone()));
        }
    }

    validate_group_intervals(updates.iter().map(|update| &update.new))
}

async fn ensure_uids_available(
    ctx: &DbContext,
    rows: &[(AlertRule, String)],
) -> Result<(), Error> {
    let mut by_org: BTreeMap<i64, Vec<String>> = BTreeMap::new();
    for (rule, _) in rows {
        by_org.entry(rule.org_id).or_default().push(rule.uid.clone());
    }

    for (org_id, uids) in by_org {
        let mut existing = with_connection!(ctx, |db| {
            AlertRuleRepository::new(db)
                .find_existing_uids(org_id, &uids)
                .await
        })?;
        existing.sort();

        if let Some(uid) = existing.into_iter().next() {
            return Err(ConflictError::UidAlreadyExists(uid).into());
        }
    }

    Ok(())
}

/// A rule joining a group that already has rules must use the group's stored interval.
async fn ensure_group_intervals_match(
    ctx: &DbContext,
    rows: &[(AlertRule, String)],
) -> Result<(), Error> {
    let groups: BTreeMap<RuleGroupKey, i64> = rows
        .iter()
        .map(|(rule, _)| (rule.group_key(), rule.interval_seconds))
        .collect();

    for (key, interval) in groups {
        let stored = with_connection!(ctx, |db| {
            AlertRuleRepository::new(db)
                .find_group_interval(key.org_id, &key.namespace_uid, &key.rule_group)
                .await
        })?;

        if let Some(stored) = stored.filter(|stored| *stored != interval) {
            return Err(ValidationError::IntervalMismatch {
                namespace_uid: key.namespace_uid,
                rule_group: key.rule_group,
                expected: stored,
                actual: interval,
            }
            .into());
        }
    }

    Ok(())
}

/// Rules of a target group that are not part of the update batch keep their interval, so
/// it has to match the interval the batch gives the group.
async fn ensure_untouched_rules_match(
    ctx: &DbContext,
    rows: &[(UpdateRule, String)],
) -> Result<(), Error> {
    let mut uids_by_org: HashMap<i64, Vec<String>> = HashMap::new();
    let mut groups: BTreeMap<RuleGroupKey, i64> = BTreeMap::new();
    for (UpdateRule { new, .. }, _) in rows {
        uids_by_org.entry(new.org_id).or_default().push(new.uid.clone());
        groups.insert(new.group_key(), new.interval_seconds);
    }

    for (key, interval) in groups {
        let uids = uids_by_org
            .get(&key.org_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let stored = with_connection!(ctx, |db| {
            AlertRuleRepository::new(db)
                .find_group_intervals_excluding(&key, uids)
                .await
        })?;

        if let Some(stored) = stored.into_iter().find(|stored| *stored != interval) {
            return Err(ValidationError::IntervalMismatch {
                namespace_uid: key.namespace_uid,
                rule_group: key.rule_group,
                expected: stored,
                actual: interval,
            }
            .into());
        }
    }

    Ok(())
}
