//! Tests for `ProvisioningService::replace_rule_group`.
//!
//! This module verifies the insert/update/delete classification of a group replacement,
//! moving rules between groups, the provenance policy and that a failure in any step
//! leaves the stored group untouched.

use std::collections::HashMap;

use async_trait::async_trait;

use super::*;

use crate::{
    model::alert_rule::{
        AlertRuleVersion, GetAlertRuleByUidQuery, ListAlertRulesQuery, UpdateRule,
    },
    service::provisioning::persist::RuleStore,
};

/// Rule store whose inserts always fail after every other step has written.
struct FailingInsertRuleStore;

#[async_trait]
impl RuleStore for FailingInsertRuleStore {
    async fn get_alert_rule_by_uid(
        &self,
        ctx: &DbContext,
        query: &GetAlertRuleByUidQuery,
    ) -> Result<AlertRule, Error> {
        DbStore.get_alert_rule_by_uid(ctx, query).await
    }

    async fn list_alert_rules(
        &self,
        ctx: &DbContext,
        query: &ListAlertRulesQuery,
    ) -> Result<Vec<AlertRule>, Error> {
        DbStore.list_alert_rules(ctx, query).await
    }

    async fn get_rule_group_interval(
        &self,
        ctx: &DbContext,
        org_id: i64,
        namespace_uid: &str,
        rule_group: &str,
    ) -> Result<i64, Error> {
        DbStore
            .get_rule_group_interval(ctx, org_id, namespace_uid, rule_group)
            .await
    }

    async fn insert_alert_rules(
        &self,
        _ctx: &DbContext,
        _rules: Vec<AlertRule>,
    ) -> Result<HashMap<String, i32>, Error> {
        Err(Error::InternalError("injected insert failure".to_string()))
    }

    async fn update_rule_group(
        &self,
        ctx: &DbContext,
        org_id: i64,
        namespace_uid: &str,
        rule_group: &str,
        interval_seconds: i64,
    ) -> Result<(), Error> {
        DbStore
            .update_rule_group(ctx, org_id, namespace_uid, rule_group, interval_seconds)
            .await
    }

    async fn update_alert_rules(
        &self,
        ctx: &DbContext,
        updates: Vec<UpdateRule>,
    ) -> Result<(), Error> {
        DbStore.update_alert_rules(ctx, updates).await
    }

    async fn delete_alert_rules_by_uid(
        &self,
        ctx: &DbContext,
        org_id: i64,
        uids: &[String],
    ) -> Result<(), Error> {
        DbStore.delete_alert_rules_by_uid(ctx, org_id, uids).await
    }

    async fn get_alert_rule_versions(
        &self,
        ctx: &DbContext,
        org_id: i64,
        uid: &str,
    ) -> Result<Vec<AlertRuleVersion>, Error> {
        DbStore.get_alert_rule_versions(ctx, org_id, uid).await
    }
}

/// Tests replacing a group that does not exist yet.
///
/// Expected: Ok with every rule inserted in request order and tagged with the source
#[tokio::test]
async fn creates_new_group() -> Result<(), TestError> {
    let test = TestBuilder::new().build().await?;
    let ctx = DbContext::from(&test.db);
    let service = service();

    let result = service
        .replace_rule_group(
            &ctx,
            1,
            mock_group("ns", "g1", 60, &["b", "a"]),
            WriteSource::new(Provenance::Api),
        )
        .await;

    assert!(result.is_ok(), "Error: {:?}", result);
    let changes = result.unwrap();
    assert_eq!(changes.inserted, vec!["a", "b"]);
    assert!(changes.updated.is_empty());
    assert!(changes.deleted.is_empty());

    let group = service.get_rule_group(&ctx, 1, "ns", "g1").await.unwrap();
    let rules: Vec<(&str, i32, Provenance)> = group
        .rules
        .iter()
        .map(|rule| (rule.rule.uid.as_str(), rule.rule.rule_group_index, rule.provenance))
        .collect();
    assert_eq!(
        rules,
        vec![("b", 1, Provenance::Api), ("a", 2, Provenance::Api)]
    );

    Ok(())
}

/// Tests a replacement that edits one rule, keeps one, drops one and adds one.
///
/// Expected: Ok with exactly one UID in each change list
#[tokio::test]
async fn classifies_inserts_updates_and_deletes() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .with_rule(1, "ns", "g1", "b", 60)
        .with_rule(1, "ns", "g1", "c", 60)
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let current = stored_group(&ctx, "ns", "g1").await;
    let a = AlertRule {
        title: "Renamed".to_string(),
        ..find(&current, "a").clone()
    };
    let b = find(&current, "b").clone();
    let d = mock_rule(1, "ns", "g1", "d", 60);

    let changes = service()
        .replace_rule_group(
            &ctx,
            1,
            AlertRuleGroup {
                rules: vec![a, b, d],
                ..current
            },
            WriteSource::ui(),
        )
        .await
        .unwrap();

    assert_eq!(changes.inserted, vec!["d"]);
    assert_eq!(changes.updated, vec!["a"]);
    assert_eq!(changes.deleted, vec!["c"]);

    assert_eq!(test.rules().find_rule(1, "a").await?.unwrap().version, 2);
    assert_eq!(test.rules().find_rule(1, "b").await?.unwrap().version, 1);
    assert!(test.rules().find_rule(1, "c").await?.is_none());

    Ok(())
}

/// Tests replaying the stored group unchanged.
///
/// Expected: Ok with no changes and no version bumps
#[tokio::test]
async fn unchanged_group_is_a_no_op() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .with_rule(1, "ns", "g1", "b", 60)
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let current = stored_group(&ctx, "ns", "g1").await;
    let changes = service()
        .replace_rule_group(&ctx, 1, current, WriteSource::ui())
        .await
        .unwrap();

    assert!(changes.is_empty());
    assert_eq!(test.rules().count_versions(1, "a").await?, 1);
    assert_eq!(test.rules().count_versions(1, "b").await?, 1);

    Ok(())
}

/// Tests changing only the interval of a group.
///
/// Verifies every rule reports as updated and ends up with the new interval.
///
/// Expected: Ok with all rules updated
#[tokio::test]
async fn interval_change_updates_every_rule() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .with_rule(1, "ns", "g1", "b", 60)
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let current = stored_group(&ctx, "ns", "g1").await;
    let changes = service()
        .replace_rule_group(
            &ctx,
            1,
            AlertRuleGroup {
                interval_seconds: 120,
                ..current
            },
            WriteSource::ui(),
        )
        .await
        .unwrap();

    assert_eq!(changes.updated, vec!["a", "b"]);
    let group = stored_group(&ctx, "ns", "g1").await;
    assert_eq!(group.interval_seconds, 120);
    assert!(group.rules.iter().all(|rule| rule.interval_seconds == 120));

    Ok(())
}

/// Tests a replacement that pulls in a rule from another group.
///
/// Verifies the moved rule adopts the target group and interval and that its old group
/// is left empty.
///
/// Expected: Ok with the moved rule reported as updated
#[tokio::test]
async fn moves_rule_from_other_group() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .with_rule(1, "ns", "g2", "b", 60)
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);
    let service = service();

    let target = stored_group(&ctx, "ns", "g2").await;
    let a = service.get_alert_rule(&ctx, 1, "a").await.unwrap().rule;
    let b = find(&target, "b").clone();

    let changes = service
        .replace_rule_group(
            &ctx,
            1,
            AlertRuleGroup {
                rules: vec![b, a],
                ..target
            },
            WriteSource::ui(),
        )
        .await
        .unwrap();

    assert_eq!(changes.updated, vec!["a"]);
    assert!(changes.inserted.is_empty());
    assert!(changes.deleted.is_empty());

    let moved = service.get_alert_rule(&ctx, 1, "a").await.unwrap().rule;
    assert_eq!(moved.rule_group, "g2");
    assert_eq!(moved.rule_group_index, 2);
    let old_group = service.get_rule_group(&ctx, 1, "ns", "g1").await;
    assert!(matches!(&old_group, Err(err) if err.is_not_found()));

    Ok(())
}

/// Tests pulling a rule into a group while also changing the group's interval.
///
/// Verifies rules moving in and rules staying end up at the same new interval.
///
/// Expected: Ok with both rules at the new interval
#[tokio::test]
async fn moves_rule_into_group_with_new_interval() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .with_rule(1, "ns", "g2", "b", 120)
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);
    let service = service();

    let target = stored_group(&ctx, "ns", "g2").await;
    let a = service.get_alert_rule(&ctx, 1, "a").await.unwrap().rule;
    let b = find(&target, "b").clone();

    let result = service
        .replace_rule_group(
            &ctx,
            1,
            AlertRuleGroup {
                interval_seconds: 180,
                rules: vec![b, a],
                ..target
            },
            WriteSource::ui(),
        )
        .await;

    assert!(result.is_ok(), "Error: {:?}", result);
    let group = stored_group(&ctx, "ns", "g2").await;
    assert_eq!(group.interval_seconds, 180);
    assert_eq!(
        group
            .rules
            .iter()
            .map(|rule| (rule.uid.as_str(), rule.interval_seconds))
            .collect::<Vec<_>>(),
        vec![("b", 180), ("a", 180)]
    );

    Ok(())
}

/// Tests replacing a group with no rules.
///
/// Expected: Ok with every stored rule deleted along with its provenance
#[tokio::test]
async fn empty_group_deletes_every_rule() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .with_rule(1, "ns", "g1", "b", 60)
        .with_provenance(1, "alertRule", "a", "api")
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let changes = service()
        .replace_rule_group(
            &ctx,
            1,
            mock_group("ns", "g1", 60, &[]),
            WriteSource::new(Provenance::Api),
        )
        .await
        .unwrap();

    assert_eq!(changes.deleted, vec!["a", "b"]);
    assert_eq!(test.rules().count_rules().await?, 0);
    assert!(test
        .provenance()
        .find_provenance(1, "alertRule", "a")
        .await?
        .is_none());

    Ok(())
}

/// Tests an API write to a group containing a file-provisioned rule.
///
/// Expected: Err(Conflict(ProvenanceMismatch)) and the group unchanged
#[tokio::test]
async fn rejects_foreign_provenance() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .with_rule(1, "ns", "g1", "b", 60)
        .with_provenance(1, "alertRule", "b", "file")
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let current = stored_group(&ctx, "ns", "g1").await;
    let a = AlertRule {
        title: "Renamed".to_string(),
        ..find(&current, "a").clone()
    };

    let result = service()
        .replace_rule_group(
            &ctx,
            1,
            AlertRuleGroup {
                rules: vec![a],
                ..current
            },
            WriteSource::new(Provenance::Api),
        )
        .await;

    assert!(matches!(&result, Err(err) if is_provenance_conflict(err)));
    assert!(test.rules().find_rule(1, "b").await?.is_some());
    assert_eq!(test.rules().find_rule(1, "a").await?.unwrap().title, "Rule a");

    Ok(())
}

/// Tests the same write as above with an explicit override.
///
/// Expected: Ok and the kept rule re-tagged with the caller's provenance
#[tokio::test]
async fn override_replaces_foreign_provenance() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .with_provenance(1, "alertRule", "a", "file")
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let current = stored_group(&ctx, "ns", "g1").await;
    let result = service()
        .replace_rule_group(
            &ctx,
            1,
            current,
            WriteSource::new(Provenance::Api).with_override(),
        )
        .await;

    assert!(result.is_ok(), "Error: {:?}", result);
    let record = test
        .provenance()
        .find_provenance(1, "alertRule", "a")
        .await?
        .unwrap();
    assert_eq!(record.provenance, "api");

    Ok(())
}

/// Tests a UI edit of an API-provisioned group.
///
/// Expected: Ok and the provenance record removed
#[tokio::test]
async fn ui_may_edit_api_provisioned_group() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .with_provenance(1, "alertRule", "a", "api")
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let current = stored_group(&ctx, "ns", "g1").await;
    let result = service()
        .replace_rule_group(&ctx, 1, current, WriteSource::ui())
        .await;

    assert!(result.is_ok(), "Error: {:?}", result);
    assert!(test
        .provenance()
        .find_provenance(1, "alertRule", "a")
        .await?
        .is_none());

    Ok(())
}

/// Tests a replacement whose insert step fails after deletes and updates ran.
///
/// Expected: Err naming the insert step and the stored group exactly as before
#[tokio::test]
async fn failure_in_late_step_rolls_back_everything() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .with_rule(1, "ns", "g1", "b", 60)
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let current = stored_group(&ctx, "ns", "g1").await;
    let a = AlertRule {
        title: "Renamed".to_string(),
        ..find(&current, "a").clone()
    };
    let x = mock_rule(1, "ns", "g1", "x", 60);

    let failing = ProvisioningService::new(
        FailingInsertRuleStore,
        DbStore,
        DbStore,
        DbTransactionManager::new(None),
        10,
    );
    let result = failing
        .replace_rule_group(
            &ctx,
            1,
            AlertRuleGroup {
                rules: vec![a, x],
                ..current
            },
            WriteSource::ui(),
        )
        .await;

    assert!(matches!(
        &result,
        Err(Error::Step { step: "insert new rules", .. })
    ));
    let a = test.rules().find_rule(1, "a").await?.unwrap();
    assert_eq!(a.title, "Rule a");
    assert_eq!(a.version, 1);
    assert!(test.rules().find_rule(1, "b").await?.is_some());
    assert!(test.rules().find_rule(1, "x").await?.is_none());

    Ok(())
}

/// Tests malformed requests.
///
/// Expected: Err(Validation) for each, before anything is read or written
#[tokio::test]
async fn rejects_invalid_groups() -> Result<(), TestError> {
    let test = TestBuilder::new().build().await?;
    let ctx = DbContext::from(&test.db);
    let service = service();

    let off_base = service
        .replace_rule_group(&ctx, 1, mock_group("ns", "g1", 15, &["a"]), WriteSource::ui())
        .await;
    let duplicate = service
        .replace_rule_group(
            &ctx,
            1,
            mock_group("ns", "g1", 60, &["a", "a"]),
            WriteSource::ui(),
        )
        .await;
    let untitled = service
        .replace_rule_group(&ctx, 1, mock_group("ns", "", 60, &["a"]), WriteSource::ui())
        .await;

    assert!(matches!(
        &off_base,
        Err(Error::Validation(ValidationError::InvalidInterval {
            interval: 15,
            base: 10
        }))
    ));
    assert!(matches!(
        &duplicate,
        Err(Error::Validation(ValidationError::DuplicateUid(_)))
    ));
    assert!(matches!(
        &untitled,
        Err(Error::Validation(ValidationError::MissingField("rule_group")))
    ));
    assert_eq!(test.rules().count_rules().await?, 0);

    Ok(())
}
