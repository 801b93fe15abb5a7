//! Tests for the rule store `update_alert_rules` method.
//!
//! This module verifies optimistic locking on the rule version, batch validation,
//! group interval consistency and version history for updated rules.

use super::*;

use crate::model::alert_rule::AlertRule;

async fn stored_rule(ctx: &DbContext, uid: &str) -> AlertRule {
    DbStore
        .get_alert_rule_by_uid(
            ctx,
            &GetAlertRuleByUidQuery {
                org_id: 1,
                uid: uid.to_string(),
            },
        )
        .await
        .unwrap()
}

/// Tests updating a rule at the version that was read.
///
/// Expected: Ok, version incremented and a second history entry recorded
#[tokio::test]
async fn updates_rule_and_increments_version() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let existing = stored_rule(&ctx, "a").await;
    let new = AlertRule {
        title: "Renamed".to_string(),
        ..existing.clone()
    };

    let result = DbStore
        .update_alert_rules(&ctx, vec![UpdateRule { existing, new }])
        .await;

    assert!(result.is_ok(), "Error: {:?}", result);
    let updated = stored_rule(&ctx, "a").await;
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.version, 2);
    assert_eq!(test.rules().count_versions(1, "a").await?, 2);

    Ok(())
}

/// Tests updating with a stale version.
///
/// Expected: Err(Conflict(VersionMismatch)) and the stored rule unchanged
#[tokio::test]
async fn rejects_stale_version() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let stale = stored_rule(&ctx, "a").await;
    DbStore
        .update_alert_rules(
            &ctx,
            vec![UpdateRule {
                existing: stale.clone(),
                new: AlertRule {
                    title: "First".to_string(),
                    ..stale.clone()
                },
            }],
        )
        .await
        .unwrap();

    let result = DbStore
        .update_alert_rules(
            &ctx,
            vec![UpdateRule {
                existing: stale.clone(),
                new: AlertRule {
                    title: "Second".to_string(),
                    ..stale
                },
            }],
        )
        .await;

    assert!(matches!(
        &result,
        Err(Error::Conflict(ConflictError::VersionMismatch {
            expected: 1,
            actual: 2,
            ..
        }))
    ));
    assert_eq!(stored_rule(&ctx, "a").await.title, "First");

    Ok(())
}

/// Tests updating a rule that does not exist.
///
/// Expected: Err(NotFound)
#[tokio::test]
async fn fails_for_missing_rule() -> Result<(), TestError> {
    let test = TestBuilder::new().build().await?;
    let ctx = DbContext::from(&test.db);

    let rule = AlertRule {
        version: 1,
        ..mock_rule(1, "ns", "g1", "a", 60)
    };

    let result = DbStore
        .update_alert_rules(
            &ctx,
            vec![UpdateRule {
                existing: rule.clone(),
                new: rule,
            }],
        )
        .await;

    assert!(matches!(&result, Err(err) if err.is_not_found()));

    Ok(())
}

/// Tests an update that tries to change the UID.
///
/// Expected: Err(Validation(UidChanged))
#[tokio::test]
async fn rejects_uid_change() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let existing = stored_rule(&ctx, "a").await;
    let new = AlertRule {
        uid: "b".to_string(),
        ..existing.clone()
    };

    let result = DbStore
        .update_alert_rules(&ctx, vec![UpdateRule { existing, new }])
        .await;

    assert!(matches!(
        &result,
        Err(Error::Validation(ValidationError::UidChanged { .. }))
    ));

    Ok(())
}

/// Tests a batch that targets the same rule twice.
///
/// Expected: Err(Validation(DuplicateUpdateTarget))
#[tokio::test]
async fn rejects_duplicate_target() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let existing = stored_rule(&ctx, "a").await;
    let update = UpdateRule {
        existing: existing.clone(),
        new: existing,
    };

    let result = DbStore
        .update_alert_rules(&ctx, vec![update.clone(), update])
        .await;

    assert!(matches!(
        &result,
        Err(Error::Validation(ValidationError::DuplicateUpdateTarget(uid))) if uid == "a"
    ));

    Ok(())
}

/// Tests a batch where the second update conflicts.
///
/// Verifies that the first update of the batch is rolled back with it.
///
/// Expected: Err(Conflict) and neither rule modified
#[tokio::test]
async fn rolls_back_whole_batch_on_conflict() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .with_rule(1, "ns", "g1", "b", 60)
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let a = stored_rule(&ctx, "a").await;
    let b = stored_rule(&ctx, "b").await;
    let stale_b = AlertRule { version: 7, ..b };

    let result = DbStore
        .update_alert_rules(
            &ctx,
            vec![
                UpdateRule {
                    existing: a.clone(),
                    new: AlertRule {
                        title: "Changed".to_string(),
                        ..a
                    },
                },
                UpdateRule {
                    existing: stale_b.clone(),
                    new: stale_b,
                },
            ],
        )
        .await;

    assert!(matches!(&result, Err(err) if err.is_conflict()));
    let a = stored_rule(&ctx, "a").await;
    assert_eq!(a.title, "Rule a");
    assert_eq!(a.version, 1);
    assert_eq!(test.rules().count_versions(1, "a").await?, 1);

    Ok(())
}

async fn group_intervals(ctx: &DbContext, rule_group: &str) -> Vec<(String, i64)> {
    DbStore
        .list_alert_rules(ctx, &ListAlertRulesQuery::for_group(1, "ns", rule_group))
        .await
        .unwrap()
        .into_iter()
        .map(|rule| (rule.uid, rule.interval_seconds))
        .collect()
}

/// Tests changing the interval of one rule while another rule of its group is left out.
///
/// Expected: Err(Validation(IntervalMismatch)) and both rules still at the old interval
#[tokio::test]
async fn rejects_interval_change_for_part_of_group() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .with_rule(1, "ns", "g1", "b", 60)
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let existing = stored_rule(&ctx, "a").await;
    let new = AlertRule {
        interval_seconds: 120,
        ..existing.clone()
    };

    let result = DbStore
        .update_alert_rules(&ctx, vec![UpdateRule { existing, new }])
        .await;

    assert!(matches!(
        &result,
        Err(Error::Validation(ValidationError::IntervalMismatch {
            expected: 60,
            actual: 120,
            ..
        }))
    ));
    assert_eq!(
        group_intervals(&ctx, "g1").await,
        vec![("a".to_string(), 60), ("b".to_string(), 60)]
    );
    assert_eq!(stored_rule(&ctx, "a").await.version, 1);

    Ok(())
}

/// Tests moving a rule into a group that runs at a different interval.
///
/// Expected: Err(Validation(IntervalMismatch)) and the rule left in its old group
#[tokio::test]
async fn rejects_move_into_group_with_other_interval() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .with_rule(1, "ns", "g2", "c", 120)
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let existing = stored_rule(&ctx, "a").await;
    let new = AlertRule {
        rule_group: "g2".to_string(),
        ..existing.clone()
    };

    let result = DbStore
        .update_alert_rules(&ctx, vec![UpdateRule { existing, new }])
        .await;

    assert!(matches!(
        &result,
        Err(Error::Validation(ValidationError::IntervalMismatch {
            expected: 120,
            actual: 60,
            ..
        }))
    ));
    assert_eq!(group_intervals(&ctx, "g1").await, vec![("a".to_string(), 60)]);
    assert_eq!(group_intervals(&ctx, "g2").await, vec![("c".to_string(), 120)]);

    Ok(())
}

/// Tests changing the interval of every rule in a group in one batch.
///
/// Expected: Ok and the whole group at the new interval
#[tokio::test]
async fn changes_interval_when_batch_covers_group() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .with_rule(1, "ns", "g1", "b", 60)
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let mut updates = Vec::new();
    for uid in ["a", "b"] {
        let existing = stored_rule(&ctx, uid).await;
        let new = AlertRule {
            interval_seconds: 120,
            ..existing.clone()
        };
        updates.push(UpdateRule { existing, new });
    }

    let result = DbStore.update_alert_rules(&ctx, updates).await;

    assert!(result.is_ok(), "Error: {:?}", result);
    assert_eq!(
        group_intervals(&ctx, "g1").await,
        vec![("a".to_string(), 120), ("b".to_string(), 120)]
    );

    Ok(())
}
