use super::*;

/// Expect every rule of the group to move to the new interval
#[tokio::test]
async fn updates_group_interval() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .with_rule(1, "ns", "g1", "b", 60)
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);
    let service = service();

    let result = service
        .update_rule_group_interval(&ctx, 1, "ns", "g1", 120, WriteSource::ui())
        .await;

    assert!(result.is_ok(), "Error: {:?}", result);
    let group = service.get_rule_group(&ctx, 1, "ns", "g1").await.unwrap();
    assert_eq!(group.interval_seconds, 120);
    assert!(group
        .rules
        .iter()
        .all(|rule| rule.rule.interval_seconds == 120));

    Ok(())
}

/// Expect Validation when the interval is not a multiple of the base interval
#[tokio::test]
async fn rejects_interval_off_base() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let result = service()
        .update_rule_group_interval(&ctx, 1, "ns", "g1", 25, WriteSource::ui())
        .await;

    assert!(matches!(&result, Err(err) if err.is_validation()));
    assert_eq!(
        test.rules().find_rule(1, "a").await?.unwrap().interval_seconds,
        60
    );

    Ok(())
}

/// Expect NotFound for a group without rules
#[tokio::test]
async fn fails_for_unknown_group() -> Result<(), TestError> {
    let test = TestBuilder::new().build().await?;
    let ctx = DbContext::from(&test.db);

    let result = service()
        .update_rule_group_interval(&ctx, 1, "ns", "g1", 120, WriteSource::ui())
        .await;

    assert!(matches!(&result, Err(err) if err.is_not_found()));

    Ok(())
}

/// Expect a provenance conflict when a file-provisioned rule is changed from the UI
#[tokio::test]
async fn rejects_foreign_provenance() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_rule(1, "ns", "g1", "a", 60)
        .with_provenance(1, "alertRule", "a", "file")
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let result = service()
        .update_rule_group_interval(&ctx, 1, "ns", "g1", 120, WriteSource::ui())
        .await;

    assert!(matches!(&result, Err(err) if is_provenance_conflict(err)));
    assert_eq!(
        test.rules().find_rule(1, "a").await?.unwrap().interval_seconds,
        60
    );

    Ok(())
}
