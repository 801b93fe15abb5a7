use super::*;

/// Expect Provenance::None when no record exists
#[tokio::test]
async fn missing_record_reads_as_none() -> Result<(), TestError> {
    let test = TestBuilder::new().build().await?;
    let ctx = DbContext::from(&test.db);

    let result = DbStore
        .get_provenance(&ctx, &ResourceRef::alert_rule("a"), 1)
        .await;

    assert!(matches!(result, Ok(Provenance::None)));

    Ok(())
}

/// Expect the stored tag, scoped by org and resource type
#[tokio::test]
async fn reads_stored_record() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_provenance(1, "alertRule", "a", "file")
        .with_provenance(2, "alertRule", "a", "api")
        .with_provenance(1, "contactPoint", "a", "external")
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let rule = DbStore
        .get_provenance(&ctx, &ResourceRef::alert_rule("a"), 1)
        .await;
    let contact_point = DbStore
        .get_provenance(&ctx, &ResourceRef::new(ResourceType::ContactPoint, "a"), 1)
        .await;
    let other_org = DbStore
        .get_provenance(&ctx, &ResourceRef::alert_rule("a"), 2)
        .await;

    assert!(matches!(rule, Ok(Provenance::File)));
    assert!(matches!(contact_point, Ok(Provenance::External)));
    assert!(matches!(other_org, Ok(Provenance::Api)));

    Ok(())
}

/// Expect the rule itself to be usable as the resource key
#[tokio::test]
async fn accepts_alert_rule_as_resource() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_provenance(1, "alertRule", "a", "api")
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let rule = mock_rule(1, "ns", "g1", "a", 60);
    let result = DbStore.get_provenance(&ctx, &rule, 1).await;

    assert!(matches!(result, Ok(Provenance::Api)));

    Ok(())
}

/// Expect an error rather than a silent default for an unrecognised stored value
#[tokio::test]
async fn rejects_unknown_stored_value() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_provenance(1, "alertRule", "a", "terraform")
        .build()
        .await?;
    let ctx = DbContext::from(&test.db);

    let result = DbStore
        .get_provenance(&ctx, &ResourceRef::alert_rule("a"), 1)
        .await;

    assert!(matches!(
        &result,
        Err(Error::Validation(ValidationError::UnknownProvenance(value))) if value == "terraform"
    ));

    Ok(())
}
