//! Alertmanager configuration saves through the provisioning service.

use alert_provisioning::model::{
    alertmanager::SaveAlertmanagerConfigurationCmd,
    provenance::{Provenance, WriteSource},
};

use super::*;

fn save(
    configuration: &str,
    expected_version: Option<i64>,
) -> SaveAlertmanagerConfigurationCmd {
    SaveAlertmanagerConfigurationCmd {
        org_id: 1,
        configuration: configuration.to_string(),
        is_default: false,
        expected_version,
    }
}

/// Tests concurrent saves starting from the same read version.
///
/// Expected: exactly one save succeeds and the other fails with Conflict
#[tokio::test]
async fn concurrent_saves_from_same_version() -> Result<(), TestError> {
    let test = TestBuilder::new().build().await?;
    let ctx = DbContext::from(&test.db);
    let service = service();
    let source = WriteSource::new(Provenance::Api);

    let initial = service
        .update_alertmanager_configuration(&ctx, save("route: {}", None), source)
        .await
        .unwrap();
    let read_version = initial.configuration.version;

    let (first, second) = tokio::join!(
        service.update_alertmanager_configuration(
            &ctx,
            save("route: {receiver: a}", Some(read_version)),
            source
        ),
        service.update_alertmanager_configuration(
            &ctx,
            save("route: {receiver: b}", Some(read_version)),
            source
        ),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|outcome| matches!(outcome, Err(err) if err.is_conflict()))
            .count(),
        1
    );

    let history = service
        .get_alertmanager_configuration_history(&ctx, 1, 10)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);

    Ok(())
}
