//! Tests for `DbContext::in_transaction`.
//!
//! This module verifies commit on success, rollback on failure, joining of nested units of
//! work and detection of transaction handles that outlive their unit of work.

use super::*;

/// Tests a unit of work that succeeds.
///
/// Expected: Ok and the write visible afterwards
#[tokio::test]
async fn commits_on_success() -> Result<(), TestError> {
    let test = TestBuilder::new().build().await?;
    let ctx = DbContext::from(&test.db);

    let result = ctx
        .in_transaction(|ctx| async move {
            assert!(ctx.is_transaction());
            DbStore
                .insert_alert_rules(&ctx, vec![mock_rule(1, "ns", "g1", "a", 60)])
                .await
        })
        .await;

    assert!(result.is_ok(), "Error: {:?}", result);
    assert!(test.rules().find_rule(1, "a").await?.is_some());

    Ok(())
}

/// Tests a unit of work that fails after writing.
///
/// Verifies the write is discarded and the caller receives the work's own error.
///
/// Expected: Err(NotFound) and no rule stored
#[tokio::test]
async fn rolls_back_and_returns_original_error() -> Result<(), TestError> {
    let test = TestBuilder::new().build().await?;
    let ctx = DbContext::from(&test.db);

    let result: Result<(), Error> = ctx
        .in_transaction(|ctx| async move {
            DbStore
                .insert_alert_rules(&ctx, vec![mock_rule(1, "ns", "g1", "a", 60)])
                .await?;

            Err(Error::not_found("rule group", "ns/g2"))
        })
        .await;

    assert!(matches!(&result, Err(err) if err.is_not_found()));
    assert_eq!(test.rules().count_rules().await?, 0);

    Ok(())
}

/// Tests a nested unit of work on a transaction context.
///
/// Verifies the inner call joins the outer transaction, so an outer failure also
/// discards the inner write.
///
/// Expected: Err and neither write stored
#[tokio::test]
async fn nested_work_joins_outer_transaction() -> Result<(), TestError> {
    let test = TestBuilder::new().build().await?;
    let ctx = DbContext::from(&test.db);

    let result: Result<(), Error> = ctx
        .in_transaction(|outer| async move {
            DbStore
                .insert_alert_rules(&outer, vec![mock_rule(1, "ns", "g1", "a", 60)])
                .await?;

            outer
                .in_transaction(|inner| async move {
                    DbStore
                        .insert_alert_rules(&inner, vec![mock_rule(1, "ns", "g1", "b", 60)])
                        .await
                })
                .await?;

            Err(Error::InternalError("abort".to_string()))
        })
        .await;

    assert!(result.is_err());
    assert_eq!(test.rules().count_rules().await?, 0);

    Ok(())
}

/// Tests work that smuggles its transaction context out.
///
/// Expected: Err(InternalError) and nothing committed
#[tokio::test]
#[tracing_test::traced_test]
async fn rejects_retained_transaction_handle() -> Result<(), TestError> {
    let test = TestBuilder::new().build().await?;
    let ctx = DbContext::from(&test.db);

    let result = ctx
        .in_transaction(|ctx| async move {
            DbStore
                .insert_alert_rules(&ctx, vec![mock_rule(1, "ns", "g1", "a", 60)])
                .await?;

            Ok(ctx.clone())
        })
        .await;

    assert!(matches!(result, Err(Error::InternalError(_))));
    assert!(logs_contain("Transaction handle retained past its unit of work"));
    assert_eq!(test.rules().count_rules().await?, 0);

    Ok(())
}
