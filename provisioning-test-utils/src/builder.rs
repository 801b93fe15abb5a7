//! Declarative test builder.
//!
//! This module provides the `TestBuilder` API for configuring test environments before execution.
//! Fixtures are queued by the chained `with_*` methods and inserted during the final `build()` call.

use crate::{error::TestError, TestContext};

/// Builder for declarative test initialization.
///
/// The schema is always created from the migration crate; the builder only decides which
/// rows exist before the test body runs.
pub struct TestBuilder {
    // (org_id, namespace_uid, rule_group, uid, interval_seconds)
    rules: Vec<(i64, String, String, String, i64)>,
    // (org_id, record_type, record_key, provenance)
    provenances: Vec<(i64, String, String, String)>,
    // (org_id, configuration)
    alertmanager_configurations: Vec<(i64, String)>,
}

impl TestBuilder {
    /// Create a new TestBuilder with no fixtures queued.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            provenances: Vec::new(),
            alertmanager_configurations: Vec::new(),
        }
    }

    /// Insert a mock alert rule into the database.
    ///
    /// Rules queued for the same group are given consecutive group indexes starting at 1
    /// in the order they were queued. The rule starts at version 1 with a matching
    /// version history row.
    ///
    /// # Arguments
    /// - `org_id` - Organization owning the rule
    /// - `namespace_uid` - Folder the rule group lives in
    /// - `rule_group` - Rule group name
    /// - `uid` - Rule UID
    /// - `interval_seconds` - Evaluation interval of the group
    ///
    /// # Returns
    /// - `Self` - The builder instance for method chaining
    pub fn with_rule(
        mut self,
        org_id: i64,
        namespace_uid: impl Into<String>,
        rule_group: impl Into<String>,
        uid: impl Into<String>,
        interval_seconds: i64,
    ) -> Self {
        self.rules.push((
            org_id,
            namespace_uid.into(),
            rule_group.into(),
            uid.into(),
            interval_seconds,
        ));
        self
    }

    /// Insert a provenance ledger record.
    ///
    /// `record_type` and `provenance` are the raw stored strings (e.g. `"alertRule"`, `"file"`).
    ///
    /// # Returns
    /// - `Self` - The builder instance for method chaining
    pub fn with_provenance(
        mut self,
        org_id: i64,
        record_type: impl Into<String>,
        record_key: impl Into<String>,
        provenance: impl Into<String>,
    ) -> Self {
        self.provenances.push((
            org_id,
            record_type.into(),
            record_key.into(),
            provenance.into(),
        ));
        self
    }

    /// Insert a latest Alertmanager configuration at version 1.
    ///
    /// # Returns
    /// - `Self` - The builder instance for method chaining
    pub fn with_alertmanager_configuration(
        mut self,
        org_id: i64,
        configuration: impl Into<String>,
    ) -> Self {
        self.alertmanager_configurations
            .push((org_id, configuration.into()));
        self
    }

    /// Build the test context.
    ///
    /// Executes all queued operations in the following order:
    /// 1. Connects to an in-memory database and applies all migrations
    /// 2. Inserts rules, then provenance records, then Alertmanager configurations
    ///
    /// # Returns
    /// - `Ok(TestContext)` - Fully configured test environment ready for use
    /// - `Err(TestError::DbErr)` - Migration or fixture insertion failed
    pub async fn build(self) -> Result<TestContext, TestError> {
        let setup = TestContext::new().await?;

        for (org_id, namespace_uid, rule_group, uid, interval_seconds) in self.rules {
            setup
                .rules()
                .insert_mock_rule(org_id, &namespace_uid, &rule_group, &uid, interval_seconds)
                .await?;
        }

        for (org_id, record_type, record_key, provenance) in self.provenances {
            setup
                .provenance()
                .insert_provenance(org_id, &record_type, &record_key, &provenance)
                .await?;
        }

        for (org_id, configuration) in self.alertmanager_configurations {
            setup
                .alertmanager()
                .insert_configuration(org_id, &configuration)
                .await?;
        }

        Ok(setup)
    }
}

impl Default for TestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
