//! Storage seams of the provisioning service.
//!
//! The service depends only on these traits. [`DbStore`](crate::data::DbStore) implements
//! the three stores and [`DbTransactionManager`](crate::data::transaction::DbTransactionManager)
//! the transaction manager; tests substitute wrappers to inject failures.

use std::{collections::HashMap, future::Future};

use async_trait::async_trait;

use crate::{
    data::context::DbContext,
    error::Error,
    model::{
        alert_rule::{
            AlertRule, AlertRuleVersion, GetAlertRuleByUidQuery, ListAlertRulesQuery, UpdateRule,
        },
        alertmanager::{
            AlertmanagerConfiguration, AlertmanagerConfigurationVersion,
            SaveAlertmanagerConfigurationCmd,
        },
        provenance::{Provenance, Provisionable, ResourceType},
    },
};

/// Issues units of work that either fully commit or fully roll back.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// Run `work` with a transaction-scoped context. Contexts that already carry a
    /// transaction are joined rather than nested.
    async fn in_transaction<T, F, Fut>(&self, ctx: &DbContext, work: F) -> Result<T, Error>
    where
        T: Send,
        F: FnOnce(DbContext) -> Fut + Send,
        Fut: Future<Output = Result<T, Error>> + Send;
}

/// Persistence of alert rules. Groups are addressed by `(org, namespace, group name)`.
#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn get_alert_rule_by_uid(
        &self,
        ctx: &DbContext,
        query: &GetAlertRuleByUidQuery,
    ) -> Result<AlertRule, Error>;

    async fn list_alert_rules(
        &self,
        ctx: &DbContext,
        query: &ListAlertRulesQuery,
    ) -> Result<Vec<AlertRule>, Error>;

    async fn get_rule_group_interval(
        &self,
        ctx: &DbContext,
        org_id: i64,
        namespace_uid: &str,
        rule_group: &str,
    ) -> Result<i64, Error>;

    /// Returns the row id assigned to every inserted UID, including generated ones.
    async fn insert_alert_rules(
        &self,
        ctx: &DbContext,
        rules: Vec<AlertRule>,
    ) -> Result<HashMap<String, i32>, Error>;

    async fn update_rule_group(
        &self,
        ctx: &DbContext,
        org_id: i64,
        namespace_uid: &str,
        rule_group: &str,
        interval_seconds: i64,
    ) -> Result<(), Error>;

    async fn update_alert_rules(&self, ctx: &DbContext, updates: Vec<UpdateRule>)
        -> Result<(), Error>;

    async fn delete_alert_rules_by_uid(
        &self,
        ctx: &DbContext,
        org_id: i64,
        uids: &[String],
    ) -> Result<(), Error>;

    async fn get_alert_rule_versions(
        &self,
        ctx: &DbContext,
        org_id: i64,
        uid: &str,
    ) -> Result<Vec<AlertRuleVersion>, Error>;
}

/// Side ledger of provenance records for arbitrary resources.
#[async_trait]
pub trait ProvenanceStore: Send + Sync {
    async fn get_provenance(
        &self,
        ctx: &DbContext,
        resource: &dyn Provisionable,
        org_id: i64,
    ) -> Result<Provenance, Error>;

    async fn get_provenances(
        &self,
        ctx: &DbContext,
        org_id: i64,
        resource_type: ResourceType,
    ) -> Result<HashMap<String, Provenance>, Error>;

    async fn set_provenance(
        &self,
        ctx: &DbContext,
        resource: &dyn Provisionable,
        org_id: i64,
        provenance: Provenance,
    ) -> Result<(), Error>;

    async fn delete_provenance(
        &self,
        ctx: &DbContext,
        resource: &dyn Provisionable,
        org_id: i64,
    ) -> Result<(), Error>;
}

/// Latest Alertmanager configuration per organization, with optimistic updates.
#[async_trait]
pub trait AmConfigStore: Send + Sync {
    async fn get_latest_alertmanager_configuration(
        &self,
        ctx: &DbContext,
        org_id: i64,
    ) -> Result<AlertmanagerConfiguration, Error>;

    async fn update_alertmanager_configuration(
        &self,
        ctx: &DbContext,
        cmd: SaveAlertmanagerConfigurationCmd,
    ) -> Result<AlertmanagerConfiguration, Error>;

    async fn get_alertmanager_configuration_history(
        &self,
        ctx: &DbContext,
        org_id: i64,
        limit: u64,
    ) -> Result<Vec<AlertmanagerConfigurationVersion>, Error>;
}
