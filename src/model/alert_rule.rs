//! Alert rule domain types.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::provenance::{Provenance, Provisionable, ResourceType};

/// A single alert rule row.
///
/// `body` is opaque to storage (queries, thresholds, labels, annotations) and is persisted
/// as JSON text. `id` and `version` are assigned by the rule store; values supplied by
/// callers on insert are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: i32,
    pub org_id: i64,
    pub uid: String,
    pub namespace_uid: String,
    pub rule_group: String,
    pub rule_group_index: i32,
    pub title: String,
    pub interval_seconds: i64,
    pub version: i64,
    pub updated: NaiveDateTime,
    pub body: Value,
}

impl AlertRule {
    pub fn group_key(&self) -> RuleGroupKey {
        RuleGroupKey::new(self.org_id, &self.namespace_uid, &self.rule_group)
    }

    /// True when every user-editable attribute matches, ignoring storage bookkeeping
    /// (`id`, `version`, `updated`).
    pub fn has_same_definition(&self, other: &AlertRule) -> bool {
        self.org_id == other.org_id
            && self.uid == other.uid
            && self.namespace_uid == other.namespace_uid
            && self.rule_group == other.rule_group
            && self.rule_group_index == other.rule_group_index
            && self.title == other.title
            && self.interval_seconds == other.interval_seconds
            && self.body == other.body
    }
}

impl Provisionable for AlertRule {
    fn resource_type(&self) -> ResourceType {
        ResourceType::AlertRule
    }

    fn resource_id(&self) -> String {
        self.uid.clone()
    }
}

impl TryFrom<entity::alert_rule::Model> for AlertRule {
    type Error = serde_json::Error;

    fn try_from(model: entity::alert_rule::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            body: serde_json::from_str(&model.data)?,
            id: model.id,
            org_id: model.org_id,
            uid: model.uid,
            namespace_uid: model.namespace_uid,
            rule_group: model.rule_group,
            rule_group_index: model.rule_group_idx,
            title: model.title,
            interval_seconds: model.interval_seconds,
            version: model.version,
            updated: model.updated,
        })
    }
}

/// Identity of a rule group. Groups are never stored; they are the set of rules sharing
/// this key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleGroupKey {
    pub org_id: i64,
    pub namespace_uid: String,
    pub rule_group: String,
}

impl RuleGroupKey {
    pub fn new(org_id: i64, namespace_uid: &str, rule_group: &str) -> Self {
        Self {
            org_id,
            namespace_uid: namespace_uid.to_string(),
            rule_group: rule_group.to_string(),
        }
    }
}

impl fmt::Display for RuleGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} (org {})",
            self.namespace_uid, self.rule_group, self.org_id
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetAlertRuleByUidQuery {
    pub org_id: i64,
    pub uid: String,
}

/// Filter for listing rules of one organization. Empty vectors and `None` mean
/// "no restriction".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListAlertRulesQuery {
    pub org_id: i64,
    pub namespace_uids: Vec<String>,
    pub rule_group: Option<String>,
    pub rule_uids: Vec<String>,
}

impl ListAlertRulesQuery {
    pub fn for_org(org_id: i64) -> Self {
        Self {
            org_id,
            ..Default::default()
        }
    }

    pub fn for_group(org_id: i64, namespace_uid: &str, rule_group: &str) -> Self {
        Self {
            org_id,
            namespace_uids: vec![namespace_uid.to_string()],
            rule_group: Some(rule_group.to_string()),
            rule_uids: Vec::new(),
        }
    }

    pub fn for_uids(org_id: i64, rule_uids: Vec<String>) -> Self {
        Self {
            org_id,
            rule_uids,
            ..Default::default()
        }
    }
}

/// Replacement of a stored rule. `existing.version` is the version the caller read and
/// acts as the optimistic lock.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateRule {
    pub existing: AlertRule,
    pub new: AlertRule,
}

/// Immutable snapshot of a rule taken on every insert and update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertRuleVersion {
    pub rule_org_id: i64,
    pub rule_uid: String,
    pub namespace_uid: String,
    pub rule_group: String,
    pub rule_group_index: i32,
    pub version: i64,
    pub title: String,
    pub interval_seconds: i64,
    pub body: Value,
    pub created: NaiveDateTime,
}

impl TryFrom<entity::alert_rule_version::Model> for AlertRuleVersion {
    type Error = serde_json::Error;

    fn try_from(model: entity::alert_rule_version::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            body: serde_json::from_str(&model.data)?,
            rule_org_id: model.rule_org_id,
            rule_uid: model.rule_uid,
            namespace_uid: model.rule_namespace_uid,
            rule_group: model.rule_group,
            rule_group_index: model.rule_group_idx,
            version: model.version,
            title: model.title,
            interval_seconds: model.interval_seconds,
            created: model.created,
        })
    }
}

/// Desired state of a rule group as submitted by a provisioning actor.
///
/// Rules without a UID are created; rules whose UID already exists in the org are updated
/// (and moved into this group if they live elsewhere).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AlertRuleGroup {
    pub title: String,
    pub namespace_uid: String,
    pub interval_seconds: i64,
    pub rules: Vec<AlertRule>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProvisionedAlertRule {
    pub rule: AlertRule,
    pub provenance: Provenance,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProvisionedRuleGroup {
    pub title: String,
    pub namespace_uid: String,
    pub interval_seconds: i64,
    pub rules: Vec<ProvisionedAlertRule>,
}

/// UIDs touched by a rule group replacement, each list sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RuleGroupChanges {
    pub inserted: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
}

impl RuleGroupChanges {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}
