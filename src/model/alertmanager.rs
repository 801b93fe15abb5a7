//! Alertmanager configuration domain types.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::model::provenance::Provenance;

/// The latest Alertmanager configuration document of an organization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AlertmanagerConfiguration {
    pub id: i32,
    pub org_id: i64,
    pub configuration: String,
    pub version: i64,
    pub is_default: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<entity::alert_configuration::Model> for AlertmanagerConfiguration {
    fn from(model: entity::alert_configuration::Model) -> Self {
        Self {
            id: model.id,
            org_id: model.org_id,
            configuration: model.alertmanager_configuration,
            version: model.version,
            is_default: model.is_default,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Save request for the latest configuration.
///
/// `expected_version` of `None` creates the first configuration of the org; `Some(v)`
/// replaces the stored document only if it is still at version `v`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveAlertmanagerConfigurationCmd {
    pub org_id: i64,
    pub configuration: String,
    pub is_default: bool,
    pub expected_version: Option<i64>,
}

/// Append-only history entry written on every successful save.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AlertmanagerConfigurationVersion {
    pub org_id: i64,
    pub version: i64,
    pub configuration: String,
    pub is_default: bool,
    pub created_at: NaiveDateTime,
}

impl From<entity::alert_configuration_history::Model> for AlertmanagerConfigurationVersion {
    fn from(model: entity::alert_configuration_history::Model) -> Self {
        Self {
            org_id: model.org_id,
            version: model.version,
            configuration: model.alertmanager_configuration,
            is_default: model.is_default,
            created_at: model.created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProvisionedAlertmanagerConfiguration {
    pub configuration: AlertmanagerConfiguration,
    pub provenance: Provenance,
}
