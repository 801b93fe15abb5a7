//! Provenance ledger types.
//!
//! A provenance tag records which kind of actor last wrote a provisionable resource. The
//! ledger keys every record by `(resource type, resource id, org)` so resources whose rows
//! live in other subsystems can be tracked the same way as alert rules.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::validation::ValidationError;

/// Origin of the last write to a provisionable resource.
///
/// Absence of a ledger record is equivalent to [`Provenance::None`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Interactive edits through the UI; stored as the empty string.
    #[default]
    #[serde(rename = "")]
    None,
    /// Provisioning HTTP API.
    Api,
    /// File-based provisioning.
    File,
    /// External synchronisation.
    External,
}

impl Provenance {
    /// Value persisted in the `provenance` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Api => "api",
            Self::File => "file",
            Self::External => "external",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl FromStr for Provenance {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Self::None),
            "api" => Ok(Self::Api),
            "file" => Ok(Self::File),
            "external" => Ok(Self::External),
            other => Err(ValidationError::UnknownProvenance(other.to_string())),
        }
    }
}

/// Kind of resource a provenance record refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceType {
    AlertRule,
    ContactPoint,
    NotificationPolicy,
    MuteTiming,
    Template,
    AlertmanagerConfig,
}

impl ResourceType {
    /// Value persisted in the `record_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlertRule => "alertRule",
            Self::ContactPoint => "contactPoint",
            Self::NotificationPolicy => "notificationPolicy",
            Self::MuteTiming => "muteTiming",
            Self::Template => "template",
            Self::AlertmanagerConfig => "alertmanagerConfig",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alertRule" => Ok(Self::AlertRule),
            "contactPoint" => Ok(Self::ContactPoint),
            "notificationPolicy" => Ok(Self::NotificationPolicy),
            "muteTiming" => Ok(Self::MuteTiming),
            "template" => Ok(Self::Template),
            "alertmanagerConfig" => Ok(Self::AlertmanagerConfig),
            other => Err(ValidationError::UnknownResourceType(other.to_string())),
        }
    }
}

/// Anything that can carry a provenance record.
pub trait Provisionable: Send + Sync {
    fn resource_type(&self) -> ResourceType;
    fn resource_id(&self) -> String;
}

/// Free-standing reference to a provisionable resource.
///
/// Used for resources owned by other subsystems (contact points, policies, templates)
/// where only the identifier is known here.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    pub resource_type: ResourceType,
    pub id: String,
}

impl ResourceRef {
    /// Identifier used for the single per-org Alertmanager configuration document.
    pub const ALERTMANAGER_CONFIGURATION_ID: &'static str = "alertmanager";

    pub fn new(resource_type: ResourceType, id: impl Into<String>) -> Self {
        Self {
            resource_type,
            id: id.into(),
        }
    }

    pub fn alert_rule(uid: impl Into<String>) -> Self {
        Self::new(ResourceType::AlertRule, uid)
    }

    pub fn alertmanager_configuration() -> Self {
        Self::new(
            ResourceType::AlertmanagerConfig,
            Self::ALERTMANAGER_CONFIGURATION_ID,
        )
    }
}

impl Provisionable for ResourceRef {
    fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    fn resource_id(&self) -> String {
        self.id.clone()
    }
}

/// Who is performing a write and whether they may overwrite a foreign provenance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteSource {
    pub provenance: Provenance,
    pub override_provenance: bool,
}

impl WriteSource {
    pub fn new(provenance: Provenance) -> Self {
        Self {
            provenance,
            override_provenance: false,
        }
    }

    /// Interactive UI edit without override.
    pub fn ui() -> Self {
        Self::new(Provenance::None)
    }

    pub fn with_override(mut self) -> Self {
        self.override_provenance = true;
        self
    }
}
