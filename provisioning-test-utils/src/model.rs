//! Database model type aliases for test utilities.

/// Type alias for alert rule database model.
pub type AlertRuleModel = entity::alert_rule::Model;

/// Type alias for the latest Alertmanager configuration model.
pub type AlertConfigurationModel = entity::alert_configuration::Model;

/// Type alias for provenance ledger model.
pub type ProvenanceModel = entity::provenance_type::Model;
