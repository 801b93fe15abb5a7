pub mod prelude;

pub mod alert_configuration;
pub mod alert_configuration_history;
pub mod alert_rule;
pub mod alert_rule_version;
pub mod provenance_type;
