pub use super::alert_configuration::Entity as AlertConfiguration;
pub use super::alert_configuration_history::Entity as AlertConfigurationHistory;
pub use super::alert_rule::Entity as AlertRule;
pub use super::alert_rule_version::Entity as AlertRuleVersion;
pub use super::provenance_type::Entity as ProvenanceType;
