//! Domain types shared by the stores and the provisioning service.

pub mod alert_rule;
pub mod alertmanager;
pub mod api;
pub mod provenance;
