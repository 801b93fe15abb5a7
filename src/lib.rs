//! Provenance-aware persistence for alert rules, rule groups and Alertmanager configuration.
//!
//! The [`ProvisioningService`](service::provisioning::ProvisioningService) is the entry
//! point. It runs each operation as one transaction over the rule, provenance and
//! Alertmanager configuration stores and enforces which provisioning source may edit which
//! object.

pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod service;
pub mod startup;
pub mod util;
