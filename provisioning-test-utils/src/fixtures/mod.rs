//! Test fixture modules for database record creation.
//!
//! - `rule` - alert rule rows and their version history
//! - `provenance` - provenance ledger rows
//! - `alertmanager` - latest Alertmanager configuration rows

pub mod alertmanager;
pub mod provenance;
pub mod rule;
