//! Service layer.

pub mod provisioning;
