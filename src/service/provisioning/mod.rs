//! Provisioning service.
//!
//! Composes the rule, provenance and Alertmanager configuration stores. Every public
//! operation runs as one unit of work through the [`TransactionManager`] and enforces the
//! provenance policy in [`provenance`] before writing. Store failures are wrapped with the
//! name of the failing step.

pub mod alert_rule;
pub mod alertmanager;
pub mod persist;
pub mod provenance;
pub mod rule_group;


use crate::{
    data::{transaction::DbTransactionManager, DbStore},
    error::{validation::ValidationError, Error},
    service::provisioning::persist::{AmConfigStore, ProvenanceStore, RuleStore, TransactionManager},
};

/// Provisioning service over the database-backed stores.
pub type DbProvisioningService =
    ProvisioningService<DbStore, DbStore, DbStore, DbTransactionManager>;

pub struct ProvisioningService<R, P, A, T> {
    rule_store: R,
    provenance_store: P,
    am_store: A,
    txn_manager: T,
    base_interval_seconds: i64,
}

impl<R, P, A, T> ProvisioningService<R, P, A, T>
where
    R: RuleStore,
    P: ProvenanceStore,
    A: AmConfigStore,
    T: TransactionManager,
{
    /// Creates a new provisioning service.
    ///
    /// # Arguments
    /// - `base_interval_seconds` - Rule group intervals must be positive multiples of this
    pub fn new(
        rule_store: R,
        provenance_store: P,
        am_store: A,
        txn_manager: T,
        base_interval_seconds: i64,
    ) -> Self {
        Self {
            rule_store,
            provenance_store,
            am_store,
            txn_manager,
            base_interval_seconds,
        }
    }

    fn validate_interval(&self, interval_seconds: i64) -> Result<(), Error> {
        if interval_seconds <= 0 || interval_seconds % self.base_interval_seconds != 0 {
            return Err(ValidationError::InvalidInterval {
                interval: interval_seconds,
                base: self.base_interval_seconds,
            }
            .into());
        }

        Ok(())
    }
}
