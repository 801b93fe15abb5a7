//! Provenance policy and direct provenance operations.

use crate::{
    data::context::DbContext,
    error::{conflict::ConflictError, Error},
    model::provenance::{Provenance, Provisionable, ResourceRef, WriteSource},
    service::provisioning::{
        persist::{AmConfigStore, ProvenanceStore, RuleStore, TransactionManager},
        ProvisioningService,
    },
};

/// Whether a write from `incoming` may replace a resource last written by `stored`.
///
/// Unmanaged resources may be claimed by anyone, a source may always edit its own
/// resources, and API-provisioned resources remain editable from the UI.
pub fn can_update_provenance(stored: Provenance, incoming: Provenance) -> bool {
    stored == incoming
        || stored == Provenance::None
        || (stored == Provenance::Api && incoming == Provenance::None)
}

/// Reject the write unless the policy allows it or the caller overrides it.
pub(crate) fn check_provenance(
    resource: &dyn Provisionable,
    stored: Provenance,
    source: WriteSource,
) -> Result<(), Error> {
    if can_update_provenance(stored, source.provenance) {
        return Ok(());
    }

    if source.override_provenance {
        tracing::info!(
            resource_type = %resource.resource_type(),
            resource_id = %resource.resource_id(),
            stored = %stored,
            incoming = %source.provenance,
            "Overriding provenance"
        );

        return Ok(());
    }

    tracing::warn!(
        resource_type = %resource.resource_type(),
        resource_id = %resource.resource_id(),
        stored = %stored,
        incoming = %source.provenance,
        "Rejected write with incompatible provenance"
    );

    Err(ConflictError::ProvenanceMismatch {
        resource_type: resource.resource_type(),
        id: resource.resource_id(),
        stored,
        incoming: source.provenance,
    }
    .into())
}

impl<R, P, A, T> ProvisioningService<R, P, A, T>
where
    R: RuleStore,
    P: ProvenanceStore,
    A: AmConfigStore,
    T: TransactionManager,
{
    /// Record `provenance` as the origin of the last write to `resource`.
    ///
    /// Interactive writes remove the record instead of storing an empty tag.
    pub(super) async fn apply_provenance(
        &self,
        ctx: &DbContext,
        resource: &dyn Provisionable,
        org_id: i64,
        provenance: Provenance,
    ) -> Result<(), Error> {
        match provenance {
            Provenance::None => {
                self.provenance_store
                    .delete_provenance(ctx, resource, org_id)
                    .await
            }
            provenance => {
                self.provenance_store
                    .set_provenance(ctx, resource, org_id, provenance)
                    .await
            }
        }
    }

    pub async fn get_provenance(
        &self,
        ctx: &DbContext,
        org_id: i64,
        resource: &ResourceRef,
    ) -> Result<Provenance, Error> {
        self.provenance_store
            .get_provenance(ctx, resource, org_id)
            .await
            .map_err(|e| e.in_step("read provenance"))
    }

    /// Set the provenance of a resource owned by another subsystem, subject to the
    /// provenance policy.
    pub async fn set_provenance(
        &self,
        ctx: &DbContext,
        org_id: i64,
        resource: &ResourceRef,
        source: WriteSource,
    ) -> Result<(), Error> {
        self.txn_manager
            .in_transaction(ctx, |ctx| async move {
                let stored = self
                    .provenance_store
                    .get_provenance(&ctx, resource, org_id)
                    .await
                    .map_err(|e| e.in_step("read provenance"))?;

                check_provenance(resource, stored, source)?;

                self.apply_provenance(&ctx, resource, org_id, source.provenance)
                    .await
                    .map_err(|e| e.in_step("write provenance"))
            })
            .await?;

        tracing::info!(
            org_id = %org_id,
            resource_type = %resource.resource_type,
            resource_id = %resource.id,
            provenance = %source.provenance,
            "Set provenance"
        );

        Ok(())
    }

    /// Forget the provenance of a resource so anyone may edit it. Idempotent.
    pub async fn reset_provenance(
        &self,
        ctx: &DbContext,
        org_id: i64,
        resource: &ResourceRef,
    ) -> Result<(), Error> {
        self.txn_manager
            .in_transaction(ctx, |ctx| async move {
                self.provenance_store
                    .delete_provenance(&ctx, resource, org_id)
                    .await
                    .map_err(|e| e.in_step("delete provenance"))
            })
            .await?;

        tracing::info!(
            org_id = %org_id,
            resource_type = %resource.resource_type,
            resource_id = %resource.id,
            "Reset provenance"
        );

        Ok(())
    }
}
