//! Alertmanager configuration operations.
//!
//! The configuration is a single document per organization, so its provenance is tracked
//! under one fixed resource id.

use crate::{
    data::context::DbContext,
    error::{validation::ValidationError, Error},
    model::{
        alertmanager::{
            AlertmanagerConfigurationVersion, ProvisionedAlertmanagerConfiguration,
            SaveAlertmanagerConfigurationCmd,
        },
        provenance::{ResourceRef, WriteSource},
    },
    service::provisioning::{
        persist::{AmConfigStore, ProvenanceStore, RuleStore, TransactionManager},
        provenance::check_provenance,
        ProvisioningService,
    },
};

impl<R, P, A, T> ProvisioningService<R, P, A, T>
where
    R: RuleStore,
    P: ProvenanceStore,
    A: AmConfigStore,
    T: TransactionManager,
{
    pub async fn get_alertmanager_configuration(
        &self,
        ctx: &DbContext,
        org_id: i64,
    ) -> Result<ProvisionedAlertmanagerConfiguration, Error> {
        self.txn_manager
            .in_transaction(ctx, |ctx| async move {
                let configuration = self
                    .am_store
                    .get_latest_alertmanager_configuration(&ctx, org_id)
                    .await
                    .map_err(|e| e.in_step("read alertmanager configuration"))?;

                let provenance = self
                    .provenance_store
                    .get_provenance(&ctx, &ResourceRef::alertmanager_configuration(), org_id)
                    .await
                    .map_err(|e| e.in_step("read alertmanager configuration provenance"))?;

                Ok(ProvisionedAlertmanagerConfiguration {
                    configuration,
                    provenance,
                })
            })
            .await
    }

    /// Save the configuration with optimistic concurrency, see
    /// [`SaveAlertmanagerConfigurationCmd::expected_version`].
    pub async fn update_alertmanager_configuration(
        &self,
        ctx: &DbContext,
        cmd: SaveAlertmanagerConfigurationCmd,
        source: WriteSource,
    ) -> Result<ProvisionedAlertmanagerConfiguration, Error> {
        if cmd.configuration.trim().is_empty() {
            return Err(ValidationError::MissingField("configuration").into());
        }

        let org_id = cmd.org_id;
        let resource = ResourceRef::alertmanager_configuration();

        let saved = self
            .txn_manager
            .in_transaction(ctx, |ctx| async move {
                let stored = self
                    .provenance_store
                    .get_provenance(&ctx, &resource, org_id)
                    .await
                    .map_err(|e| e.in_step("read alertmanager configuration provenance"))?;
                check_provenance(&resource, stored, source)?;

                let configuration = self
                    .am_store
                    .update_alertmanager_configuration(&ctx, cmd)
                    .await
                    .map_err(|e| e.in_step("save alertmanager configuration"))?;

                self.apply_provenance(&ctx, &resource, org_id, source.provenance)
                    .await
                    .map_err(|e| e.in_step("write alertmanager configuration provenance"))?;

                Ok(ProvisionedAlertmanagerConfiguration {
                    configuration,
                    provenance: source.provenance,
                })
            })
            .await?;

        tracing::info!(
            org_id = %org_id,
            version = %saved.configuration.version,
            provenance = %source.provenance,
            "Saved alertmanager configuration"
        );

        Ok(saved)
    }

    /// Previously saved configurations, newest first.
    pub async fn get_alertmanager_configuration_history(
        &self,
        ctx: &DbContext,
        org_id: i64,
        limit: u64,
    ) -> Result<Vec<AlertmanagerConfigurationVersion>, Error> {
        self.am_store
            .get_alertmanager_configuration_history(ctx, org_id, limit)
            .await
            .map_err(|e| e.in_step("read alertmanager configuration history"))
    }
}
