//! Provenance ledger repository and store.
//!
//! Records are keyed by `(record_type, record_key, org_id)`. Writes are unconditional
//! upserts; compatibility between the stored and incoming provenance is decided by the
//! provisioning service before it calls in here.

use std::collections::HashMap;

use async_trait::async_trait;
use migration::OnConflict;
use sea_orm::{
    ActiveValue, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect,
};

use crate::{
    data::{
        context::{with_connection, DbContext},
        DbStore,
    },
    error::Error,
    model::provenance::{Provenance, Provisionable, ResourceType},
    service::provisioning::persist::ProvenanceStore,
};

pub struct ProvenanceRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> ProvenanceRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn find(
        &self,
        org_id: i64,
        record_type: &str,
        record_key: &str,
    ) -> Result<Option<String>, DbErr> {
        entity::prelude::ProvenanceType::find()
            .select_only()
            .column(entity::provenance_type::Column::Provenance)
            .filter(entity::provenance_type::Column::OrgId.eq(org_id))
            .filter(entity::provenance_type::Column::RecordType.eq(record_type))
            .filter(entity::provenance_type::Column::RecordKey.eq(record_key))
            .into_tuple::<String>()
            .one(self.db)
            .await
    }

    /// All `(record_key, provenance)` pairs of one record type in an org.
    pub async fn find_all(
        &self,
        org_id: i64,
        record_type: &str,
    ) -> Result<Vec<(String, String)>, DbErr> {
        entity::prelude::ProvenanceType::find()
            .select_only()
            .column(entity::provenance_type::Column::RecordKey)
            .column(entity::provenance_type::Column::Provenance)
            .filter(entity::provenance_type::Column::OrgId.eq(org_id))
            .filter(entity::provenance_type::Column::RecordType.eq(record_type))
            .into_tuple::<(String, String)>()
            .all(self.db)
            .await
    }

    pub async fn upsert(
        &self,
        org_id: i64,
        record_type: &str,
        record_key: &str,
        provenance: &str,
    ) -> Result<(), DbErr> {
        entity::prelude::ProvenanceType::insert(entity::provenance_type::ActiveModel {
            org_id: ActiveValue::Set(org_id),
            record_type: ActiveValue::Set(record_type.to_string()),
            record_key: ActiveValue::Set(record_key.to_string()),
            provenance: ActiveValue::Set(provenance.to_string()),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([
                entity::provenance_type::Column::RecordType,
                entity::provenance_type::Column::RecordKey,
                entity::provenance_type::Column::OrgId,
            ])
            .update_column(entity::provenance_type::Column::Provenance)
            .to_owned(),
        )
        .exec(self.db)
        .await?;

        Ok(())
    }

    pub async fn delete(
        &self,
        org_id: i64,
        record_type: &str,
        record_key: &str,
    ) -> Result<u64, DbErr> {
        let result = entity::prelude::ProvenanceType::delete_many()
            .filter(entity::provenance_type::Column::OrgId.eq(org_id))
            .filter(entity::provenance_type::Column::RecordType.eq(record_type))
            .filter(entity::provenance_type::Column::RecordKey.eq(record_key))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

#[async_trait]
impl ProvenanceStore for DbStore {
    async fn get_provenance(
        &self,
        ctx: &DbContext,
        resource: &dyn Provisionable,
        org_id: i64,
    ) -> Result<Provenance, Error> {
        let record_type = resource.resource_type();
        let record_key = resource.resource_id();

        let stored = with_connection!(ctx, |db| {
            ProvenanceRepository::new(db)
                .find(org_id, record_type.as_str(), &record_key)
                .await
        })?;

        match stored {
            Some(value) => Ok(value.parse()?),
            None => Ok(Provenance::None),
        }
    }

    async fn get_provenances(
        &self,
        ctx: &DbContext,
        org_id: i64,
        resource_type: ResourceType,
    ) -> Result<HashMap<String, Provenance>, Error> {
        let records = with_connection!(ctx, |db| {
            ProvenanceRepository::new(db)
                .find_all(org_id, resource_type.as_str())
                .await
        })?;

        let mut provenances = HashMap::with_capacity(records.len());
        for (record_key, value) in records {
            provenances.insert(record_key, value.parse()?);
        }

        Ok(provenances)
    }

    async fn set_provenance(
        &self,
        ctx: &DbContext,
        resource: &dyn Provisionable,
        org_id: i64,
        provenance: Provenance,
    ) -> Result<(), Error> {
        let record_type = resource.resource_type();
        let record_key = resource.resource_id();

        with_connection!(ctx, |db| {
            ProvenanceRepository::new(db)
                .upsert(org_id, record_type.as_str(), &record_key, provenance.as_str())
                .await
        })?;

        tracing::debug!(
            org_id = %org_id,
            record_type = %record_type,
            record_key = %record_key,
            provenance = %provenance,
            "Set provenance"
        );

        Ok(())
    }

    async fn delete_provenance(
        &self,
        ctx: &DbContext,
        resource: &dyn Provisionable,
        org_id: i64,
    ) -> Result<(), Error> {
        let record_type = resource.resource_type();
        let record_key = resource.resource_id();

        with_connection!(ctx, |db| {
            ProvenanceRepository::new(db)
                .delete(org_id, record_type.as_str(), &record_key)
                .await
        })?;

        Ok(())
    }
}
