use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::{error::TestError, model::ProvenanceModel, TestContext};

impl TestContext {
    pub fn provenance<'a>(&'a self) -> ProvenanceFixtures<'a> {
        ProvenanceFixtures { setup: self }
    }
}

pub struct ProvenanceFixtures<'a> {
    pub setup: &'a TestContext,
}

impl<'a> ProvenanceFixtures<'a> {
    /// Insert a provenance ledger record using raw stored values.
    ///
    /// # Returns
    /// - `Ok(ProvenanceModel)` - The inserted record
    /// - `Err(TestError::DbErr)` - Insert failed, e.g. the record already exists
    pub async fn insert_provenance(
        &self,
        org_id: i64,
        record_type: &str,
        record_key: &str,
        provenance: &str,
    ) -> Result<ProvenanceModel, TestError> {
        Ok(
            entity::prelude::ProvenanceType::insert(entity::provenance_type::ActiveModel {
                org_id: sea_orm::ActiveValue::Set(org_id),
                record_type: sea_orm::ActiveValue::Set(record_type.to_string()),
                record_key: sea_orm::ActiveValue::Set(record_key.to_string()),
                provenance: sea_orm::ActiveValue::Set(provenance.to_string()),
                ..Default::default()
            })
            .exec_with_returning(&self.setup.db)
            .await?,
        )
    }

    /// Read a provenance record directly, bypassing the store under test.
    pub async fn find_provenance(
        &self,
        org_id: i64,
        record_type: &str,
        record_key: &str,
    ) -> Result<Option<ProvenanceModel>, TestError> {
        Ok(entity::prelude::ProvenanceType::find()
            .filter(entity::provenance_type::Column::OrgId.eq(org_id))
            .filter(entity::provenance_type::Column::RecordType.eq(record_type))
            .filter(entity::provenance_type::Column::RecordKey.eq(record_key))
            .one(&self.setup.db)
            .await?)
    }
}
