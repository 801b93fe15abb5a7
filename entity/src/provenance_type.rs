use sea_orm::entity::prelude::*;

/// One provenance ledger entry. `record_type` and `record_key` identify the tracked
/// resource, which lives in another table (or another subsystem entirely).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "provenance_type")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub org_id: i64,
    pub record_key: String,
    pub record_type: String,
    pub provenance: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
