use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "alert_rule_version")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub rule_org_id: i64,
    pub rule_uid: String,
    pub rule_namespace_uid: String,
    pub rule_group: String,
    pub rule_group_idx: i32,
    pub version: i64,
    pub title: String,
    pub interval_seconds: i64,
    #[sea_orm(column_type = "Text")]
    pub data: String,
    pub created: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
