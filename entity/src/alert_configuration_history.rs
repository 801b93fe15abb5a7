use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "alert_configuration_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub org_id: i64,
    pub version: i64,
    #[sea_orm(column_type = "Text")]
    pub alertmanager_configuration: String,
    pub is_default: bool,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
