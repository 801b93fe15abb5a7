use sea_orm_migration::{prelude::*, schema::*};

static IDX_PROVENANCE_TYPE_RECORD_TYPE_RECORD_KEY_ORG_ID: &str =
    "idx-provenance_type-record_type-record_key-org_id";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProvenanceType::Table)
                    .if_not_exists()
                    .col(pk_auto(ProvenanceType::Id))
                    .col(big_integer(ProvenanceType::OrgId))
                    .col(string(ProvenanceType::RecordKey))
                    .col(string(ProvenanceType::RecordType))
                    .col(string(ProvenanceType::Provenance))
                    .to_owned(),
            )
            .await?;

        // Upserts in the provenance store conflict on this key
        manager
            .create_index(
                Index::create()
                    .name(IDX_PROVENANCE_TYPE_RECORD_TYPE_RECORD_KEY_ORG_ID)
                    .table(ProvenanceType::Table)
                    .col(ProvenanceType::RecordType)
                    .col(ProvenanceType::RecordKey)
                    .col(ProvenanceType::OrgId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_PROVENANCE_TYPE_RECORD_TYPE_RECORD_KEY_ORG_ID)
                    .table(ProvenanceType::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(ProvenanceType::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum ProvenanceType {
    Table,
    Id,
    OrgId,
    RecordKey,
    RecordType,
    Provenance,
}
