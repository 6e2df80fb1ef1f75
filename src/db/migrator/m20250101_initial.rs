use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(VirtualMachines)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Owner filtering backs every non-superuser listing
        manager
            .create_index(
                Index::create()
                    .name("idx_virtual_machines_owner_id")
                    .table(VirtualMachinesTable::Table)
                    .col(VirtualMachinesTable::OwnerId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VirtualMachines).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum VirtualMachinesTable {
    #[sea_orm(iden = "virtual_machines")]
    Table,
    OwnerId,
}
