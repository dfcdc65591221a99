use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Announcements::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(Announcements::Id)
                        .integer()
                        .not_null()
                        .auto_increment()
                        .primary_key()
                )
                .col(ColumnDef::new(Announcements::Content).text().not_null())
                .col(ColumnDef::new(Announcements::Country).string().null()) // null = global
                .col(ColumnDef::new(Announcements::IsActive).boolean().not_null().default(true))
                .col(
                    ColumnDef::new(Announcements::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp())
                )
                .to_owned()
        ).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Announcements::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Announcements {
    Table,
    Id,
    Content,
    Country,
    IsActive,
    CreatedAt,
}
