use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Tasks::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(Tasks::Id).integer().not_null().auto_increment().primary_key()
                )
                .col(ColumnDef::new(Tasks::Country).string().not_null())
                .col(ColumnDef::new(Tasks::SmartLink).string().not_null())
                .col(ColumnDef::new(Tasks::TagName).string().not_null())
                .col(ColumnDef::new(Tasks::RewardCents).big_integer().not_null())
                .col(ColumnDef::new(Tasks::IsActive).boolean().not_null().default(true))
                .col(
                    ColumnDef::new(Tasks::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp())
                )
                .to_owned()
        ).await?;

        // Tasks are always listed per country
        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_tasks_country")
                .table(Tasks::Table)
                .col(Tasks::Country)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Tasks::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Tasks {
    Table,
    Id,
    Country,
    SmartLink,
    TagName,
    RewardCents,
    IsActive,
    CreatedAt,
}
