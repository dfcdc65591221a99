use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(CompletedTasks::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(CompletedTasks::Id)
                        .integer()
                        .not_null()
                        .auto_increment()
                        .primary_key()
                )
                .col(ColumnDef::new(CompletedTasks::UserId).integer().not_null())
                .col(ColumnDef::new(CompletedTasks::TaskId).integer().not_null())
                .col(ColumnDef::new(CompletedTasks::RewardCents).big_integer().not_null())
                .col(ColumnDef::new(CompletedTasks::TransactionId).string().null())
                .col(
                    ColumnDef::new(CompletedTasks::CompletedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp())
                )
                .to_owned()
        ).await?;

        // A user completes a task at most once. Postback deduplication relies on
        // this index rejecting the second insert.
        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("unq_user_task")
                .table(CompletedTasks::Table)
                .col(CompletedTasks::UserId)
                .col(CompletedTasks::TaskId)
                .unique()
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(CompletedTasks::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum CompletedTasks {
    Table,
    Id,
    UserId,
    TaskId,
    RewardCents,
    TransactionId,
    CompletedAt,
}
