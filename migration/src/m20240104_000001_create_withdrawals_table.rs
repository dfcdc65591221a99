use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Withdrawals::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(Withdrawals::Id)
                        .integer()
                        .not_null()
                        .auto_increment()
                        .primary_key()
                )
                .col(ColumnDef::new(Withdrawals::UserId).integer().not_null())
                .col(ColumnDef::new(Withdrawals::AmountCents).big_integer().not_null())
                .col(
                    ColumnDef::new(Withdrawals::FromTaskCents).big_integer().not_null().default(0)
                )
                .col(
                    ColumnDef::new(Withdrawals::FromReferralCents)
                        .big_integer()
                        .not_null()
                        .default(0)
                )
                .col(ColumnDef::new(Withdrawals::WalletAddress).string().not_null())
                .col(ColumnDef::new(Withdrawals::Network).string().not_null())
                .col(ColumnDef::new(Withdrawals::Status).string().not_null().default("pending"))
                .col(
                    ColumnDef::new(Withdrawals::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp())
                )
                .col(ColumnDef::new(Withdrawals::ReviewedAt).timestamp_with_time_zone().null())
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_withdrawals_user_id")
                .table(Withdrawals::Table)
                .col(Withdrawals::UserId)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Withdrawals::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Withdrawals {
    Table,
    Id,
    UserId,
    AmountCents,
    FromTaskCents,
    FromReferralCents,
    WalletAddress,
    Network,
    Status,
    CreatedAt,
    ReviewedAt,
}
