use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Referrals::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(Referrals::Id)
                        .integer()
                        .not_null()
                        .auto_increment()
                        .primary_key()
                )
                .col(ColumnDef::new(Referrals::ReferrerId).integer().not_null())
                .col(ColumnDef::new(Referrals::ReferredUserId).integer().not_null().unique_key())
                .col(ColumnDef::new(Referrals::Country).string().not_null())
                .col(ColumnDef::new(Referrals::RewardCents).big_integer().not_null().default(0))
                .col(ColumnDef::new(Referrals::Status).string().not_null().default("pending"))
                .col(
                    ColumnDef::new(Referrals::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp())
                )
                .col(ColumnDef::new(Referrals::SettledAt).timestamp_with_time_zone().null())
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_referrals_referrer_id")
                .table(Referrals::Table)
                .col(Referrals::ReferrerId)
                .to_owned()
        ).await?;

        // Per-country referral reward and withdrawal minimum
        manager.create_table(
            Table::create()
                .table(ReferralSettings::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(ReferralSettings::Id)
                        .integer()
                        .not_null()
                        .auto_increment()
                        .primary_key()
                )
                .col(ColumnDef::new(ReferralSettings::Country).string().not_null().unique_key())
                .col(ColumnDef::new(ReferralSettings::RewardCents).big_integer().not_null())
                .col(
                    ColumnDef::new(ReferralSettings::MinWithdrawalCents)
                        .big_integer()
                        .not_null()
                        .default(2000)
                )
                .col(
                    ColumnDef::new(ReferralSettings::UpdatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp())
                )
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ReferralSettings::Table).to_owned()).await?;

        manager.drop_table(Table::drop().table(Referrals::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Referrals {
    Table,
    Id,
    ReferrerId,
    ReferredUserId,
    Country,
    RewardCents,
    Status,
    CreatedAt,
    SettledAt,
}

#[derive(DeriveIden)]
enum ReferralSettings {
    Table,
    Id,
    Country,
    RewardCents,
    MinWithdrawalCents,
    UpdatedAt,
}
