use chrono::Utc;
use sea_orm::{
    sea_query::OnConflict,
    ActiveValue,
    ColumnTrait,
    DatabaseConnection,
    EntityTrait,
    QueryFilter,
    QueryOrder,
};

use crate::db::entity::referral_setting;
use crate::error::{ AppError, Result };

#[derive(Clone)]
pub struct ReferralSettingRepository {
    db: DatabaseConnection,
}

impl ReferralSettingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_country(&self, country: &str) -> Result<Option<referral_setting::Model>> {
        let setting = referral_setting::Entity
            ::find()
            .filter(referral_setting::Column::Country.eq(country))
            .one(&self.db).await?;

        Ok(setting)
    }

    pub async fn find_all(&self) -> Result<Vec<referral_setting::Model>> {
        let settings = referral_setting::Entity
            ::find()
            .order_by_asc(referral_setting::Column::Country)
            .all(&self.db).await?;

        Ok(settings)
    }

    /// Insert or overwrite the setting for a country in one statement.
    pub async fn upsert(
        &self,
        country: &str,
        reward_cents: i64,
        min_withdrawal_cents: i64
    ) -> Result<referral_setting::Model> {
        let model = referral_setting::ActiveModel {
            id: ActiveValue::NotSet,
            country: ActiveValue::Set(country.to_string()),
            reward_cents: ActiveValue::Set(reward_cents),
            min_withdrawal_cents: ActiveValue::Set(min_withdrawal_cents),
            updated_at: ActiveValue::Set(Utc::now()),
        };

        referral_setting::Entity
            ::insert(model)
            .on_conflict(
                OnConflict::column(referral_setting::Column::Country)
                    .update_columns([
                        referral_setting::Column::RewardCents,
                        referral_setting::Column::MinWithdrawalCents,
                        referral_setting::Column::UpdatedAt,
                    ])
                    .to_owned()
            )
            .exec(&self.db).await?;

        self.find_by_country(country).await?.ok_or_else(||
            AppError::Internal(format!("Referral setting for {} vanished after upsert", country))
        )
    }
}
