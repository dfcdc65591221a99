use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    sea_query::Expr,
    ColumnTrait,
    DatabaseConnection,
    EntityTrait,
    QueryFilter,
    QueryOrder,
    TransactionTrait,
};

use crate::config::RewardDefaults;
use crate::db::entity::{ referral, referral_setting };
use crate::db::ledger::{ self, BalanceBucket };
use crate::db::{ ReferralSettingRepository, UserRepository };
use crate::enums::ReferralStatus;
use crate::error::{ AppError, Result };
use crate::money;

/// Effective per-country amounts after falling back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryTerms {
    pub referral_reward_cents: i64,
    pub min_withdrawal_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// The user was not referred, or the referral is no longer pending.
    NoPendingReferral,
    Settled {
        referral_id: i32,
        referrer_id: i32,
        reward_cents: i64,
    },
    /// Another worker settled the same referral first.
    AlreadySettled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ReferralStats {
    pub total_referrals: usize,
    pub paid_referrals: usize,
    pub pending_referrals: usize,
    pub total_earnings_cents: i64,
}

pub struct ReferralService {
    db: DatabaseConnection,
    settings: Arc<ReferralSettingRepository>,
    users: Arc<UserRepository>,
    defaults: RewardDefaults,
}

impl ReferralService {
    pub fn new(
        db: DatabaseConnection,
        settings: Arc<ReferralSettingRepository>,
        users: Arc<UserRepository>,
        defaults: RewardDefaults
    ) -> Self {
        Self {
            db,
            settings,
            users,
            defaults,
        }
    }

    pub async fn country_terms(&self, country: &str) -> Result<CountryTerms> {
        let terms = match self.settings.find_by_country(country).await? {
            Some(setting) =>
                CountryTerms {
                    referral_reward_cents: setting.reward_cents,
                    min_withdrawal_cents: setting.min_withdrawal_cents,
                },
            None =>
                CountryTerms {
                    referral_reward_cents: self.defaults.referral_reward_cents,
                    min_withdrawal_cents: self.defaults.min_withdrawal_cents,
                },
        };

        Ok(terms)
    }

    /// Settle the pending referral of `user_id`, if any.
    ///
    /// Gated only by the referral status, so it is safe to call after every
    /// completion: the first call pays, later calls find nothing pending.
    pub async fn on_task_completed(&self, user_id: i32) -> Result<SettlementOutcome> {
        let Some(pending) = referral::Entity
            ::find()
            .filter(referral::Column::ReferredUserId.eq(user_id))
            .filter(referral::Column::Status.eq(ReferralStatus::Pending.as_str()))
            .one(&self.db).await? else {
            return Ok(SettlementOutcome::NoPendingReferral);
        };

        self.settle(&pending).await
    }

    /// Pay out a referral read while it was pending. Returns `AlreadySettled`
    /// if its status moved on since that read.
    pub async fn settle(&self, pending: &referral::Model) -> Result<SettlementOutcome> {
        let reward_cents = self.country_terms(&pending.country).await?.referral_reward_cents;

        let txn = self.db.begin().await?;

        // Compare-and-set: only one worker can move the row out of pending
        let transition = referral::Entity
            ::update_many()
            .col_expr(referral::Column::Status, Expr::value(ReferralStatus::Paid.as_str()))
            .col_expr(referral::Column::RewardCents, Expr::value(reward_cents))
            .col_expr(referral::Column::SettledAt, Expr::value(Utc::now()))
            .filter(referral::Column::Id.eq(pending.id))
            .filter(referral::Column::Status.eq(ReferralStatus::Pending.as_str()))
            .exec(&txn).await?;

        if transition.rows_affected == 0 {
            txn.rollback().await?;
            tracing::debug!("Referral {} was settled concurrently", pending.id);
            return Ok(SettlementOutcome::AlreadySettled);
        }

        let credited = ledger::credit(
            &txn,
            pending.referrer_id,
            BalanceBucket::Referral,
            reward_cents
        ).await?;

        if !credited {
            tracing::warn!(
                "Referral {} marked paid but referrer {} does not exist; {} was not credited",
                pending.id,
                pending.referrer_id,
                money::from_cents(reward_cents)
            );
        }

        txn.commit().await?;

        tracing::info!(
            "Settled referral {}: referrer {} earned {} from user {}",
            pending.id,
            pending.referrer_id,
            money::from_cents(reward_cents),
            pending.referred_user_id
        );

        Ok(SettlementOutcome::Settled {
            referral_id: pending.id,
            referrer_id: pending.referrer_id,
            reward_cents,
        })
    }

    /// Admin action: `pending -> blocked`. The bonus will never be paid.
    pub async fn block_referral(&self, referral_id: i32) -> Result<referral::Model> {
        let existing = self.find_by_id(referral_id).await?;
        let current: ReferralStatus = existing.status.parse()?;

        if !current.can_transition_to(ReferralStatus::Blocked) {
            return Err(AppError::Conflict(format!("Referral {} is already {}", referral_id, current)));
        }

        let transition = referral::Entity
            ::update_many()
            .col_expr(referral::Column::Status, Expr::value(ReferralStatus::Blocked.as_str()))
            .filter(referral::Column::Id.eq(referral_id))
            .filter(referral::Column::Status.eq(ReferralStatus::Pending.as_str()))
            .exec(&self.db).await?;

        let updated = self.find_by_id(referral_id).await?;

        if transition.rows_affected == 0 {
            return Err(AppError::Conflict(format!("Referral {} is already {}", referral_id, updated.status)));
        }

        tracing::info!("Blocked referral {} of user {}", referral_id, updated.referred_user_id);
        Ok(updated)
    }

    pub async fn find_by_id(&self, referral_id: i32) -> Result<referral::Model> {
        referral::Entity
            ::find_by_id(referral_id)
            .one(&self.db).await?
            .ok_or_else(|| AppError::NotFound(format!("Referral {} not found", referral_id)))
    }

    pub async fn list_for_referrer(&self, referrer_id: i32) -> Result<Vec<referral::Model>> {
        let referrals = referral::Entity
            ::find()
            .filter(referral::Column::ReferrerId.eq(referrer_id))
            .order_by_desc(referral::Column::CreatedAt)
            .order_by_desc(referral::Column::Id)
            .all(&self.db).await?;

        Ok(referrals)
    }

    /// Earnings are the rewards stored on paid referrals, so withdrawals
    /// from the referral balance do not reduce them.
    pub async fn stats(&self, referrer_id: i32) -> Result<ReferralStats> {
        self.users.find_by_id(referrer_id).await?;
        let referrals = self.list_for_referrer(referrer_id).await?;

        let (paid, rest): (Vec<_>, Vec<_>) = referrals
            .iter()
            .partition(|r| r.status == ReferralStatus::Paid.as_str());

        Ok(ReferralStats {
            total_referrals: referrals.len(),
            paid_referrals: paid.len(),
            pending_referrals: rest
                .iter()
                .filter(|r| r.status == ReferralStatus::Pending.as_str())
                .count(),
            total_earnings_cents: paid
                .iter()
                .map(|r| r.reward_cents)
                .sum(),
        })
    }

    pub async fn list_settings(&self) -> Result<Vec<referral_setting::Model>> {
        self.settings.find_all().await
    }

    /// Set the reward and withdrawal minimum for a country. A missing minimum
    /// falls back to the configured default.
    pub async fn upsert_setting(
        &self,
        country: &str,
        reward_cents: i64,
        min_withdrawal_cents: Option<i64>
    ) -> Result<referral_setting::Model> {
        let country = country.trim();
        if country.is_empty() {
            return Err(AppError::InvalidInput("Country is required".to_string()));
        }
        if reward_cents < 0 {
            return Err(AppError::InvalidInput("Reward must not be negative".to_string()));
        }

        let min_withdrawal_cents = min_withdrawal_cents.unwrap_or(
            self.defaults.min_withdrawal_cents
        );
        money::require_positive(min_withdrawal_cents, "Minimum withdrawal")?;

        let setting = self.settings.upsert(country, reward_cents, min_withdrawal_cents).await?;

        tracing::info!(
            "Referral setting for {}: reward {}, minimum withdrawal {}",
            country,
            money::from_cents(reward_cents),
            money::from_cents(min_withdrawal_cents)
        );

        Ok(setting)
    }
}
