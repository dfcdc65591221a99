use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    sea_query::Expr,
    ActiveModelTrait,
    ActiveValue,
    ColumnTrait,
    DatabaseConnection,
    EntityTrait,
    QueryFilter,
    QueryOrder,
    TransactionTrait,
};

use crate::db::entity::{ user, withdrawal };
use crate::db::ledger::{ self, BalanceBucket };
use crate::enums::{ Network, WithdrawalStatus };
use crate::error::{ AppError, Result };
use crate::identity::Identity;
use crate::money;
use crate::services::ReferralService;

#[derive(Debug, Clone)]
pub struct WithdrawalRequest {
    pub amount_cents: i64,
    pub wallet_address: String,
    pub network: Network,
}

/// Withdrawal joined with the owner's username and country, for admins.
#[derive(Debug, Clone)]
pub struct WithdrawalWithOwner {
    pub withdrawal: withdrawal::Model,
    pub username: Option<String>,
    pub country: Option<String>,
}

/// Validates and records withdrawal requests.
///
/// The amount is debited when the request is made (task balance first, then
/// referral balance) and refunded to the same buckets if an admin rejects it,
/// so pending requests can never spend the same balance twice.
pub struct WithdrawalService {
    db: DatabaseConnection,
    referrals: Arc<ReferralService>,
}

impl WithdrawalService {
    pub fn new(db: DatabaseConnection, referrals: Arc<ReferralService>) -> Self {
        Self { db, referrals }
    }

    pub async fn request_withdrawal(
        &self,
        identity: &Identity,
        request: WithdrawalRequest
    ) -> Result<withdrawal::Model> {
        let amount_cents = money::require_positive(request.amount_cents, "Amount")?;

        let wallet_address = request.wallet_address.trim().to_string();
        if wallet_address.is_empty() {
            return Err(AppError::InvalidInput("Wallet address is required".to_string()));
        }

        let terms = self.referrals.country_terms(&identity.country).await?;
        if amount_cents < terms.min_withdrawal_cents {
            return Err(
                AppError::InvalidInput(
                    format!(
                        "Minimum withdrawal for {} is {} USDT",
                        identity.country,
                        money::from_cents(terms.min_withdrawal_cents)
                    )
                )
            );
        }

        let txn = self.db.begin().await?;

        let owner = user::Entity
            ::find_by_id(identity.user_id)
            .one(&txn).await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", identity.user_id)))?;

        let Some((from_task, from_referral)) = ledger::split_debit(
            amount_cents,
            owner.balance_task_cents,
            owner.balance_referral_cents
        ) else {
            txn.rollback().await?;
            return Err(AppError::InsufficientBalance);
        };

        // The guarded update fails if a concurrent request spent the balance
        if !ledger::debit(&txn, owner.id, from_task, from_referral).await? {
            txn.rollback().await?;
            return Err(AppError::InsufficientBalance);
        }

        let model = withdrawal::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(owner.id),
            amount_cents: ActiveValue::Set(amount_cents),
            from_task_cents: ActiveValue::Set(from_task),
            from_referral_cents: ActiveValue::Set(from_referral),
            wallet_address: ActiveValue::Set(wallet_address),
            network: ActiveValue::Set(request.network.to_string()),
            status: ActiveValue::Set(WithdrawalStatus::Pending.to_string()),
            created_at: ActiveValue::Set(Utc::now()),
            reviewed_at: ActiveValue::Set(None),
        };

        let model = model.insert(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            "Withdrawal {} requested by user {}: {} via {}",
            model.id,
            owner.id,
            money::from_cents(amount_cents),
            request.network
        );

        Ok(model)
    }

    /// Admin action: `pending -> approved | rejected`, exactly once.
    pub async fn review(&self, withdrawal_id: i32, target: WithdrawalStatus) -> Result<withdrawal::Model> {
        if !target.is_terminal() {
            return Err(
                AppError::InvalidInput("Status must be approved or rejected".to_string())
            );
        }

        let txn = self.db.begin().await?;

        let existing = withdrawal::Entity
            ::find_by_id(withdrawal_id)
            .one(&txn).await?
            .ok_or_else(|| AppError::NotFound(format!("Withdrawal {} not found", withdrawal_id)))?;

        let transition = withdrawal::Entity
            ::update_many()
            .col_expr(withdrawal::Column::Status, Expr::value(target.as_str()))
            .col_expr(withdrawal::Column::ReviewedAt, Expr::value(Utc::now()))
            .filter(withdrawal::Column::Id.eq(withdrawal_id))
            .filter(withdrawal::Column::Status.eq(WithdrawalStatus::Pending.as_str()))
            .exec(&txn).await?;

        if transition.rows_affected == 0 {
            txn.rollback().await?;
            return Err(
                AppError::Conflict(
                    format!("Withdrawal {} is already {}", withdrawal_id, existing.status)
                )
            );
        }

        if target == WithdrawalStatus::Rejected {
            Self::refund(&txn, &existing).await?;
        }

        let updated = withdrawal::Entity
            ::find_by_id(withdrawal_id)
            .one(&txn).await?
            .ok_or_else(|| AppError::NotFound(format!("Withdrawal {} not found", withdrawal_id)))?;

        txn.commit().await?;

        tracing::info!("Withdrawal {} {}", withdrawal_id, target);
        Ok(updated)
    }

    async fn refund<C>(conn: &C, withdrawal: &withdrawal::Model) -> Result<()>
        where C: sea_orm::ConnectionTrait
    {
        let parts = [
            (BalanceBucket::Task, withdrawal.from_task_cents),
            (BalanceBucket::Referral, withdrawal.from_referral_cents),
        ];

        for (bucket, cents) in parts {
            if cents == 0 {
                continue;
            }
            if !ledger::credit(conn, withdrawal.user_id, bucket, cents).await? {
                tracing::warn!(
                    "Refund of withdrawal {} skipped: user {} does not exist",
                    withdrawal.id,
                    withdrawal.user_id
                );
                break;
            }
        }

        Ok(())
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<withdrawal::Model>> {
        let withdrawals = withdrawal::Entity
            ::find()
            .filter(withdrawal::Column::UserId.eq(user_id))
            .order_by_desc(withdrawal::Column::CreatedAt)
            .order_by_desc(withdrawal::Column::Id)
            .all(&self.db).await?;

        Ok(withdrawals)
    }

    pub async fn list_all(&self) -> Result<Vec<WithdrawalWithOwner>> {
        let rows = withdrawal::Entity
            ::find()
            .find_also_related(user::Entity)
            .order_by_desc(withdrawal::Column::CreatedAt)
            .order_by_desc(withdrawal::Column::Id)
            .all(&self.db).await?;

        Ok(
            rows
                .into_iter()
                .map(|(withdrawal, owner)| WithdrawalWithOwner {
                    withdrawal,
                    username: owner.as_ref().map(|u| u.username.clone()),
                    country: owner.map(|u| u.country),
                })
                .collect()
        )
    }
}
