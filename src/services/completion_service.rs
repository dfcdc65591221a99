use chrono::Utc;
use sea_orm::{ ActiveModelTrait, ActiveValue, DatabaseConnection, TransactionTrait };

use crate::db::entity::completed_task;
use crate::db::ledger::{ self, BalanceBucket };
use crate::error::{ AppError, Result };
use crate::money;

/// Result of recording a completion. A repeated delivery is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    Recorded(completed_task::Model),
    AlreadyCompleted,
}

impl CompletionOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, CompletionOutcome::Recorded(_))
    }
}

/// Records task completions and credits the task balance exactly once per
/// (user, task) pair.
#[derive(Clone)]
pub struct CompletionService {
    db: DatabaseConnection,
}

impl CompletionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert the completion and credit `reward_cents` in one transaction.
    ///
    /// The insert is the test-and-set: when the `unq_user_task` index rejects
    /// it, nothing is credited and `AlreadyCompleted` is returned. Concurrent
    /// duplicates therefore resolve in the database, not in this process.
    pub async fn complete_task(
        &self,
        user_id: i32,
        task_id: i32,
        reward_cents: i64,
        transaction_id: Option<String>
    ) -> Result<CompletionOutcome> {
        money::require_positive(reward_cents, "Reward")?;

        let txn = self.db.begin().await?;

        let completion = completed_task::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(user_id),
            task_id: ActiveValue::Set(task_id),
            reward_cents: ActiveValue::Set(reward_cents),
            transaction_id: ActiveValue::Set(transaction_id),
            completed_at: ActiveValue::Set(Utc::now()),
        };

        let completion = match completion.insert(&txn).await {
            Ok(model) => model,
            Err(e) if ledger::is_duplicate_key(&e) => {
                txn.rollback().await?;
                tracing::debug!("Task {} already completed by user {}", task_id, user_id);
                return Ok(CompletionOutcome::AlreadyCompleted);
            }
            Err(e) => {
                return Err(e.into());
            }
        };

        if !ledger::credit(&txn, user_id, BalanceBucket::Task, reward_cents).await? {
            txn.rollback().await?;
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        txn.commit().await?;

        tracing::info!(
            "Recorded completion of task {} by user {} (+{})",
            task_id,
            user_id,
            money::from_cents(reward_cents)
        );

        Ok(CompletionOutcome::Recorded(completion))
    }
}
