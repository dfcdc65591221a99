use std::sync::Arc;

use serde::Deserialize;

use crate::error::{ AppError, Result };
use crate::money;
use crate::services::{ CompletionOutcome, CompletionService, ReferralService, TaskService };

/// Raw query string of an advertiser postback. Everything arrives as text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostbackParams {
    pub user_id: Option<String>,
    pub task_id: Option<String>,
    pub transaction_id: Option<String>,
    pub payout: Option<String>,
}

/// A postback that passed the type checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Postback {
    pub user_id: i32,
    pub task_id: i32,
    pub payout_cents: Option<i64>,
    pub transaction_id: Option<String>,
}

impl Postback {
    pub fn parse(params: &PostbackParams) -> Result<Self> {
        let (Some(user_id), Some(task_id)) = (
            present(params.user_id.as_deref()),
            present(params.task_id.as_deref()),
        ) else {
            return Err(AppError::InvalidInput("Missing parameters".to_string()));
        };

        let invalid = || AppError::InvalidInput("Invalid parameters".to_string());
        let user_id = user_id.parse::<i32>().map_err(|_| invalid())?;
        let task_id = task_id.parse::<i32>().map_err(|_| invalid())?;
        let payout_cents = present(params.payout.as_deref())
            .map(|payout| money::parse_cents(payout).map_err(|_| invalid()))
            .transpose()?;

        Ok(Self {
            user_id,
            task_id,
            payout_cents,
            transaction_id: present(params.transaction_id.as_deref()).map(str::to_string),
        })
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// What the network is told. Every variant is a 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostbackAck {
    Processed,
    AlreadyCompleted,
    /// No such user. Nothing was recorded; a retry cannot change that.
    UnknownUser,
}

impl PostbackAck {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostbackAck::Processed | PostbackAck::UnknownUser => "OK",
            PostbackAck::AlreadyCompleted => "OK - Already Completed",
        }
    }
}

/// Entry point for advertiser callbacks: record the completion, then settle
/// the user's referral. Safe to receive any number of times.
pub struct PostbackService {
    completions: Arc<CompletionService>,
    referrals: Arc<ReferralService>,
    tasks: Arc<TaskService>,
    default_reward_cents: i64,
}

impl PostbackService {
    pub fn new(
        completions: Arc<CompletionService>,
        referrals: Arc<ReferralService>,
        tasks: Arc<TaskService>,
        default_reward_cents: i64
    ) -> Self {
        Self {
            completions,
            referrals,
            tasks,
            default_reward_cents,
        }
    }

    pub async fn handle(&self, postback: Postback) -> Result<PostbackAck> {
        let reward_cents = match postback.payout_cents {
            Some(cents) => cents,
            None => self.fallback_reward(postback.task_id).await?,
        };

        let outcome = match
            self.completions.complete_task(
                postback.user_id,
                postback.task_id,
                reward_cents,
                postback.transaction_id.clone()
            ).await
        {
            Ok(outcome) => outcome,
            Err(AppError::NotFound(_)) => {
                tracing::warn!(
                    "Postback for unknown user {} task {} (transaction {:?}) dropped",
                    postback.user_id,
                    postback.task_id,
                    postback.transaction_id
                );
                return Ok(PostbackAck::UnknownUser);
            }
            Err(e) => {
                return Err(e);
            }
        };

        // Always attempted: finishes a settlement that an earlier delivery
        // recorded the completion for but did not get to
        let settlement = self.referrals.on_task_completed(postback.user_id).await?;
        tracing::debug!("Postback settlement for user {}: {:?}", postback.user_id, settlement);

        match outcome {
            CompletionOutcome::Recorded(_) => Ok(PostbackAck::Processed),
            CompletionOutcome::AlreadyCompleted => {
                tracing::warn!(
                    "Duplicate postback for user {} task {} (transaction {:?})",
                    postback.user_id,
                    postback.task_id,
                    postback.transaction_id
                );
                Ok(PostbackAck::AlreadyCompleted)
            }
        }
    }

    async fn fallback_reward(&self, task_id: i32) -> Result<i64> {
        Ok(
            self.tasks
                .get(task_id).await?
                .map(|task| task.reward_cents)
                .unwrap_or(self.default_reward_cents)
        )
    }
}
