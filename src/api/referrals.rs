use axum::{ extract::State, Json };
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::entity::referral;
use crate::error::Result;
use crate::identity::Identity;
use crate::money;

use super::AppState;

#[derive(Serialize)]
pub struct ReferralResponse {
    pub id: i32,
    pub referrer_id: i32,
    pub referred_user_id: i32,
    pub country: String,
    pub reward: Decimal,
    pub status: String,
    pub created_at: String,
    pub settled_at: Option<String>,
}

impl From<referral::Model> for ReferralResponse {
    fn from(referral: referral::Model) -> Self {
        Self {
            id: referral.id,
            referrer_id: referral.referrer_id,
            referred_user_id: referral.referred_user_id,
            country: referral.country,
            reward: money::from_cents(referral.reward_cents),
            status: referral.status,
            created_at: referral.created_at.to_rfc3339(),
            settled_at: referral.settled_at.map(|at| at.to_rfc3339()),
        }
    }
}

#[derive(Serialize)]
pub struct ReferralStatsResponse {
    pub total_referrals: usize,
    pub paid_referrals: usize,
    pub pending_referrals: usize,
    pub total_earnings: Decimal,
    /// Bonus currently paid per referral in the caller's country.
    pub reward_per_referral: Decimal,
}

pub async fn list_referrals(
    State(state): State<AppState>,
    identity: Identity
) -> Result<Json<Vec<ReferralResponse>>> {
    let referrals = state.referral_service.list_for_referrer(identity.user_id).await?;
    Ok(Json(referrals.into_iter().map(Into::into).collect()))
}

pub async fn referral_stats(
    State(state): State<AppState>,
    identity: Identity
) -> Result<Json<ReferralStatsResponse>> {
    let stats = state.referral_service.stats(identity.user_id).await?;
    let terms = state.referral_service.country_terms(&identity.country).await?;

    Ok(
        Json(ReferralStatsResponse {
            total_referrals: stats.total_referrals,
            paid_referrals: stats.paid_referrals,
            pending_referrals: stats.pending_referrals,
            total_earnings: money::from_cents(stats.total_earnings_cents),
            reward_per_referral: money::from_cents(terms.referral_reward_cents),
        })
    )
}
