use axum::{ extract::State, http::StatusCode, Json };
use rust_decimal::Decimal;
use serde::{ Deserialize, Serialize };

use crate::db::entity::withdrawal;
use crate::enums::Network;
use crate::error::Result;
use crate::identity::Identity;
use crate::money;
use crate::services::WithdrawalRequest;

use super::AppState;

#[derive(Deserialize)]
pub struct CreateWithdrawalRequest {
    pub amount: Decimal,
    pub wallet_address: String,
    pub network: String,
}

#[derive(Serialize)]
pub struct WithdrawalResponse {
    pub id: i32,
    pub user_id: i32,
    pub amount: Decimal,
    pub from_task: Decimal,
    pub from_referral: Decimal,
    pub wallet_address: String,
    pub network: String,
    pub status: String,
    pub created_at: String,
    pub reviewed_at: Option<String>,
}

impl From<withdrawal::Model> for WithdrawalResponse {
    fn from(withdrawal: withdrawal::Model) -> Self {
        Self {
            id: withdrawal.id,
            user_id: withdrawal.user_id,
            amount: money::from_cents(withdrawal.amount_cents),
            from_task: money::from_cents(withdrawal.from_task_cents),
            from_referral: money::from_cents(withdrawal.from_referral_cents),
            wallet_address: withdrawal.wallet_address,
            network: withdrawal.network,
            status: withdrawal.status,
            created_at: withdrawal.created_at.to_rfc3339(),
            reviewed_at: withdrawal.reviewed_at.map(|at| at.to_rfc3339()),
        }
    }
}

pub async fn request_withdrawal(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<CreateWithdrawalRequest>
) -> Result<(StatusCode, Json<WithdrawalResponse>)> {
    let network: Network = request.network.parse()?;
    let withdrawal = state.withdrawal_service.request_withdrawal(&identity, WithdrawalRequest {
        amount_cents: money::to_cents(request.amount)?,
        wallet_address: request.wallet_address,
        network,
    }).await?;

    Ok((StatusCode::CREATED, Json(withdrawal.into())))
}

pub async fn list_withdrawals(
    State(state): State<AppState>,
    identity: Identity
) -> Result<Json<Vec<WithdrawalResponse>>> {
    let withdrawals = state.withdrawal_service.list_for_user(identity.user_id).await?;
    Ok(Json(withdrawals.into_iter().map(Into::into).collect()))
}
