use axum::{ extract::State, http::StatusCode, Json };
use rust_decimal::Decimal;
use serde::{ Deserialize, Serialize };

use crate::db::entity::user;
use crate::error::Result;
use crate::identity::Identity;
use crate::money;
use crate::services::Registration;

use super::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub country: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub referral_code: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub country: String,
    pub phone: String,
    pub referral_code: String,
    pub referred_by: Option<i32>,
    pub balance_task: Decimal,
    pub balance_referral: Decimal,
    pub total_balance: Decimal,
    pub role: String,
    pub is_active: bool,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            total_balance: money::from_cents(user.total_balance_cents()),
            id: user.id,
            username: user.username,
            email: user.email,
            country: user.country,
            phone: user.phone,
            referral_code: user.referral_code,
            referred_by: user.referred_by,
            balance_task: money::from_cents(user.balance_task_cents),
            balance_referral: money::from_cents(user.balance_referral_cents),
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// The identity the authenticating proxy should forward on later requests.
#[derive(Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub identity: Identity,
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>
) -> Result<(StatusCode, Json<UserResponse>)> {
    let user = state.user_service.register(Registration {
        username: request.username,
        email: request.email,
        password: request.password,
        country: request.country,
        phone: request.phone,
        referral_code: request.referral_code,
    }).await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>
) -> Result<Json<LoginResponse>> {
    let (user, identity) = state.user_service.verify_credentials(
        &request.username,
        &request.password
    ).await?;

    Ok(Json(LoginResponse { user: user.into(), identity }))
}

pub async fn me(State(state): State<AppState>, identity: Identity) -> Result<Json<UserResponse>> {
    let user = state.user_service.get_user(identity.user_id).await?;
    Ok(Json(user.into()))
}
