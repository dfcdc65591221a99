use axum::{ extract::{ Path, State }, http::StatusCode, Json };
use rust_decimal::Decimal;
use serde::{ Deserialize, Serialize };

use crate::db::entity::referral_setting;
use crate::db::NewTask;
use crate::enums::WithdrawalStatus;
use crate::error::Result;
use crate::identity::AdminIdentity;
use crate::money;
use crate::services::WithdrawalWithOwner;

use super::announcements::AnnouncementResponse;
use super::auth::UserResponse;
use super::referrals::ReferralResponse;
use super::tasks::TaskResponse;
use super::withdrawals::WithdrawalResponse;
use super::AppState;

#[derive(Deserialize)]
pub struct CreateTaskRequest {
    pub country: String,
    pub smart_link: String,
    pub tag_name: String,
    pub reward: Decimal,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Deserialize)]
pub struct ReviewWithdrawalRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct ReferralSettingRequest {
    pub country: String,
    pub reward: Decimal,
    #[serde(default)]
    pub min_withdrawal: Option<Decimal>,
}

#[derive(Deserialize)]
pub struct CreateAnnouncementRequest {
    pub content: String,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Serialize)]
pub struct AdminWithdrawalResponse {
    #[serde(flatten)]
    pub withdrawal: WithdrawalResponse,
    pub username: Option<String>,
    pub country: Option<String>,
}

impl From<WithdrawalWithOwner> for AdminWithdrawalResponse {
    fn from(entry: WithdrawalWithOwner) -> Self {
        Self {
            withdrawal: entry.withdrawal.into(),
            username: entry.username,
            country: entry.country,
        }
    }
}

#[derive(Serialize)]
pub struct ReferralSettingResponse {
    pub id: i32,
    pub country: String,
    pub reward: Decimal,
    pub min_withdrawal: Decimal,
    pub updated_at: String,
}

impl From<referral_setting::Model> for ReferralSettingResponse {
    fn from(setting: referral_setting::Model) -> Self {
        Self {
            id: setting.id,
            country: setting.country,
            reward: money::from_cents(setting.reward_cents),
            min_withdrawal: money::from_cents(setting.min_withdrawal_cents),
            updated_at: setting.updated_at.to_rfc3339(),
        }
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminIdentity
) -> Result<Json<Vec<UserResponse>>> {
    let users = state.user_service.list_users().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    _admin: AdminIdentity
) -> Result<Json<Vec<TaskResponse>>> {
    let tasks = state.task_service.list_all().await?;
    Ok(Json(tasks.into_iter().map(Into::into).collect()))
}

pub async fn create_task(
    State(state): State<AppState>,
    _admin: AdminIdentity,
    Json(request): Json<CreateTaskRequest>
) -> Result<(StatusCode, Json<TaskResponse>)> {
    let task = state.task_service.create(NewTask {
        country: request.country,
        smart_link: request.smart_link,
        tag_name: request.tag_name,
        reward_cents: money::to_cents(request.reward)?,
        is_active: request.is_active,
    }).await?;

    Ok((StatusCode::CREATED, Json(task.into())))
}

pub async fn delete_task(
    State(state): State<AppState>,
    _admin: AdminIdentity,
    Path(task_id): Path<i32>
) -> Result<StatusCode> {
    state.task_service.delete(task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_withdrawals(
    State(state): State<AppState>,
    _admin: AdminIdentity
) -> Result<Json<Vec<AdminWithdrawalResponse>>> {
    let withdrawals = state.withdrawal_service.list_all().await?;
    Ok(Json(withdrawals.into_iter().map(Into::into).collect()))
}

pub async fn review_withdrawal(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(withdrawal_id): Path<i32>,
    Json(request): Json<ReviewWithdrawalRequest>
) -> Result<Json<WithdrawalResponse>> {
    let target: WithdrawalStatus = request.status.parse()?;
    let withdrawal = state.withdrawal_service.review(withdrawal_id, target).await?;

    tracing::info!("Admin {} set withdrawal {} to {}", admin.user_id, withdrawal_id, target);
    Ok(Json(withdrawal.into()))
}

pub async fn block_referral(
    State(state): State<AppState>,
    _admin: AdminIdentity,
    Path(referral_id): Path<i32>
) -> Result<Json<ReferralResponse>> {
    let referral = state.referral_service.block_referral(referral_id).await?;
    Ok(Json(referral.into()))
}

pub async fn list_referral_settings(
    State(state): State<AppState>,
    _admin: AdminIdentity
) -> Result<Json<Vec<ReferralSettingResponse>>> {
    let settings = state.referral_service.list_settings().await?;
    Ok(Json(settings.into_iter().map(Into::into).collect()))
}

pub async fn upsert_referral_setting(
    State(state): State<AppState>,
    _admin: AdminIdentity,
    Json(request): Json<ReferralSettingRequest>
) -> Result<Json<ReferralSettingResponse>> {
    let min_withdrawal_cents = request.min_withdrawal.map(money::to_cents).transpose()?;
    let setting = state.referral_service.upsert_setting(
        &request.country,
        money::to_cents(request.reward)?,
        min_withdrawal_cents
    ).await?;

    Ok(Json(setting.into()))
}

pub async fn create_announcement(
    State(state): State<AppState>,
    _admin: AdminIdentity,
    Json(request): Json<CreateAnnouncementRequest>
) -> Result<(StatusCode, Json<AnnouncementResponse>)> {
    let announcement = state.announcement_service.create(request.content, request.country).await?;
    Ok((StatusCode::CREATED, Json(announcement.into())))
}

pub async fn delete_announcement(
    State(state): State<AppState>,
    _admin: AdminIdentity,
    Path(announcement_id): Path<i32>
) -> Result<StatusCode> {
    state.announcement_service.delete(announcement_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
