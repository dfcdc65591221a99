use std::sync::Arc;

use axum::{ routing::{ delete, get, patch, post }, Router };
use sea_orm::DatabaseConnection;

pub mod postback;
pub mod auth;
pub mod tasks;
pub mod withdrawals;
pub mod referrals;
pub mod announcements;
pub mod admin;

use crate::config::RewardDefaults;
use crate::db::{ ReferralSettingRepository, TaskRepository, UserRepository };
use crate::services::{
    AnnouncementService,
    CompletionService,
    PostbackService,
    ReferralService,
    TaskService,
    UserService,
    WithdrawalService,
};

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub task_service: Arc<TaskService>,
    pub referral_service: Arc<ReferralService>,
    pub withdrawal_service: Arc<WithdrawalService>,
    pub postback_service: Arc<PostbackService>,
    pub announcement_service: Arc<AnnouncementService>,
}

impl AppState {
    /// Wire every service onto one connection pool.
    pub fn new(db: DatabaseConnection, defaults: RewardDefaults) -> Self {
        let user_repository = Arc::new(UserRepository::new(db.clone()));
        let task_repository = Arc::new(TaskRepository::new(db.clone()));
        let setting_repository = Arc::new(ReferralSettingRepository::new(db.clone()));

        let user_service = Arc::new(UserService::new(db.clone(), user_repository.clone()));
        let task_service = Arc::new(TaskService::new(task_repository));
        let referral_service = Arc::new(
            ReferralService::new(db.clone(), setting_repository, user_repository, defaults)
        );
        let withdrawal_service = Arc::new(
            WithdrawalService::new(db.clone(), referral_service.clone())
        );
        let completion_service = Arc::new(CompletionService::new(db.clone()));
        let postback_service = Arc::new(
            PostbackService::new(
                completion_service,
                referral_service.clone(),
                task_service.clone(),
                defaults.task_reward_cents
            )
        );
        let announcement_service = Arc::new(AnnouncementService::new(db));

        Self {
            user_service,
            task_service,
            referral_service,
            withdrawal_service,
            postback_service,
            announcement_service,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/postback", get(postback::receive_postback))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/tasks", get(tasks::list_tasks))
        .route(
            "/api/withdrawals",
            get(withdrawals::list_withdrawals).post(withdrawals::request_withdrawal)
        )
        .route("/api/referrals", get(referrals::list_referrals))
        .route("/api/referrals/stats", get(referrals::referral_stats))
        .route("/api/announcements", get(announcements::list_announcements))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/tasks", get(admin::list_tasks).post(admin::create_task))
        .route("/api/admin/tasks/{id}", delete(admin::delete_task))
        .route("/api/admin/withdrawals", get(admin::list_withdrawals))
        .route("/api/admin/withdrawals/{id}", patch(admin::review_withdrawal))
        .route("/api/admin/referrals/{id}/block", post(admin::block_referral))
        .route(
            "/api/admin/referral-settings",
            get(admin::list_referral_settings).post(admin::upsert_referral_setting)
        )
        .route("/api/admin/announcements", post(admin::create_announcement))
        .route("/api/admin/announcements/{id}", delete(admin::delete_announcement))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
