#![allow(dead_code)]

use migration::{ Migrator, MigratorTrait };
use reward_settlement::api::AppState;
use reward_settlement::config::RewardDefaults;
use reward_settlement::db::entity::user;
use reward_settlement::db::NewTask;
use reward_settlement::db::entity::task;
use reward_settlement::services::Registration;
use sea_orm::{ ConnectOptions, Database, DatabaseConnection, EntityTrait };

/// Fresh in-memory database with all migrations applied.
///
/// One pooled connection: every connection to `sqlite::memory:` is its own
/// database. Spawned tasks therefore run their transactions one at a time,
/// so "concurrent" tests exercise the unique-index and guarded-update
/// fallbacks rather than truly overlapping transactions.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options).await.expect("connect to sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub async fn setup() -> (DatabaseConnection, AppState) {
    let db = setup_db().await;
    let state = AppState::new(db.clone(), RewardDefaults::default());
    (db, state)
}

pub async fn register(
    state: &AppState,
    username: &str,
    country: &str,
    referral_code: Option<&str>
) -> user::Model {
    state.user_service
        .register(Registration {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "password123".to_string(),
            country: country.to_string(),
            phone: String::new(),
            referral_code: referral_code.map(str::to_string),
        }).await
        .expect("register user")
}

pub async fn create_task(state: &AppState, country: &str, reward_cents: i64) -> task::Model {
    state.task_service
        .create(NewTask {
            country: country.to_string(),
            smart_link: "https://offers.example.com/click".to_string(),
            tag_name: "survey".to_string(),
            reward_cents,
            is_active: true,
        }).await
        .expect("create task")
}

pub async fn reload_user(db: &DatabaseConnection, user_id: i32) -> user::Model {
    user::Entity::find_by_id(user_id).one(db).await.expect("query user").expect("user exists")
}
