use axum::{ extract::State, Json };
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::entity::task;
use crate::error::Result;
use crate::identity::Identity;
use crate::money;
use crate::services::TaskForUser;

use super::AppState;

#[derive(Serialize)]
pub struct TaskResponse {
    pub id: i32,
    pub country: String,
    pub smart_link: String,
    pub tag_name: String,
    pub reward: Decimal,
    pub is_active: bool,
    pub created_at: String,
}

impl From<task::Model> for TaskResponse {
    fn from(task: task::Model) -> Self {
        Self {
            id: task.id,
            country: task.country,
            smart_link: task.smart_link,
            tag_name: task.tag_name,
            reward: money::from_cents(task.reward_cents),
            is_active: task.is_active,
            created_at: task.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct UserTaskResponse {
    #[serde(flatten)]
    pub task: TaskResponse,
    pub completed: bool,
}

impl From<TaskForUser> for UserTaskResponse {
    fn from(entry: TaskForUser) -> Self {
        Self {
            task: entry.task.into(),
            completed: entry.completed,
        }
    }
}

pub async fn list_tasks(
    State(state): State<AppState>,
    identity: Identity
) -> Result<Json<Vec<UserTaskResponse>>> {
    let tasks = state.task_service.list_for_user(&identity).await?;
    Ok(Json(tasks.into_iter().map(Into::into).collect()))
}
