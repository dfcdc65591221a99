use std::collections::HashSet;
use std::sync::Arc;

use crate::db::entity::task;
use crate::db::{ NewTask, TaskRepository };
use crate::error::{ AppError, Result };
use crate::identity::Identity;
use crate::money;

/// A catalogue task as seen by one user.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskForUser {
    pub task: task::Model,
    pub completed: bool,
}

pub struct TaskService {
    repository: Arc<TaskRepository>,
}

impl TaskService {
    pub fn new(repository: Arc<TaskRepository>) -> Self {
        Self { repository }
    }

    /// Active tasks for the caller's country, flagged with completion state.
    pub async fn list_for_user(&self, identity: &Identity) -> Result<Vec<TaskForUser>> {
        let tasks = self.repository.find_active_by_country(&identity.country).await?;
        let completed: HashSet<i32> = self.repository
            .completed_task_ids(identity.user_id).await?
            .into_iter()
            .collect();

        Ok(
            tasks
                .into_iter()
                .map(|task| {
                    let completed = completed.contains(&task.id);
                    TaskForUser { task, completed }
                })
                .collect()
        )
    }

    pub async fn create(&self, new_task: NewTask) -> Result<task::Model> {
        money::require_positive(new_task.reward_cents, "Reward")?;
        for (value, field) in [
            (&new_task.country, "Country"),
            (&new_task.smart_link, "Smart link"),
            (&new_task.tag_name, "Tag name"),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::InvalidInput(format!("{} is required", field)));
            }
        }

        let task = self.repository.create(new_task).await?;
        tracing::info!("Created task {} for {}", task.id, task.country);
        Ok(task)
    }

    pub async fn get(&self, task_id: i32) -> Result<Option<task::Model>> {
        self.repository.find_by_id(task_id).await
    }

    pub async fn list_all(&self) -> Result<Vec<task::Model>> {
        self.repository.find_all().await
    }

    /// Completion history is kept; only the catalogue entry goes away.
    pub async fn delete(&self, task_id: i32) -> Result<()> {
        self.repository.delete(task_id).await?;
        tracing::info!("Deleted task {}", task_id);
        Ok(())
    }
}
