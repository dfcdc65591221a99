use chrono::Utc;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue,
    ColumnTrait,
    DatabaseConnection,
    EntityTrait,
    QueryFilter,
    QueryOrder,
    QuerySelect,
};

use crate::db::entity::{ completed_task, task };
use crate::error::{ AppError, Result };

#[derive(Clone)]
pub struct TaskRepository {
    db: DatabaseConnection,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub country: String,
    pub smart_link: String,
    pub tag_name: String,
    pub reward_cents: i64,
    pub is_active: bool,
}

impl TaskRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, new_task: NewTask) -> Result<task::Model> {
        let model = task::ActiveModel {
            id: ActiveValue::NotSet,
            country: ActiveValue::Set(new_task.country),
            smart_link: ActiveValue::Set(new_task.smart_link),
            tag_name: ActiveValue::Set(new_task.tag_name),
            reward_cents: ActiveValue::Set(new_task.reward_cents),
            is_active: ActiveValue::Set(new_task.is_active),
            created_at: ActiveValue::Set(Utc::now()),
        };

        let model = model.insert(&self.db).await?;
        Ok(model)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<task::Model>> {
        let task = task::Entity::find_by_id(id).one(&self.db).await?;
        Ok(task)
    }

    pub async fn find_active_by_country(&self, country: &str) -> Result<Vec<task::Model>> {
        let tasks = task::Entity
            ::find()
            .filter(task::Column::Country.eq(country))
            .filter(task::Column::IsActive.eq(true))
            .order_by_asc(task::Column::Id)
            .all(&self.db).await?;

        Ok(tasks)
    }

    pub async fn find_all(&self) -> Result<Vec<task::Model>> {
        let tasks = task::Entity
            ::find()
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .all(&self.db).await?;

        Ok(tasks)
    }

    pub async fn delete(&self, id: i32) -> Result<()> {
        let result = task::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Task {} not found", id)));
        }
        Ok(())
    }

    /// Ids of every task the user has completed.
    pub async fn completed_task_ids(&self, user_id: i32) -> Result<Vec<i32>> {
        let ids = completed_task::Entity
            ::find()
            .select_only()
            .column(completed_task::Column::TaskId)
            .filter(completed_task::Column::UserId.eq(user_id))
            .into_tuple::<i32>()
            .all(&self.db).await?;

        Ok(ids)
    }

    pub async fn completions_for_user(&self, user_id: i32) -> Result<Vec<completed_task::Model>> {
        let completions = completed_task::Entity
            ::find()
            .filter(completed_task::Column::UserId.eq(user_id))
            .order_by_desc(completed_task::Column::CompletedAt)
            .all(&self.db).await?;

        Ok(completions)
    }
}
