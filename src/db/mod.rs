use sea_orm::{ entity::prelude::*, DatabaseConnection, QueryOrder };

use crate::error::{ AppError, Result };

pub mod entity;
pub use entity::*;

pub mod ledger;

mod task_repository;
pub use task_repository::{ TaskRepository, NewTask };

mod referral_setting_repository;
pub use referral_setting_repository::ReferralSettingRepository;

pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<entity::user::Model> {
        entity::user::Entity
            ::find_by_id(id)
            .one(&self.db).await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<entity::user::Model>> {
        let user = entity::user::Entity
            ::find()
            .filter(entity::user::Column::Username.eq(username))
            .one(&self.db).await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<entity::user::Model>> {
        let user = entity::user::Entity
            ::find()
            .filter(entity::user::Column::Email.eq(email))
            .one(&self.db).await?;

        Ok(user)
    }

    pub async fn find_by_referral_code(&self, code: &str) -> Result<Option<entity::user::Model>> {
        let user = entity::user::Entity
            ::find()
            .filter(entity::user::Column::ReferralCode.eq(code))
            .one(&self.db).await?;

        Ok(user)
    }

    pub async fn find_all(&self) -> Result<Vec<entity::user::Model>> {
        let users = entity::user::Entity
            ::find()
            .order_by_desc(entity::user::Column::CreatedAt)
            .order_by_desc(entity::user::Column::Id)
            .all(&self.db).await?;

        Ok(users)
    }
}
