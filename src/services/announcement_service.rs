use chrono::Utc;
use sea_orm::{
    sea_query::Condition,
    ActiveModelTrait,
    ActiveValue,
    ColumnTrait,
    DatabaseConnection,
    EntityTrait,
    QueryFilter,
    QueryOrder,
};

use crate::db::entity::announcement;
use crate::error::{ AppError, Result };

#[derive(Clone)]
pub struct AnnouncementService {
    db: DatabaseConnection,
}

impl AnnouncementService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Active announcements that are global or targeted at `country`.
    pub async fn list_for_country(&self, country: &str) -> Result<Vec<announcement::Model>> {
        let announcements = announcement::Entity
            ::find()
            .filter(announcement::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(announcement::Column::Country.is_null())
                    .add(announcement::Column::Country.eq(country))
            )
            .order_by_desc(announcement::Column::CreatedAt)
            .order_by_desc(announcement::Column::Id)
            .all(&self.db).await?;

        Ok(announcements)
    }

    pub async fn create(
        &self,
        content: String,
        country: Option<String>
    ) -> Result<announcement::Model> {
        if content.trim().is_empty() {
            return Err(AppError::InvalidInput("Content is required".to_string()));
        }

        let country = country.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());

        let model = announcement::ActiveModel {
            id: ActiveValue::NotSet,
            content: ActiveValue::Set(content),
            country: ActiveValue::Set(country),
            is_active: ActiveValue::Set(true),
            created_at: ActiveValue::Set(Utc::now()),
        };

        let model = model.insert(&self.db).await?;
        Ok(model)
    }

    pub async fn delete(&self, announcement_id: i32) -> Result<()> {
        let result = announcement::Entity::delete_by_id(announcement_id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Announcement {} not found", announcement_id)));
        }
        Ok(())
    }
}
