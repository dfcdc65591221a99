use axum::{ extract::State, Json };
use serde::Serialize;

use crate::db::entity::announcement;
use crate::error::Result;
use crate::identity::Identity;

use super::AppState;

#[derive(Serialize)]
pub struct AnnouncementResponse {
    pub id: i32,
    pub content: String,
    pub country: Option<String>,
    pub created_at: String,
}

impl From<announcement::Model> for AnnouncementResponse {
    fn from(announcement: announcement::Model) -> Self {
        Self {
            id: announcement.id,
            content: announcement.content,
            country: announcement.country,
            created_at: announcement.created_at.to_rfc3339(),
        }
    }
}

pub async fn list_announcements(
    State(state): State<AppState>,
    identity: Identity
) -> Result<Json<Vec<AnnouncementResponse>>> {
    let announcements = state.announcement_service.list_for_country(&identity.country).await?;
    Ok(Json(announcements.into_iter().map(Into::into).collect()))
}
