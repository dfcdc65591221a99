use sea_orm::entity::prelude::*;
use serde::{ Deserialize, Serialize };

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub country: String,
    pub smart_link: String,
    pub tag_name: String,
    pub reward_cents: i64,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::completed_task::Entity")]
    CompletedTask,
}

impl Related<super::completed_task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CompletedTask.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
