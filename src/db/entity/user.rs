use sea_orm::entity::prelude::*;
use serde::{ Deserialize, Serialize };

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub country: String,
    pub phone: String,
    #[sea_orm(unique)]
    pub referral_code: String,
    pub referred_by: Option<i32>,
    pub balance_task_cents: i64,
    pub balance_referral_cents: i64,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

impl Model {
    pub fn total_balance_cents(&self) -> i64 {
        self.balance_task_cents + self.balance_referral_cents
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::completed_task::Entity")]
    CompletedTask,
    #[sea_orm(has_many = "super::withdrawal::Entity")]
    Withdrawal,
}

impl Related<super::completed_task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CompletedTask.def()
    }
}

impl Related<super::withdrawal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Withdrawal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
