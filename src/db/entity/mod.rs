pub mod user;
pub mod task;
pub mod completed_task;
pub mod withdrawal;
pub mod referral;
pub mod referral_setting;
pub mod announcement;

pub use user::Entity as User;
pub use task::Entity as Task;
pub use completed_task::Entity as CompletedTask;
pub use withdrawal::Entity as Withdrawal;
pub use referral::Entity as Referral;
pub use referral_setting::Entity as ReferralSetting;
pub use announcement::Entity as Announcement;
