pub mod config;
pub mod enums;
pub mod error;
pub mod money;
pub mod identity;
pub mod db;
pub mod services;
pub mod api;

pub use config::Config;
pub use enums::{ Role, ReferralStatus, WithdrawalStatus, Network };
pub use error::{ AppError, Result };
pub use identity::Identity;
