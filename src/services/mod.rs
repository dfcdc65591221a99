pub mod completion_service;
pub mod referral_service;
pub mod withdrawal_service;
pub mod postback_service;
pub mod user_service;
pub mod task_service;
pub mod announcement_service;

pub use completion_service::{ CompletionService, CompletionOutcome };
pub use referral_service::{ ReferralService, SettlementOutcome, CountryTerms, ReferralStats };
pub use withdrawal_service::{ WithdrawalService, WithdrawalRequest, WithdrawalWithOwner };
pub use postback_service::{ PostbackService, Postback, PostbackParams, PostbackAck };
pub use user_service::{ UserService, Registration };
pub use task_service::{ TaskService, TaskForUser };
pub use announcement_service::AnnouncementService;
