use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ─── Role ────────────────────────────────────────────────────────────

/// Account role. Admins review withdrawals and manage the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Canonical string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(AppError::InvalidInput(format!("Invalid role: {}. Supported: user, admin", s))),
        }
    }
}

// ─── ReferralStatus ──────────────────────────────────────────────────

/// Lifecycle of a referral bonus.
///
/// A referral is created `Pending` when the referred user registers. The
/// referred user's first completed task settles it to `Paid`; an admin may
/// instead move it to `Blocked`. Both are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    Pending,
    Paid,
    Blocked,
}

impl ReferralStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralStatus::Pending => "pending",
            ReferralStatus::Paid => "paid",
            ReferralStatus::Blocked => "blocked",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReferralStatus::Pending)
    }

    /// Legal moves are `pending -> paid` and `pending -> blocked`.
    pub fn can_transition_to(&self, next: ReferralStatus) -> bool {
        matches!(
            (self, next),
            (ReferralStatus::Pending, ReferralStatus::Paid) |
                (ReferralStatus::Pending, ReferralStatus::Blocked)
        )
    }
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferralStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ReferralStatus::Pending),
            "paid" => Ok(ReferralStatus::Paid),
            "blocked" => Ok(ReferralStatus::Blocked),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid referral status: {}. Supported: pending, paid, blocked",
                s
            ))),
        }
    }
}

// ─── WithdrawalStatus ────────────────────────────────────────────────

/// Review state of a withdrawal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, WithdrawalStatus::Pending)
    }

    pub fn can_transition_to(&self, next: WithdrawalStatus) -> bool {
        matches!(self, WithdrawalStatus::Pending) && next.is_terminal()
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WithdrawalStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(WithdrawalStatus::Pending),
            "approved" => Ok(WithdrawalStatus::Approved),
            "rejected" => Ok(WithdrawalStatus::Rejected),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid withdrawal status: {}. Supported: pending, approved, rejected",
                s
            ))),
        }
    }
}

// ─── Network ─────────────────────────────────────────────────────────

/// USDT payout network for withdrawals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Network {
    Trc20,
    Erc20,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Trc20 => "TRC20",
            Network::Erc20 => "ERC20",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRC20" | "TRON" => Ok(Network::Trc20),
            "ERC20" | "ETH" | "ETHEREUM" => Ok(Network::Erc20),
            _ => Err(AppError::InvalidInput(format!(
                "Unsupported network: {}. Supported: TRC20, ERC20",
                s
            ))),
        }
    }
}
