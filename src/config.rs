use std::env;

use crate::money;

/// Amounts used when no per-country setting or postback payout is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardDefaults {
    /// Credited for a postback without `payout` whose task is unknown.
    pub task_reward_cents: i64,
    pub referral_reward_cents: i64,
    pub min_withdrawal_cents: i64,
}

impl Default for RewardDefaults {
    fn default() -> Self {
        Self {
            task_reward_cents: 50,
            referral_reward_cents: 50,
            min_withdrawal_cents: 2000,
        }
    }
}

/// Admin account created or promoted on startup.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub email: String,
    pub password: String,
    pub country: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub defaults: RewardDefaults,
    pub admin: Option<AdminBootstrap>,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()?;

        let fallback = RewardDefaults::default();
        let defaults = RewardDefaults {
            task_reward_cents: Self::amount_var("DEFAULT_TASK_REWARD", fallback.task_reward_cents)?,
            referral_reward_cents: Self::amount_var(
                "DEFAULT_REFERRAL_REWARD",
                fallback.referral_reward_cents
            )?,
            min_withdrawal_cents: Self::amount_var(
                "DEFAULT_MIN_WITHDRAWAL",
                fallback.min_withdrawal_cents
            )?,
        };

        // Admin bootstrap only runs when both credentials are present
        let admin = match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
            (Ok(username), Ok(password)) => {
                let email = env::var("ADMIN_EMAIL").unwrap_or_else(|_| format!("{}@localhost", username));
                let country = env::var("ADMIN_COUNTRY").unwrap_or_else(|_| "USA".to_string());
                Some(AdminBootstrap { username, email, password, country })
            }
            _ => None,
        };

        Ok(Config {
            database_url,
            server_host,
            server_port,
            defaults,
            admin,
        })
    }

    /// Config with default amounts and no admin bootstrap.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Config {
            database_url: database_url.into(),
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            defaults: RewardDefaults::default(),
            admin: None,
        }
    }

    fn amount_var(key: &str, default_cents: i64) -> Result<i64, Box<dyn std::error::Error>> {
        match env::var(key) {
            Ok(value) => Self::parse_amount(key, &value),
            Err(_) => Ok(default_cents),
        }
    }

    fn parse_amount(key: &str, value: &str) -> Result<i64, Box<dyn std::error::Error>> {
        let cents = money::parse_cents(value).map_err(|e| format!("{} is invalid: {}", key, e))?;
        if cents < 0 {
            return Err(format!("{} must not be negative", key).into());
        }
        Ok(cents)
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_amounts() {
        let defaults = RewardDefaults::default();
        assert_eq!(defaults.task_reward_cents, 50);
        assert_eq!(defaults.referral_reward_cents, 50);
        assert_eq!(defaults.min_withdrawal_cents, 2000);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(Config::parse_amount("X", "1.25").unwrap(), 125);
        assert!(Config::parse_amount("X", "-1").is_err());
        assert!(Config::parse_amount("X", "lots").is_err());
    }

    #[test]
    fn test_for_database() {
        let config = Config::for_database("sqlite::memory:");
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.server_addr(), "127.0.0.1:8080");
        assert!(config.admin.is_none());
    }
}
