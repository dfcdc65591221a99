use std::sync::Arc;

use argon2::password_hash::{ rand_core::OsRng, SaltString };
use argon2::{ Argon2, PasswordHash, PasswordHasher, PasswordVerifier };
use chrono::Utc;
use sea_orm::{ ActiveModelTrait, ActiveValue, DatabaseConnection, TransactionTrait };

use crate::config::AdminBootstrap;
use crate::db::entity::{ referral, user };
use crate::db::{ ledger, UserRepository };
use crate::enums::{ ReferralStatus, Role };
use crate::error::{ AppError, Result };
use crate::identity::Identity;

/// How many fresh referral codes to try before giving up.
const REFERRAL_CODE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub country: String,
    pub phone: String,
    /// Code of the user who invited this one.
    pub referral_code: Option<String>,
}

pub struct UserService {
    db: DatabaseConnection,
    repository: Arc<UserRepository>,
}

impl UserService {
    pub fn new(db: DatabaseConnection, repository: Arc<UserRepository>) -> Self {
        Self { db, repository }
    }

    /// Create an account. A valid referral code links the new user to its
    /// referrer with a pending referral, written in the same transaction.
    pub async fn register(&self, registration: Registration) -> Result<user::Model> {
        let username = required(&registration.username, "Username")?;
        let email = required(&registration.email, "Email")?;
        let country = required(&registration.country, "Country")?;
        let phone = registration.phone.trim().to_string();
        if registration.password.is_empty() {
            return Err(AppError::InvalidInput("Password is required".to_string()));
        }

        self.ensure_available(&username, &email).await?;

        let referrer = match registration.referral_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => {
                let referrer = self.repository.find_by_referral_code(code).await?;
                if referrer.is_none() {
                    tracing::info!("Ignoring unknown referral code {} for {}", code, username);
                }
                referrer
            }
            _ => None,
        };

        let password_hash = hash_password(&registration.password)?;

        for _ in 0..REFERRAL_CODE_ATTEMPTS {
            let txn = self.db.begin().await?;

            let new_user = user::ActiveModel {
                id: ActiveValue::NotSet,
                username: ActiveValue::Set(username.clone()),
                email: ActiveValue::Set(email.clone()),
                password_hash: ActiveValue::Set(password_hash.clone()),
                country: ActiveValue::Set(country.clone()),
                phone: ActiveValue::Set(phone.clone()),
                referral_code: ActiveValue::Set(generate_referral_code()),
                referred_by: ActiveValue::Set(referrer.as_ref().map(|r| r.id)),
                balance_task_cents: ActiveValue::Set(0),
                balance_referral_cents: ActiveValue::Set(0),
                role: ActiveValue::Set(Role::User.to_string()),
                is_active: ActiveValue::Set(true),
                created_at: ActiveValue::Set(Utc::now()),
            };

            let created = match new_user.insert(&txn).await {
                Ok(created) => created,
                Err(e) if ledger::is_duplicate_key(&e) => {
                    txn.rollback().await?;
                    // Lost a race on username/email, or the code collided
                    self.ensure_available(&username, &email).await?;
                    continue;
                }
                Err(e) => {
                    return Err(e.into());
                }
            };

            if let Some(referrer) = &referrer {
                let pending = referral::ActiveModel {
                    id: ActiveValue::NotSet,
                    referrer_id: ActiveValue::Set(referrer.id),
                    referred_user_id: ActiveValue::Set(created.id),
                    country: ActiveValue::Set(created.country.clone()),
                    reward_cents: ActiveValue::Set(0),
                    status: ActiveValue::Set(ReferralStatus::Pending.to_string()),
                    created_at: ActiveValue::Set(Utc::now()),
                    settled_at: ActiveValue::Set(None),
                };
                pending.insert(&txn).await?;
            }

            txn.commit().await?;

            tracing::info!(
                "Registered user {} ({}){}",
                created.id,
                created.username,
                referrer
                    .as_ref()
                    .map(|r| format!(", referred by {}", r.id))
                    .unwrap_or_default()
            );

            return Ok(created);
        }

        Err(AppError::Internal("Could not allocate a unique referral code".to_string()))
    }

    /// Check a username/password pair and return the caller's identity.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str
    ) -> Result<(user::Model, Identity)> {
        let user = self.repository
            .find_by_username(username.trim()).await?
            .ok_or(AppError::Unauthorized)?;

        if !user.is_active || !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let identity = Identity::for_user(&user)?;
        Ok((user, identity))
    }

    /// Create the configured admin, or promote and reset an existing account.
    pub async fn ensure_admin(&self, admin: &AdminBootstrap) -> Result<user::Model> {
        let password_hash = hash_password(&admin.password)?;

        if let Some(existing) = self.repository.find_by_username(&admin.username).await? {
            let mut active: user::ActiveModel = existing.into();
            active.password_hash = ActiveValue::Set(password_hash);
            active.role = ActiveValue::Set(Role::Admin.to_string());
            active.is_active = ActiveValue::Set(true);
            let updated = active.update(&self.db).await?;

            tracing::info!("Admin account {} refreshed", updated.username);
            return Ok(updated);
        }

        let registered = self.register(Registration {
            username: admin.username.clone(),
            email: admin.email.clone(),
            password: admin.password.clone(),
            country: admin.country.clone(),
            phone: String::new(),
            referral_code: None,
        }).await?;

        let mut active: user::ActiveModel = registered.into();
        active.role = ActiveValue::Set(Role::Admin.to_string());
        let promoted = active.update(&self.db).await?;

        tracing::info!("Admin account {} created", promoted.username);
        Ok(promoted)
    }

    pub async fn get_user(&self, user_id: i32) -> Result<user::Model> {
        self.repository.find_by_id(user_id).await
    }

    pub async fn list_users(&self) -> Result<Vec<user::Model>> {
        self.repository.find_all().await
    }

    async fn ensure_available(&self, username: &str, email: &str) -> Result<()> {
        if self.repository.find_by_username(username).await?.is_some() {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
        if self.repository.find_by_email(email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        Ok(())
    }
}

fn required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidInput(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Eight uppercase hex characters, e.g. `3F9A0C1B`.
pub fn generate_referral_code() -> String {
    hex::encode_upper(rand::random::<[u8; 4]>())
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e|
        AppError::Internal(format!("Invalid password hash: {}", e))
    )?;

    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed_hash).is_ok())
}
