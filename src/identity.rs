//! Per-request caller identity.
//!
//! Authentication happens upstream: an authenticating proxy verifies the
//! session and forwards the caller as `X-User-Id`, `X-User-Country` and
//! `X-User-Role`. Handlers receive the result as an [`Identity`] and pass it
//! explicitly into the services.

use axum::extract::FromRequestParts;
use axum::http::{ request::Parts, HeaderMap };
use serde::Serialize;

use crate::db::entity::user;
use crate::enums::Role;
use crate::error::{ AppError, Result };

pub const USER_ID_HEADER: &str = "x-user-id";
pub const COUNTRY_HEADER: &str = "x-user-country";
pub const ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: i32,
    pub country: String,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: i32, country: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            country: country.into(),
            role,
        }
    }

    pub fn for_user(user: &user::Model) -> Result<Self> {
        Ok(Self::new(user.id, user.country.clone(), user.role.parse()?))
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() { Ok(()) } else { Err(AppError::Forbidden) }
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        let user_id = header_value(headers, USER_ID_HEADER)?
            .parse::<i32>()
            .map_err(|_| AppError::Unauthorized)?;
        let country = header_value(headers, COUNTRY_HEADER)?.to_string();
        let role = header_value(headers, ROLE_HEADER)?
            .parse::<Role>()
            .map_err(|_| AppError::Unauthorized)?;

        Ok(Self { user_id, country, role })
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(AppError::Unauthorized)
}

impl<S> FromRequestParts<S> for Identity where S: Send + Sync {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S
    ) -> std::result::Result<Self, Self::Rejection> {
        Identity::from_headers(&parts.headers)
    }
}

/// An [`Identity`] whose role is admin; anything else is rejected with 403.
#[derive(Debug, Clone)]
pub struct AdminIdentity(pub Identity);

impl<S> FromRequestParts<S> for AdminIdentity where S: Send + Sync {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S
    ) -> std::result::Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state).await?;
        identity.require_admin()?;
        Ok(AdminIdentity(identity))
    }
}
