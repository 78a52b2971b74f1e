//! Authentication and authorization
//!
//! Bearer tokens are HS256 JWTs. Only validation happens here; tokens are
//! issued elsewhere. `create_token` exists for tooling and tests.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::{RecipientId, StaffId};
use domain_billing::Actor;
use domain_notification::{StaffRole, Viewer};

use crate::error::ApiError;

/// Role names carried in tokens
pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const MANAGER: &str = "manager";
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Staff id
    pub sub: String,
    #[serde(default)]
    pub name: String,
    pub roles: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
}

pub fn create_token(
    user_id: &str,
    name: &str,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(i64::try_from(expiration_secs).unwrap_or(i64::MAX / 1000));

    let claims = Claims {
        sub: user_id.to_string(),
        name: name.to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Admins hold every role
pub fn has_role(claims: &Claims, required_role: &str) -> bool {
    claims.roles.iter().any(|r| r == required_role || r == roles::ADMIN)
}

impl Claims {
    /// Fails with 403 unless one of `allowed` is held
    pub fn require_any(&self, allowed: &[&str]) -> Result<(), ApiError> {
        if allowed.iter().any(|role| has_role(self, role)) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!("Requires role: {}", allowed.join(" or "))))
        }
    }

    pub fn staff_id(&self) -> Result<StaffId, ApiError> {
        self.sub.parse().map_err(|_| ApiError::Unauthorized)
    }

    pub fn actor(&self) -> Result<Actor, ApiError> {
        let name = if self.name.trim().is_empty() { "Admin" } else { self.name.trim() };
        Ok(Actor::new(self.staff_id()?, name))
    }

    /// The notification viewer; admin outranks manager
    pub fn viewer(&self) -> Result<Viewer, ApiError> {
        let id: RecipientId = self.sub.parse().map_err(|_| ApiError::Unauthorized)?;
        let role = if self.roles.iter().any(|r| r == roles::ADMIN) {
            Some(StaffRole::Admin)
        } else if self.roles.iter().any(|r| r == roles::MANAGER) {
            Some(StaffRole::Manager)
        } else {
            None
        };
        Ok(Viewer::new(id, role))
    }
}
