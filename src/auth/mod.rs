//! Signed role claims.
//!
//! The role carrier is client-supplied, so its value is only trusted once the
//! server's own signature and expiry have been checked.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleClaims {
    pub sub: String,
    pub role: String,
    pub jti: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl RoleClaims {
    pub fn new(sub: impl Into<String>, role: impl Into<String>, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: sub.into(),
            role: role.into(),
            jti: Uuid::new_v4(),
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Role token secret is not configured")]
    MissingSecret,

    #[error("Role token generation error: {0}")]
    TokenGeneration(#[source] jsonwebtoken::errors::Error),

    #[error("Invalid role token: {0}")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
}

pub fn issue_role_token(claims: &RoleClaims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &encoding_key).map_err(AuthError::TokenGeneration)
}

/// Checks signature and expiry, returning the claims only when both hold.
pub fn verify_role_token(token: &str, secret: &str) -> Result<RoleClaims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);

    decode::<RoleClaims>(token.trim(), &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(AuthError::InvalidToken)
}
