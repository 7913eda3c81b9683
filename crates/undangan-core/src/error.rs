//! Error types for the Undangan system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UndanganError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity} ({key})")]
    AlreadyExists { entity: String, key: String },

    /// Unknown principal or wrong password. The two causes are never
    /// told apart.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Unknown, revoked or expired refresh token.
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("unable to generate unique slug from '{base}'")]
    SlugExhausted { base: String },

    #[error("customer {customer_id} has not paid")]
    CustomerNotPaid { customer_id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UndanganError {
    /// True for the "expected absence" outcome, as opposed to an
    /// infrastructure failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True when a storage uniqueness constraint on `key` rejected a write.
    pub fn is_conflict_on(&self, key: &str) -> bool {
        matches!(self, Self::AlreadyExists { key: k, .. } if k == key)
    }
}

pub type UndanganResult<T> = Result<T, UndanganError>;
