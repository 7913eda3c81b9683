//! Authentication error types.

use thiserror::Error;
use undangan_core::error::UndanganError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid refresh token")]
    InvalidRefreshToken,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for UndanganError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => UndanganError::InvalidCredentials,
            AuthError::InvalidRefreshToken => UndanganError::InvalidRefreshToken,
            AuthError::TokenExpired | AuthError::TokenInvalid(_) => {
                UndanganError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            AuthError::Crypto(msg) => UndanganError::Crypto(msg),
        }
    }
}
