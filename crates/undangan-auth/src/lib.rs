//! Undangan Auth — credential hashing/verification, access and refresh
//! token issuance, and the admin login/refresh/logout service.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::{AuthConfig, HashCost};
pub use error::AuthError;
pub use service::{AuthService, LoginInput, LoginOutput, RefreshOutput};
pub use token::AccessTokenClaims;
