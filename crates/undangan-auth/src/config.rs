//! Authentication configuration.

use std::fmt;

use serde::Deserialize;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HashCost {
    /// Memory in KiB.
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    /// OWASP ASVS: m=19456 (19 MiB), t=2, p=1.
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Configuration for the authentication service.
#[derive(Clone)]
pub struct AuthConfig {
    /// Symmetric HMAC key for access tokens.
    pub jwt_secret: Vec<u8>,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Access token lifetime in seconds (default: 900 = 15 minutes).
    pub access_token_lifetime_secs: u64,
    /// Refresh token lifetime in seconds (default: 604_800 = 7 days).
    pub refresh_token_lifetime_secs: u64,
    /// Random bytes per refresh token (default: 48).
    pub refresh_token_bytes: usize,
    /// Optional pepper prepended to passwords before hashing/verification.
    pub pepper: Option<String>,
    /// Argon2 cost for newly minted hashes. `None` uses the library default.
    pub hash_cost: Option<HashCost>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Vec::new(),
            jwt_issuer: "undangan-admin".into(),
            access_token_lifetime_secs: 900,
            refresh_token_lifetime_secs: 604_800,
            refresh_token_bytes: 48,
            pepper: None,
            hash_cost: None,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("access_token_lifetime_secs", &self.access_token_lifetime_secs)
            .field("refresh_token_lifetime_secs", &self.refresh_token_lifetime_secs)
            .field("refresh_token_bytes", &self.refresh_token_bytes)
            .field("pepper", &self.pepper.as_ref().map(|_| "<redacted>"))
            .field("hash_cost", &self.hash_cost)
            .finish()
    }
}
