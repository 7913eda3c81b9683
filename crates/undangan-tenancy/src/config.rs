//! Tenancy configuration.

use std::fmt;

use undangan_auth::HashCost;
use undangan_core::domain::normalize_base_domain;

/// Settings shared by the tenancy services.
#[derive(Clone, Default)]
pub struct TenancyConfig {
    /// Parent domain customer subdomains live under, e.g. `example.com`.
    /// `None` means customers are addressed by their bare slug.
    base_domain: Option<String>,
    /// Pepper for customer passwords.
    pub pepper: Option<String>,
    /// Argon2 cost for customer password hashes.
    pub hash_cost: Option<HashCost>,
}

impl TenancyConfig {
    pub fn new(base_domain: Option<&str>) -> Self {
        Self {
            base_domain: normalize_base_domain(base_domain),
            ..Default::default()
        }
    }

    pub fn with_pepper(mut self, pepper: Option<String>) -> Self {
        self.pepper = pepper.filter(|p| !p.is_empty());
        self
    }

    pub fn with_hash_cost(mut self, cost: Option<HashCost>) -> Self {
        self.hash_cost = cost;
        self
    }

    pub fn base_domain(&self) -> Option<&str> {
        self.base_domain.as_deref()
    }
}

impl fmt::Debug for TenancyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenancyConfig")
            .field("base_domain", &self.base_domain)
            .field("pepper", &self.pepper.as_ref().map(|_| "<redacted>"))
            .field("hash_cost", &self.hash_cost)
            .finish()
    }
}
