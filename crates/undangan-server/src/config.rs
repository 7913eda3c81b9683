//! Server configuration: an optional TOML file, then environment
//! overrides.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;
use undangan_auth::{AuthConfig, HashCost};
use undangan_db::DbConfig;
use undangan_tenancy::TenancyConfig;

/// Searched in order when `UNDANGAN_CONFIG` is unset.
const CONFIG_PATHS: &[&str] = &["undangan.toml", "./config/undangan.toml"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Fewer random bytes than this would make refresh tokens guessable.
const MIN_REFRESH_TOKEN_BYTES: usize = 16;

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    pub refresh_token_bytes: usize,
    pub password_pepper: Option<String>,
    /// Argon2 cost for admin and customer password hashes. Unset uses
    /// the library default.
    pub hash_cost: Option<HashCost>,
}

impl Default for AuthSection {
    fn default() -> Self {
        let defaults = AuthConfig::default();
        Self {
            jwt_secret: String::new(),
            jwt_issuer: defaults.jwt_issuer,
            access_ttl_secs: defaults.access_token_lifetime_secs,
            refresh_ttl_secs: defaults.refresh_token_lifetime_secs,
            refresh_token_bytes: defaults.refresh_token_bytes,
            password_pepper: None,
            hash_cost: None,
        }
    }
}

impl fmt::Debug for AuthSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSection")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("refresh_token_bytes", &self.refresh_token_bytes)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "<redacted>"))
            .field("hash_cost", &self.hash_cost)
            .finish()
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for DatabaseSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSection")
            .field("url", &self.url)
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Default for DatabaseSection {
    fn default() -> Self {
        let defaults = DbConfig::default();
        Self {
            url: defaults.url,
            namespace: defaults.namespace,
            database: defaults.database,
            username: defaults.username,
            password: defaults.password,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Seconds between expired/revoked session sweeps.
    pub cleanup_interval_secs: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            cleanup_interval_secs: 3600,
        }
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedSection {
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl fmt::Debug for SeedSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedSection")
            .field("admin_email", &self.admin_email)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Secrets are redacted by each section's `Debug`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_domain: Option<String>,
    pub auth: AuthSection,
    pub database: DatabaseSection,
    pub session: SessionSection,
    pub seed: SeedSection,
}

impl ServerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// File (if any), then process environment, then validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match find_config_file() {
            Some(path) => {
                info!(?path, "Loading configuration from file");
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (the environment in production).
    /// Blank values and unparsable numbers are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get("BASE_DOMAIN") {
            self.base_domain = Some(v);
        }

        if let Some(v) = get("ADMIN_JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Some(v) = get("UNDANGAN_ACCESS_TTL_SECS").and_then(|v| v.parse().ok()) {
            self.auth.access_ttl_secs = v;
        }
        if let Some(v) = get("UNDANGAN_REFRESH_TTL_SECS").and_then(|v| v.parse().ok()) {
            self.auth.refresh_ttl_secs = v;
        }
        if let Some(v) = get("UNDANGAN_REFRESH_TOKEN_BYTES").and_then(|v| v.parse().ok()) {
            self.auth.refresh_token_bytes = v;
        }
        if let Some(v) = get("UNDANGAN_PASSWORD_PEPPER") {
            self.auth.password_pepper = Some(v);
        }
        let memory = get("UNDANGAN_HASH_MEMORY_KIB").and_then(|v| v.parse().ok());
        let iterations = get("UNDANGAN_HASH_ITERATIONS").and_then(|v| v.parse().ok());
        let parallelism = get("UNDANGAN_HASH_PARALLELISM").and_then(|v| v.parse().ok());
        if memory.is_some() || iterations.is_some() || parallelism.is_some() {
            let cost = self.auth.hash_cost.get_or_insert_with(HashCost::default);
            if let Some(v) = memory {
                cost.memory_kib = v;
            }
            if let Some(v) = iterations {
                cost.iterations = v;
            }
            if let Some(v) = parallelism {
                cost.parallelism = v;
            }
        }

        if let Some(v) = get("UNDANGAN_DB_URL") {
            self.database.url = v;
        }
        if let Some(v) = get("UNDANGAN_DB_NAMESPACE") {
            self.database.namespace = v;
        }
        if let Some(v) = get("UNDANGAN_DB_DATABASE") {
            self.database.database = v;
        }
        if let Some(v) = get("UNDANGAN_DB_USER") {
            self.database.username = v;
        }
        if let Some(v) = get("UNDANGAN_DB_PASSWORD") {
            self.database.password = v;
        }

        if let Some(v) = get("UNDANGAN_SESSION_CLEANUP_SECS").and_then(|v| v.parse().ok()) {
            self.session.cleanup_interval_secs = v;
        }

        if let Some(v) = get("ADMIN_SEED_EMAIL") {
            self.seed.admin_email = Some(v);
        }
        if let Some(v) = get("ADMIN_SEED_PASSWORD") {
            self.seed.admin_password = Some(v);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Validation(
                "ADMIN_JWT_SECRET is required".into(),
            ));
        }
        if self.auth.access_ttl_secs == 0 || self.auth.refresh_ttl_secs == 0 {
            return Err(ConfigError::Validation(
                "token lifetimes must be positive".into(),
            ));
        }
        if self.auth.refresh_token_bytes < MIN_REFRESH_TOKEN_BYTES {
            return Err(ConfigError::Validation(format!(
                "refresh_token_bytes must be at least {MIN_REFRESH_TOKEN_BYTES}"
            )));
        }
        if let Some(cost) = &self.auth.hash_cost {
            if cost.memory_kib == 0 || cost.iterations == 0 || cost.parallelism == 0 {
                return Err(ConfigError::Validation(
                    "hash cost parameters must be positive".into(),
                ));
            }
        }
        if self.session.cleanup_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "session cleanup interval must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.auth.jwt_secret.as_bytes().to_vec(),
            jwt_issuer: self.auth.jwt_issuer.clone(),
            access_token_lifetime_secs: self.auth.access_ttl_secs,
            refresh_token_lifetime_secs: self.auth.refresh_ttl_secs,
            refresh_token_bytes: self.auth.refresh_token_bytes,
            pepper: self.auth.password_pepper.clone(),
            hash_cost: self.auth.hash_cost,
        }
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.database.url.clone(),
            namespace: self.database.namespace.clone(),
            database: self.database.database.clone(),
            username: self.database.username.clone(),
            password: self.database.password.clone(),
        }
    }

    pub fn tenancy_config(&self) -> TenancyConfig {
        TenancyConfig::new(self.base_domain.as_deref())
            .with_pepper(self.auth.password_pepper.clone())
            .with_hash_cost(self.auth.hash_cost)
    }

    /// Both seed credentials, when configured.
    pub fn admin_seed(&self) -> Option<(&str, &str)> {
        match (&self.seed.admin_email, &self.seed.admin_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = env::var("UNDANGAN_CONFIG") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    CONFIG_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}
