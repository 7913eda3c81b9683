//! Admin authentication service: login, refresh, logout and session
//! housekeeping.
//!
//! Refresh does not rotate the raw token: a successful refresh only
//! slides the session's expiry forward by a full refresh TTL.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use undangan_core::clock::{Clock, SystemClock};
use undangan_core::error::{UndanganError, UndanganResult};
use undangan_core::models::session::CreateSession;
use undangan_core::models::user::User;
use undangan_core::repository::{SessionRepository, UserRepository};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token::{self, AccessTokenClaims};

/// Verified against when the email is unknown, so both login failure
/// causes do the same work.
const TIMING_DECOY_PASSWORD: &str = "undangan-timing-decoy";

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    pub user_id: Uuid,
    /// Signed JWT access token.
    pub access_token: String,
    /// Raw opaque refresh token (return to client, not stored).
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Successful refresh result.
#[derive(Debug)]
pub struct RefreshOutput {
    pub access_token: String,
    /// The session's new expiry; the refresh token itself is unchanged.
    pub refresh_expires_at: DateTime<Utc>,
    pub expires_in: u64,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<U: UserRepository, S: SessionRepository, C: Clock = SystemClock> {
    user_repo: U,
    session_repo: S,
    config: AuthConfig,
    clock: C,
    decoy_hash: OnceLock<String>,
}

impl<U: UserRepository, S: SessionRepository> AuthService<U, S, SystemClock> {
    pub fn new(user_repo: U, session_repo: S, config: AuthConfig) -> Self {
        Self::with_clock(user_repo, session_repo, config, SystemClock)
    }
}

impl<U: UserRepository, S: SessionRepository, C: Clock> AuthService<U, S, C> {
    pub fn with_clock(user_repo: U, session_repo: S, config: AuthConfig, clock: C) -> Self {
        Self {
            user_repo,
            session_repo,
            config,
            clock,
            decoy_hash: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn refresh_ttl(&self) -> Duration {
        Duration::seconds(self.config.refresh_token_lifetime_secs as i64)
    }

    fn decoy_hash(&self) -> Result<&str, AuthError> {
        if let Some(hash) = self.decoy_hash.get() {
            return Ok(hash);
        }
        let hash = password::hash_password(
            TIMING_DECOY_PASSWORD,
            self.config.pepper.as_deref(),
            self.config.hash_cost.as_ref(),
        )?;
        Ok(self.decoy_hash.get_or_init(|| hash))
    }

    /// Authenticate an admin by email + password and issue tokens.
    ///
    /// Unknown email and wrong password both yield
    /// [`UndanganError::InvalidCredentials`].
    pub async fn login(&self, input: LoginInput) -> UndanganResult<LoginOutput> {
        let email = input.email.trim().to_lowercase();

        // 1. Look up user.
        let user = match self.user_repo.get_by_email(&email).await {
            Ok(u) => Some(u),
            Err(UndanganError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };

        // 2. Verify password (against a decoy when the user is unknown).
        let pepper = self.config.pepper.as_deref();
        let user: User = match user {
            Some(user) => {
                if !password::verify_password(&input.password, &user.password_hash, pepper)? {
                    debug!(user_id = %user.id, "admin login rejected");
                    return Err(AuthError::InvalidCredentials.into());
                }
                user
            }
            None => {
                password::verify_password(&input.password, self.decoy_hash()?, pepper)?;
                debug!("admin login rejected");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        // 3. Issue access token.
        let now = self.clock.now();
        let access_token = token::issue_access_token(user.id, &user.email, &self.config, now)?;

        // 4. Generate refresh token and persist only its hash.
        let (raw_refresh, token_hash) =
            token::generate_refresh_token(self.config.refresh_token_bytes)?;
        let refresh_expires_at = now + self.refresh_ttl();

        let session = self
            .session_repo
            .create(CreateSession {
                user_id: user.id,
                token_hash,
                ip_address: input.ip_address,
                user_agent: input.user_agent,
                expires_at: refresh_expires_at,
            })
            .await?;

        info!(user_id = %user.id, session_id = %session.id, "admin logged in");

        Ok(LoginOutput {
            user_id: user.id,
            access_token,
            refresh_token: raw_refresh,
            refresh_expires_at,
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    /// Exchange a refresh token for a new access token and slide the
    /// session's expiry.
    ///
    /// Unknown, revoked and expired tokens all yield
    /// [`UndanganError::InvalidRefreshToken`].
    pub async fn refresh(&self, raw_refresh_token: &str) -> UndanganResult<RefreshOutput> {
        let raw = raw_refresh_token.trim();
        if raw.is_empty() {
            return Err(AuthError::InvalidRefreshToken.into());
        }

        // 1. Look up session by token hash.
        let token_hash = token::hash_refresh_token(raw);
        let session = self
            .session_repo
            .get_by_token_hash(&token_hash)
            .await
            .map_err(|e| match e {
                UndanganError::NotFound { .. } => AuthError::InvalidRefreshToken.into(),
                other => other,
            })?;

        // 2. Reject revoked or expired sessions.
        let now = self.clock.now();
        if !session.is_active_at(now) {
            debug!(session_id = %session.id, state = ?session.state_at(now), "refresh rejected");
            return Err(AuthError::InvalidRefreshToken.into());
        }

        // 3. The owning principal must still exist.
        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .map_err(|e| match e {
                UndanganError::NotFound { .. } => AuthError::InvalidRefreshToken.into(),
                other => other,
            })?;

        // 4. Issue new access token.
        let access_token = token::issue_access_token(user.id, &user.email, &self.config, now)?;

        // 5. Extend the session. A concurrent logout wins.
        let refresh_expires_at = now + self.refresh_ttl();
        if !self
            .session_repo
            .touch(&token_hash, refresh_expires_at)
            .await?
        {
            return Err(AuthError::InvalidRefreshToken.into());
        }

        debug!(user_id = %user.id, session_id = %session.id, "session refreshed");

        Ok(RefreshOutput {
            access_token,
            refresh_expires_at,
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    /// Revoke the session behind a refresh token. Missing, empty or
    /// unknown tokens are a no-op.
    pub async fn logout(&self, raw_refresh_token: Option<&str>) -> UndanganResult<()> {
        let Some(raw) = raw_refresh_token.map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(());
        };

        let revoked = self
            .session_repo
            .revoke(&token::hash_refresh_token(raw), self.clock.now())
            .await?;
        if revoked {
            info!("admin session revoked");
        }
        Ok(())
    }

    /// Revoke all live sessions for a user (e.g. on password change).
    pub async fn revoke_all_sessions(&self, user_id: Uuid) -> UndanganResult<u64> {
        let revoked = self
            .session_repo
            .revoke_user_sessions(user_id, self.clock.now())
            .await?;
        info!(%user_id, revoked, "revoked all sessions");
        Ok(revoked)
    }

    /// Delete expired and revoked sessions; returns how many were removed.
    pub async fn cleanup_sessions(&self) -> UndanganResult<u64> {
        let removed = self.session_repo.cleanup(self.clock.now()).await?;
        debug!(removed, "session cleanup finished");
        Ok(removed)
    }

    /// Validate an access token (signature, algorithm, issuer, expiry).
    /// Stateless: no database lookup is performed.
    pub fn verify_access(&self, access_token: &str) -> UndanganResult<AccessTokenClaims> {
        token::decode_access_token(access_token, &self.config, self.clock.now()).map_err(Into::into)
    }
}
