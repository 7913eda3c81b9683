//! Integration tests for the admin AuthService using in-memory SurrealDB.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use undangan_auth::password::hash_password;
use undangan_auth::token::hash_refresh_token;
use undangan_auth::{AuthConfig, AuthService, HashCost, LoginInput};
use undangan_core::clock::{Clock, ManualClock};
use undangan_core::error::UndanganError;
use undangan_core::models::session::SessionState;
use undangan_core::models::user::CreateUser;
use undangan_core::repository::{SessionRepository, UserRepository};
use undangan_db::repository::{SurrealSessionRepository, SurrealUserRepository};
use uuid::Uuid;

type Service =
    AuthService<SurrealUserRepository<Db>, SurrealSessionRepository<Db>, Arc<ManualClock>>;

const CHEAP: HashCost = HashCost {
    memory_kib: 8,
    iterations: 1,
    parallelism: 1,
};

fn test_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: b"test-secret-at-least-32-bytes-long!!".to_vec(),
        hash_cost: Some(CHEAP),
        ..Default::default()
    }
}

struct Harness {
    db: Surreal<Db>,
    clock: Arc<ManualClock>,
    service: Service,
    user_id: Uuid,
}

impl Harness {
    fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

async fn setup() -> Harness {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    undangan_db::run_migrations(&db).await.unwrap();

    let config = test_config();
    let users = SurrealUserRepository::new(db.clone());
    let user = users
        .create(CreateUser {
            email: "admin@example.com".into(),
            password_hash: hash_password("s3cret-pass", None, Some(&CHEAP)).unwrap(),
        })
        .await
        .unwrap();

    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2030, 6, 1, 8, 0, 0).unwrap(),
    ));
    let service = AuthService::with_clock(
        users,
        SurrealSessionRepository::new(db.clone()),
        config,
        clock.clone(),
    );

    Harness {
        db,
        clock,
        service,
        user_id: user.id,
    }
}

fn login_input(email: &str, password: &str) -> LoginInput {
    LoginInput {
        email: email.into(),
        password: password.into(),
        ip_address: Some("127.0.0.1".into()),
        user_agent: Some("test-agent".into()),
    }
}

#[tokio::test]
async fn login_issues_tokens() {
    let h = setup().await;
    let out = h
        .service
        .login(login_input("admin@example.com", "s3cret-pass"))
        .await
        .unwrap();

    assert_eq!(out.user_id, h.user_id);
    assert_eq!(out.expires_in, 900);
    assert_eq!(out.refresh_expires_at, h.clock_now() + Duration::days(7));
    assert!(!out.refresh_token.is_empty());

    let claims = h.service.verify_access(&out.access_token).unwrap();
    assert_eq!(claims.user_id().unwrap(), h.user_id);
    assert_eq!(claims.email, "admin@example.com");
    assert_eq!(claims.iss, "undangan-admin");
}

#[tokio::test]
async fn login_email_is_case_insensitive() {
    let h = setup().await;
    let out = h
        .service
        .login(login_input("  ADMIN@Example.com ", "s3cret-pass"))
        .await
        .unwrap();
    assert_eq!(out.user_id, h.user_id);
}

#[tokio::test]
async fn unknown_email_and_wrong_password_look_the_same() {
    let h = setup().await;

    let unknown = h
        .service
        .login(login_input("nobody@example.com", "s3cret-pass"))
        .await
        .unwrap_err();
    let wrong = h
        .service
        .login(login_input("admin@example.com", "wrong"))
        .await
        .unwrap_err();

    assert!(matches!(unknown, UndanganError::InvalidCredentials));
    assert!(matches!(wrong, UndanganError::InvalidCredentials));
    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[tokio::test]
async fn stored_session_holds_only_the_hash() {
    let h = setup().await;
    let out = h
        .service
        .login(login_input("admin@example.com", "s3cret-pass"))
        .await
        .unwrap();

    let sessions = SurrealSessionRepository::new(h.db.clone());
    let session = sessions
        .get_by_token_hash(&hash_refresh_token(&out.refresh_token))
        .await
        .unwrap();
    assert_ne!(session.token_hash, out.refresh_token);
    assert_eq!(session.user_id, h.user_id);
    assert_eq!(session.ip_address.as_deref(), Some("127.0.0.1"));
    assert_eq!(session.user_agent.as_deref(), Some("test-agent"));
}

#[tokio::test]
async fn refresh_slides_expiry_then_logout_revokes() {
    let h = setup().await;
    let login = h
        .service
        .login(login_input("admin@example.com", "s3cret-pass"))
        .await
        .unwrap();

    h.clock.advance(Duration::hours(1));
    let refreshed = h.service.refresh(&login.refresh_token).await.unwrap();
    assert!(refreshed.refresh_expires_at > login.refresh_expires_at);
    assert_eq!(refreshed.refresh_expires_at, h.clock_now() + Duration::days(7));
    h.service.verify_access(&refreshed.access_token).unwrap();

    // The same raw token keeps working after a refresh.
    h.clock.advance(Duration::minutes(5));
    h.service.refresh(&login.refresh_token).await.unwrap();

    h.service.logout(Some(&login.refresh_token)).await.unwrap();
    let err = h.service.refresh(&login.refresh_token).await.unwrap_err();
    assert!(matches!(err, UndanganError::InvalidRefreshToken));

    let sessions = SurrealSessionRepository::new(h.db.clone());
    let session = sessions
        .get_by_token_hash(&hash_refresh_token(&login.refresh_token))
        .await
        .unwrap();
    assert_eq!(session.state_at(h.clock_now()), SessionState::Revoked);
}

#[tokio::test]
async fn expired_refresh_token_is_rejected() {
    let h = setup().await;
    let login = h
        .service
        .login(login_input("admin@example.com", "s3cret-pass"))
        .await
        .unwrap();

    h.clock.set(login.refresh_expires_at);
    let err = h.service.refresh(&login.refresh_token).await.unwrap_err();
    assert!(matches!(err, UndanganError::InvalidRefreshToken));
}

#[tokio::test]
async fn unknown_and_empty_refresh_tokens_are_rejected() {
    let h = setup().await;

    for token in ["", "   ", "not-a-real-token"] {
        let err = h.service.refresh(token).await.unwrap_err();
        assert!(matches!(err, UndanganError::InvalidRefreshToken), "{token:?}");
    }
}

#[tokio::test]
async fn logout_without_token_is_a_noop() {
    let h = setup().await;
    h.service.logout(None).await.unwrap();
    h.service.logout(Some("")).await.unwrap();
    h.service.logout(Some("unknown")).await.unwrap();
}

#[tokio::test]
async fn access_token_expires_with_the_clock() {
    let h = setup().await;
    let login = h
        .service
        .login(login_input("admin@example.com", "s3cret-pass"))
        .await
        .unwrap();

    h.clock.advance(Duration::minutes(14));
    h.service.verify_access(&login.access_token).unwrap();

    h.clock.advance(Duration::minutes(2));
    let err = h.service.verify_access(&login.access_token).unwrap_err();
    assert!(matches!(err, UndanganError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn tampered_access_token_is_rejected() {
    let h = setup().await;
    let login = h
        .service
        .login(login_input("admin@example.com", "s3cret-pass"))
        .await
        .unwrap();

    let mut tampered = login.access_token.clone();
    tampered.push('x');
    assert!(h.service.verify_access(&tampered).is_err());
    assert!(h.service.verify_access("garbage").is_err());
}

#[tokio::test]
async fn revoke_all_then_cleanup() {
    let h = setup().await;
    let a = h
        .service
        .login(login_input("admin@example.com", "s3cret-pass"))
        .await
        .unwrap();
    h.service
        .login(login_input("admin@example.com", "s3cret-pass"))
        .await
        .unwrap();

    assert_eq!(h.service.revoke_all_sessions(h.user_id).await.unwrap(), 2);
    let err = h.service.refresh(&a.refresh_token).await.unwrap_err();
    assert!(matches!(err, UndanganError::InvalidRefreshToken));

    let live = h
        .service
        .login(login_input("admin@example.com", "s3cret-pass"))
        .await
        .unwrap();

    assert_eq!(h.service.cleanup_sessions().await.unwrap(), 2);
    h.service.refresh(&live.refresh_token).await.unwrap();

    h.clock.advance(Duration::days(8));
    assert_eq!(h.service.cleanup_sessions().await.unwrap(), 1);
    assert_eq!(h.service.cleanup_sessions().await.unwrap(), 0);
}
