//! Admin principal seeding.

use tracing::info;
use undangan_auth::{AuthConfig, password};
use undangan_core::error::UndanganResult;
use undangan_core::models::user::CreateUser;
use undangan_core::repository::UserRepository;

/// Make sure an admin with `email` exists. An existing admin keeps its
/// password. Returns whether a principal was created.
pub async fn seed_admin<U: UserRepository>(
    users: &U,
    config: &AuthConfig,
    email: &str,
    plain_password: &str,
) -> UndanganResult<bool> {
    let email = email.trim().to_lowercase();

    match users.get_by_email(&email).await {
        Ok(_) => return Ok(false),
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e),
    }

    let password_hash = password::hash_password(
        plain_password.trim(),
        config.pepper.as_deref(),
        config.hash_cost.as_ref(),
    )?;
    let user = users
        .create(CreateUser {
            email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "seeded admin user");
    Ok(true)
}
