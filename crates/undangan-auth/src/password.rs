//! Password hashing and verification using Argon2id.
//!
//! Hashes are self-describing PHC strings, so verification always uses
//! the parameters a hash was minted with, whatever the current
//! [`HashCost`] is.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::config::HashCost;
use crate::error::AuthError;

fn with_pepper<'a>(password: &'a str, pepper: Option<&str>, buf: &'a mut String) -> &'a [u8] {
    match pepper {
        Some(p) => {
            *buf = format!("{p}{password}");
            buf.as_bytes()
        }
        None => password.as_bytes(),
    }
}

fn hasher(cost: Option<&HashCost>) -> Result<Argon2<'static>, AuthError> {
    match cost {
        None => Ok(Argon2::default()),
        Some(cost) => {
            let params = argon2::Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
                .map_err(|e| AuthError::Crypto(format!("argon2 params error: {e}")))?;
            Ok(Argon2::new(
                argon2::Algorithm::Argon2id,
                argon2::Version::V0x13,
                params,
            ))
        }
    }
}

/// Hash a password into an Argon2id PHC string with a fresh random salt.
///
/// If `pepper` is provided it is prepended to the password first.
pub fn hash_password(
    password: &str,
    pepper: Option<&str>,
    cost: Option<&HashCost>,
) -> Result<String, AuthError> {
    let mut peppered = String::new();
    let input = with_pepper(password, pepper, &mut peppered);

    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher(cost)?
        .hash_password(input, &salt)
        .map_err(|e| AuthError::Crypto(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or
/// `Err(AuthError::Crypto)` if the stored hash is malformed. Comparison
/// is done by the argon2 verifier, never on raw bytes here.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let mut peppered = String::new();
    let input = with_pepper(password, pepper, &mut peppered);

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}
