//! Authentication and authorization
//!
//! Staff log in with an email and password checked against an Argon2 PHC
//! string, and receive an HS256 token carrying their id and roles.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use core_kernel::{StaffAccount, StaffDirectory};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (staff id)
    pub sub: String,
    /// Staff roles
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Missing role: {0}")]
    MissingRole(String),
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Staff directory unavailable: {0}")]
    Directory(String),
}

/// Role names carried in tokens
pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const STAFF: &str = "staff";
}

/// Creates a signed token for a staff member
pub fn create_token(
    staff_id: &str,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = i64::try_from(expiration_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or(AuthError::InvalidToken)?;

    let claims = Claims {
        sub: staff_id.to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a token and returns its claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Checks if the claims grant a role; `admin` grants every role
pub fn has_role(claims: &Claims, required_role: &str) -> bool {
    claims
        .roles
        .iter()
        .any(|r| r == required_role || r == roles::ADMIN)
}

/// Fails with `MissingRole` unless the claims grant the role
pub fn require_role(claims: &Claims, required_role: &str) -> Result<(), AuthError> {
    if has_role(claims, required_role) {
        Ok(())
    } else {
        Err(AuthError::MissingRole(required_role.to_string()))
    }
}

/// Hashes a password into an Argon2id PHC string
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Verifies a password against a stored PHC string
///
/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        warn!("stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Argon2id PHC string with the default cost parameters that no password
/// matches; verified against when the email is unknown
pub const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hash a login attempt is checked against
fn credential_hash(account: Option<&StaffAccount>) -> &str {
    account.map_or(DUMMY_PASSWORD_HASH, |a| a.password_hash.as_str())
}

/// Looks a staff member up and checks their password
///
/// Unknown emails, inactive accounts and wrong passwords all fail with
/// `InvalidCredentials`, and each of them pays for one Argon2 verification.
pub async fn authenticate(
    directory: &dyn StaffDirectory,
    email: &str,
    password: &str,
) -> Result<StaffAccount, AuthError> {
    let account = directory
        .find_by_email(email.trim())
        .await
        .map_err(|e| AuthError::Directory(e.to_string()))?;

    let verified = verify_password(password, credential_hash(account.as_ref()));

    match account {
        Some(account) if verified && account.is_active => Ok(account),
        _ => Err(AuthError::InvalidCredentials),
    }
}
