//! # ib-auth-simple
//!
//! Argon2-based in-memory implementation of `IdentityProvider`.
//! Error codes mirror the hosted provider the view layer was written
//! against, so its message mapping keeps working unchanged.

use std::collections::HashMap;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use ib_core::error::AuthError;
use ib_core::models::Principal;
use ib_core::traits::IdentityProvider;

/// Passwords shorter than this are rejected as weak.
pub const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    principal: Principal,
    password_hash: String,
    disabled: bool,
}

/// Accounts keyed by normalized (trimmed, lowercased) email.
#[derive(Default)]
pub struct SimpleIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
}

impl SimpleIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Administrative kill switch; disabled accounts fail authentication
    /// with `UserDisabled`.
    pub async fn set_disabled(&self, email: &str, disabled: bool) -> Result<(), AuthError> {
        let email = normalize_email(email)?;
        let mut accounts = self.accounts.write().await;
        let account = accounts.get_mut(&email).ok_or(AuthError::UserNotFound)?;
        account.disabled = disabled;
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for SimpleIdentityProvider {
    async fn register<'a>(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&'a str>,
    ) -> Result<Principal, AuthError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&email) {
            return Err(AuthError::EmailInUse);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| AuthError::Backend(err.to_string()))?
            .to_string();

        let principal = Principal {
            id: Uuid::now_v7(),
            email: email.clone(),
            display_name: display_name.map(str::to_string),
        };
        accounts.insert(
            email,
            Account {
                principal: principal.clone(),
                password_hash,
                disabled: false,
            },
        );
        Ok(principal)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let email = normalize_email(email)?;
        let accounts = self.accounts.read().await;
        let account = accounts.get(&email).ok_or(AuthError::UserNotFound)?;
        if account.disabled {
            return Err(AuthError::UserDisabled);
        }

        let parsed = PasswordHash::new(&account.password_hash)
            .map_err(|err| AuthError::Backend(err.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::WrongPassword)?;

        Ok(account.principal.clone())
    }
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_ascii_lowercase();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !well_formed {
        return Err(AuthError::InvalidEmail);
    }
    Ok(email)
}
