//! User profiles and their aggregate counters.
//!
//! Profiles are created lazily: the view layer calls `ensure_profile`
//! from its auth-state callback, and `register_profile` right after
//! sign-up when the user picked a display name and role.

use std::sync::Arc;

use chrono::Utc;
use ib_core::document::{collections, from_document, to_document};
use ib_core::error::Result;
use ib_core::models::{Principal, Role, User};
use ib_core::traits::DocumentStore;

pub struct ProfileManager {
    store: Arc<dyn DocumentStore>,
}

impl ProfileManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Returns the existing profile, or creates the default one on first
    /// authentication. Idempotent; repeated calls are plain reads.
    pub async fn ensure_profile(&self, principal: &Principal) -> Result<User> {
        self.get_or_create(principal, None, Role::Student).await
    }

    /// Registration-time variant with a caller-chosen name and role.
    /// An existing profile is returned unchanged.
    pub async fn register_profile(
        &self,
        principal: &Principal,
        name: &str,
        role: Role,
    ) -> Result<User> {
        self.get_or_create(principal, Some(name), role).await
    }

    async fn get_or_create(
        &self,
        principal: &Principal,
        name: Option<&str>,
        role: Role,
    ) -> Result<User> {
        let key = principal.id.to_string();
        if let Some(doc) = self.store.get(collections::USERS, &key).await? {
            return Ok(from_document(doc)?);
        }

        let now = Utc::now();
        let user = User {
            id: principal.id,
            name: name
                .map(str::to_string)
                .or_else(|| principal.display_name.clone())
                .unwrap_or_else(|| local_part(&principal.email).to_string()),
            email: principal.email.clone(),
            role,
            ideas_count: 0,
            votes_count: 0,
            comments_count: 0,
            created_at: now,
            last_activity: now,
        };
        self.store
            .insert(collections::USERS, &key, to_document(&user)?)
            .await?;

        tracing::info!(user = %key, role = role.label(), "profile created");
        Ok(user)
    }
}

/// Fallback display name: the local part of the email address.
fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}
