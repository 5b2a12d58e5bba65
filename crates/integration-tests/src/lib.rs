//! Shared fixtures for the behavioral test suite.
//!
//! Tests run against the real memory store so every assertion reads the
//! committed state back instead of trusting in-process copies.

use std::sync::Arc;

use ib_core::document::{collections, from_document};
use ib_core::models::{Category, Idea, NewIdea, Principal, Role, User};
use ib_core::traits::DocumentStore;
use ib_services::ProfileManager;
use ib_store_memory::MemoryStore;
use uuid::Uuid;

pub fn memory_store() -> Arc<dyn DocumentStore> {
    Arc::new(MemoryStore::new())
}

pub fn principal(name: &str) -> Principal {
    Principal {
        id: Uuid::now_v7(),
        email: format!("{}@school.example", name.to_lowercase()),
        display_name: Some(name.to_string()),
    }
}

/// Registers a profile the way the view layer does after sign-up.
pub async fn seed_user(store: &Arc<dyn DocumentStore>, name: &str, role: Role) -> User {
    ProfileManager::new(Arc::clone(store))
        .register_profile(&principal(name), name, role)
        .await
        .expect("profile creation")
}

pub fn submission(title: &str, description: &str) -> NewIdea {
    NewIdea {
        title: title.into(),
        description: description.into(),
        category: Category::General,
    }
}

/// Reads committed idea state back from the store.
pub async fn reload_idea(store: &Arc<dyn DocumentStore>, id: Uuid) -> Idea {
    let doc = store
        .get(collections::IDEAS, &id.to_string())
        .await
        .expect("store read")
        .expect("idea exists");
    from_document(doc).expect("idea decodes")
}

/// Reads committed profile state back from the store.
pub async fn reload_user(store: &Arc<dyn DocumentStore>, id: Uuid) -> User {
    let doc = store
        .get(collections::USERS, &id.to_string())
        .await
        .expect("store read")
        .expect("user exists");
    from_document(doc).expect("user decodes")
}
