//! Authorization policy.
//!
//! Capability checks are pure functions over domain models so they are
//! testable without a store or a signed-in session. Deletion rights are
//! parameterized per entity type: ideas allow an admin override, comments
//! deliberately do not.

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Comment, Idea, Principal, Role, User};

/// Entity with a single owning author.
pub trait Owned {
    /// Whether admins may delete entities of this type they do not own.
    const ADMIN_OVERRIDE: bool;

    fn owner_id(&self) -> Uuid;
}

impl Owned for Idea {
    const ADMIN_OVERRIDE: bool = true;

    fn owner_id(&self) -> Uuid {
        self.author_id
    }
}

impl Owned for Comment {
    const ADMIN_OVERRIDE: bool = false;

    fn owner_id(&self) -> Uuid {
        self.author_id
    }
}

/// Whether `requester` may delete `entity`.
pub fn may_delete<E: Owned>(requester: &User, entity: &E) -> bool {
    requester.id == entity.owner_id() || (E::ADMIN_OVERRIDE && requester.role == Role::Admin)
}

/// Only administrators may triage idea status.
pub fn may_change_status(requester: &User) -> bool {
    requester.role == Role::Admin
}

/// Rejects operations invoked without a signed-in principal.
pub fn require_principal(principal: Option<&Principal>) -> Result<&Principal> {
    principal.ok_or(AppError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;

    use super::*;
    use crate::models::{Category, Status};

    fn user(role: Role) -> User {
        User {
            id: Uuid::now_v7(),
            name: "t".into(),
            email: "t@example.com".into(),
            role,
            ideas_count: 0,
            votes_count: 0,
            comments_count: 0,
            created_at: Utc::now(),
            last_activity: Utc::now(),
        }
    }

    fn idea_by(author: &User) -> Idea {
        Idea {
            id: Uuid::now_v7(),
            title: "title".into(),
            description: "description".into(),
            category: Category::General,
            author_id: author.id,
            author_name: author.name.clone(),
            author_role: author.role,
            status: Status::Pending,
            votes_count: 0,
            comments_count: 0,
            views: 0,
            votes: BTreeSet::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn comment_by(author: &User) -> Comment {
        Comment {
            id: Uuid::now_v7(),
            idea_id: Uuid::now_v7(),
            text: "hi".into(),
            author_id: author.id,
            author_name: author.name.clone(),
            author_role: author.role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn idea_deletion_allows_author_and_admin() {
        let author = user(Role::Student);
        let admin = user(Role::Admin);
        let stranger = user(Role::Teacher);
        let idea = idea_by(&author);

        assert!(may_delete(&author, &idea));
        assert!(may_delete(&admin, &idea));
        assert!(!may_delete(&stranger, &idea));
    }

    #[test]
    fn comment_deletion_has_no_admin_override() {
        let author = user(Role::Student);
        let admin = user(Role::Admin);
        let comment = comment_by(&author);

        assert!(may_delete(&author, &comment));
        assert!(!may_delete(&admin, &comment));
    }

    #[test]
    fn status_changes_are_admin_only() {
        assert!(may_change_status(&user(Role::Admin)));
        assert!(!may_change_status(&user(Role::Teacher)));
        assert!(!may_change_status(&user(Role::Parent)));
    }

    #[test]
    fn missing_principal_is_unauthenticated() {
        assert!(matches!(
            require_principal(None),
            Err(AppError::Unauthenticated)
        ));
    }
}
