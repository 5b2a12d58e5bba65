//! ideaboard/crates/ib-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Ideaboard.

pub mod document;
pub mod error;
pub mod models;
pub mod policy;
pub mod traits;

// Re-exporting for easier access in other crates
pub use document::*;
pub use error::*;
pub use models::*;
pub use traits::*;

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use uuid::Uuid;

    use super::models::*;

    #[test]
    fn test_idea_creation_v7() {
        let id = Uuid::now_v7();
        let idea = Idea {
            id,
            title: "Longer lunch break".to_string(),
            description: "Thirty minutes is not enough to eat and rest.".to_string(),
            category: Category::Food,
            author_id: Uuid::now_v7(),
            author_name: "dasha".to_string(),
            author_role: Role::Student,
            status: Status::Pending,
            votes_count: 0,
            comments_count: 0,
            views: 0,
            votes: BTreeSet::new(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        assert_eq!(idea.id, id);
        assert_eq!(idea.status, Status::Pending);
        assert_eq!(idea.votes_count as usize, idea.votes.len());
    }
}
