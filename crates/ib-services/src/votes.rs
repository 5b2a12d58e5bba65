//! Vote toggling.
//!
//! The one operation where a transaction is mandatory: the idea's voter
//! set, its vote count, and the voter's personal counter must move in
//! lockstep under concurrent voters, so all three writes commit together
//! against a fresh in-transaction read of the idea.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use ib_core::document::{collections, from_document, Patch};
use ib_core::error::{AppError, Result, StoreError};
use ib_core::models::{Idea, User};
use ib_core::traits::DocumentStore;

use crate::MAX_TXN_ATTEMPTS;

/// What a toggle did, for callers that render the new state immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    /// Whether the user holds a vote after the toggle.
    pub voted: bool,
    pub votes_count: u64,
}

pub struct VoteCoordinator {
    store: Arc<dyn DocumentStore>,
}

impl VoteCoordinator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Toggles `voter`'s vote on the idea.
    ///
    /// Membership decides the direction: a voter in the set is removed,
    /// anyone else is added, and `votesCount` is rewritten as the size of
    /// the updated set. Conflicts with concurrent voters are retried
    /// transparently; toggling twice restores the original state.
    pub async fn toggle_vote(&self, idea_id: Uuid, voter: &User) -> Result<VoteOutcome> {
        let idea_key = idea_id.to_string();
        let voter_key = voter.id.to_string();

        let mut attempts = 0;
        loop {
            attempts += 1;
            let mut txn = self.store.begin().await?;

            let doc = txn
                .get(collections::IDEAS, &idea_key)
                .await?
                .ok_or_else(|| AppError::NotFound("idea", idea_key.clone()))?;
            let mut idea: Idea = from_document(doc)?;

            let voted = if idea.votes.contains(&voter.id) {
                idea.votes.remove(&voter.id);
                false
            } else {
                idea.votes.insert(voter.id);
                true
            };
            let votes_count = idea.votes.len() as u64;

            txn.update(
                collections::IDEAS,
                &idea_key,
                Patch::new()
                    .set("votes", json!(idea.votes))
                    .set("votesCount", json!(votes_count))
                    .touch("updatedAt"),
            );
            txn.update(
                collections::USERS,
                &voter_key,
                Patch::new()
                    .increment("votesCount", if voted { 1 } else { -1 })
                    .touch("lastActivity"),
            );

            match txn.commit().await {
                Ok(()) => {
                    tracing::debug!(idea = %idea_key, voter = %voter_key, voted, votes_count, "vote toggled");
                    return Ok(VoteOutcome { voted, votes_count });
                }
                Err(StoreError::Conflict) if attempts < MAX_TXN_ATTEMPTS => {
                    tracing::debug!(idea = %idea_key, attempts, "vote conflict, retrying");
                }
                Err(StoreError::Conflict) => {
                    return Err(
                        StoreError::Backend("vote transaction retries exhausted".into()).into(),
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
