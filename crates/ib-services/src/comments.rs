//! Comments on ideas.
//!
//! Each mutation keeps three documents honest at once: the comment
//! itself, the parent idea's `commentsCount`, and the author's
//! `commentsCount`, so the writes run as one transaction.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use ib_core::document::{collections, from_document, to_document, Order, Patch, Query};
use ib_core::error::{AppError, Result, StoreError};
use ib_core::models::{Comment, User};
use ib_core::policy;
use ib_core::traits::DocumentStore;

use crate::MAX_TXN_ATTEMPTS;

/// Minimum trimmed comment length.
const MIN_TEXT_LEN: usize = 2;

pub struct CommentRepository {
    store: Arc<dyn DocumentStore>,
}

impl CommentRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Chronological discussion order.
    pub async fn list(&self, idea_id: Uuid) -> Result<Vec<Comment>> {
        let rows = self
            .store
            .query(
                collections::COMMENTS,
                Query::new()
                    .filter("ideaId", json!(idea_id))
                    .order_by("createdAt", Order::Asc),
            )
            .await?;
        rows.into_iter()
            .map(|(_, doc)| from_document(doc).map_err(AppError::from))
            .collect()
    }

    /// Validates and posts a comment under an existing idea.
    pub async fn create(&self, idea_id: Uuid, text: &str, author: &User) -> Result<Comment> {
        let text = text.trim();
        if text.chars().count() < MIN_TEXT_LEN {
            return Err(AppError::Validation(format!(
                "comment must be at least {MIN_TEXT_LEN} characters"
            )));
        }

        let comment = Comment {
            id: Uuid::now_v7(),
            idea_id,
            text: text.to_string(),
            author_id: author.id,
            author_name: author.name.clone(),
            author_role: author.role,
            created_at: Utc::now(),
        };
        let doc = to_document(&comment)?;
        let idea_key = idea_id.to_string();
        let comment_key = comment.id.to_string();

        let mut attempts = 0;
        loop {
            attempts += 1;
            let mut txn = self.store.begin().await?;

            // Fresh parent read: posting under a vanished idea is an error,
            // and the read guards the counter against concurrent deletes.
            txn.get(collections::IDEAS, &idea_key)
                .await?
                .ok_or_else(|| AppError::NotFound("idea", idea_key.clone()))?;

            txn.insert(collections::COMMENTS, &comment_key, doc.clone());
            txn.update(
                collections::IDEAS,
                &idea_key,
                Patch::new()
                    .increment("commentsCount", 1)
                    .touch("updatedAt"),
            );
            txn.update(
                collections::USERS,
                &author.id.to_string(),
                Patch::new()
                    .increment("commentsCount", 1)
                    .touch("lastActivity"),
            );

            match txn.commit().await {
                Ok(()) => {
                    tracing::debug!(idea = %idea_key, comment = %comment_key, "comment posted");
                    return Ok(comment);
                }
                Err(StoreError::Conflict) if attempts < MAX_TXN_ATTEMPTS => {
                    tracing::debug!(idea = %idea_key, attempts, "comment conflict, retrying");
                }
                Err(StoreError::Conflict) => {
                    return Err(
                        StoreError::Backend("comment transaction retries exhausted".into()).into(),
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Deletes a comment. Author only; administrators get no override
    /// here, unlike ideas.
    pub async fn delete(&self, comment_id: Uuid, requester: &User) -> Result<()> {
        let comment_key = comment_id.to_string();

        let mut attempts = 0;
        loop {
            attempts += 1;
            let mut txn = self.store.begin().await?;

            let doc = txn
                .get(collections::COMMENTS, &comment_key)
                .await?
                .ok_or_else(|| AppError::NotFound("comment", comment_key.clone()))?;
            let comment: Comment = from_document(doc)?;
            if !policy::may_delete(requester, &comment) {
                return Err(AppError::Forbidden(
                    "only the comment author may delete it".into(),
                ));
            }

            // A parent that already vanished is tolerated: the comment
            // still goes and the author counter still adjusts.
            let idea_key = comment.idea_id.to_string();
            let parent = txn.get(collections::IDEAS, &idea_key).await?;

            txn.delete(collections::COMMENTS, &comment_key);
            if parent.is_some() {
                txn.update(
                    collections::IDEAS,
                    &idea_key,
                    Patch::new().increment("commentsCount", -1),
                );
            }
            txn.update(
                collections::USERS,
                &comment.author_id.to_string(),
                Patch::new().increment("commentsCount", -1),
            );

            match txn.commit().await {
                Ok(()) => {
                    tracing::debug!(comment = %comment_key, "comment deleted");
                    return Ok(());
                }
                Err(StoreError::Conflict) if attempts < MAX_TXN_ATTEMPTS => {
                    tracing::debug!(comment = %comment_key, attempts, "delete conflict, retrying");
                }
                Err(StoreError::Conflict) => {
                    return Err(
                        StoreError::Backend("delete transaction retries exhausted".into()).into(),
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
