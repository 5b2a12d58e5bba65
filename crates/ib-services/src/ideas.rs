//! Idea submission, listing, triage, and deletion.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use ib_core::document::{collections, from_document, to_document, Order, Patch, Query};
use ib_core::error::{AppError, Result, StoreError};
use ib_core::models::{Comment, Idea, IdeaFilter, IdeaSort, NewIdea, Status, User};
use ib_core::policy;
use ib_core::traits::DocumentStore;

use crate::MAX_TXN_ATTEMPTS;

/// Validation thresholds, applied after trimming whitespace.
const MIN_TITLE_LEN: usize = 3;
const MIN_DESCRIPTION_LEN: usize = 10;

pub struct IdeaRepository {
    store: Arc<dyn DocumentStore>,
}

impl IdeaRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Filtered, sorted listing capped at `filter.limit`.
    pub async fn list(&self, filter: &IdeaFilter) -> Result<Vec<Idea>> {
        let mut query = Query::new();
        if let Some(category) = filter.category {
            query = query.filter("category", json!(category));
        }
        if let Some(status) = filter.status {
            query = query.filter("status", json!(status));
        }
        query = match filter.sort_by {
            IdeaSort::Newest => query.order_by("createdAt", Order::Desc),
            IdeaSort::MostVoted => query.order_by("votesCount", Order::Desc),
            IdeaSort::MostCommented => query.order_by("commentsCount", Order::Desc),
        };

        let rows = self
            .store
            .query(collections::IDEAS, query.limit(filter.limit))
            .await?;
        rows.into_iter()
            .map(|(_, doc)| from_document(doc).map_err(AppError::from))
            .collect()
    }

    /// Point read for the details view.
    pub async fn get(&self, idea_id: Uuid) -> Result<Idea> {
        let key = idea_id.to_string();
        let doc = self
            .store
            .get(collections::IDEAS, &key)
            .await?
            .ok_or_else(|| AppError::NotFound("idea", key.clone()))?;
        Ok(from_document(doc)?)
    }

    /// Validates and persists a submission.
    ///
    /// The idea document and the author's `ideasCount`/`lastActivity`
    /// adjustment land in one transaction. The transaction reads nothing,
    /// so it cannot conflict; it only makes the pair all-or-nothing.
    pub async fn create(&self, input: NewIdea, author: &User) -> Result<Idea> {
        let title = input.title.trim();
        let description = input.description.trim();
        if title.chars().count() < MIN_TITLE_LEN {
            return Err(AppError::Validation(format!(
                "title must be at least {MIN_TITLE_LEN} characters"
            )));
        }
        if description.chars().count() < MIN_DESCRIPTION_LEN {
            return Err(AppError::Validation(format!(
                "description must be at least {MIN_DESCRIPTION_LEN} characters"
            )));
        }

        let now = Utc::now();
        let idea = Idea {
            id: Uuid::now_v7(),
            title: title.to_string(),
            description: description.to_string(),
            category: input.category,
            author_id: author.id,
            author_name: author.name.clone(),
            author_role: author.role,
            status: Status::Pending,
            votes_count: 0,
            comments_count: 0,
            views: 0,
            votes: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        };

        let mut txn = self.store.begin().await?;
        txn.insert(collections::IDEAS, &idea.id.to_string(), to_document(&idea)?);
        txn.update(
            collections::USERS,
            &author.id.to_string(),
            Patch::new().increment("ideasCount", 1).touch("lastActivity"),
        );
        txn.commit().await?;

        tracing::info!(idea = %idea.id, author = %author.id, "idea created");
        Ok(idea)
    }

    /// Deletes an idea, its comments, and the counters they back.
    ///
    /// Author or admin only. The cascade runs in the same transaction as
    /// the idea delete: every child comment is removed and each comment
    /// author's `commentsCount` is decremented alongside the idea
    /// author's `ideasCount`. A comment landing concurrently bumps the
    /// parent document and is caught by the conflict check.
    pub async fn delete(&self, idea_id: Uuid, requester: &User) -> Result<()> {
        let idea_key = idea_id.to_string();

        let mut attempts = 0;
        loop {
            attempts += 1;
            let mut txn = self.store.begin().await?;

            let doc = txn
                .get(collections::IDEAS, &idea_key)
                .await?
                .ok_or_else(|| AppError::NotFound("idea", idea_key.clone()))?;
            let idea: Idea = from_document(doc)?;
            if !policy::may_delete(requester, &idea) {
                return Err(AppError::Forbidden(
                    "only the author or an administrator may delete an idea".into(),
                ));
            }

            let comment_rows = self
                .store
                .query(
                    collections::COMMENTS,
                    Query::new().filter("ideaId", json!(idea_id)),
                )
                .await?;
            let mut removed_per_author: BTreeMap<String, i64> = BTreeMap::new();
            for (comment_id, comment_doc) in &comment_rows {
                let comment: Comment = from_document(comment_doc.clone())?;
                *removed_per_author
                    .entry(comment.author_id.to_string())
                    .or_insert(0) += 1;
                txn.delete(collections::COMMENTS, comment_id);
            }

            txn.delete(collections::IDEAS, &idea_key);
            txn.update(
                collections::USERS,
                &idea.author_id.to_string(),
                Patch::new().increment("ideasCount", -1),
            );
            for (author_key, removed) in &removed_per_author {
                txn.update(
                    collections::USERS,
                    author_key,
                    Patch::new().increment("commentsCount", -removed),
                );
            }

            match txn.commit().await {
                Ok(()) => {
                    tracing::info!(
                        idea = %idea_key,
                        comments = comment_rows.len(),
                        "idea deleted"
                    );
                    return Ok(());
                }
                Err(StoreError::Conflict) if attempts < MAX_TXN_ATTEMPTS => {
                    tracing::debug!(idea = %idea_key, attempts, "delete conflict, retrying");
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

    /// Admin-only triage.
    pub async fn update_status(
        &self,
        idea_id: Uuid,
        new_status: Status,
        requester: &User,
    ) -> Result<()> {
        if !policy::may_change_status(requester) {
            return Err(AppError::Forbidden(
                "only administrators may change idea status".into(),
            ));
        }

        let key = idea_id.to_string();
        self.store
            .update(
                collections::IDEAS,
                &key,
                Patch::new()
                    .set("status", json!(new_status))
                    .touch("updatedAt"),
            )
            .await
            .map_err(|err| match err {
                StoreError::Missing(_, _) => AppError::NotFound("idea", key.clone()),
                other => other.into(),
            })?;

        tracing::info!(idea = %key, status = new_status.label(), "status updated");
        Ok(())
    }

    /// Best-effort view telemetry. Failures are logged and swallowed;
    /// views are not a correctness-critical path.
    pub async fn increment_views(&self, idea_id: Uuid) {
        let key = idea_id.to_string();
        if let Err(err) = self
            .store
            .update(collections::IDEAS, &key, Patch::new().increment("views", 1))
            .await
        {
            tracing::warn!(idea = %key, error = %err, "view increment failed");
        }
    }
}
