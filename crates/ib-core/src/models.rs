//! # Domain Models
//!
//! These structs represent the core entities of Ideaboard.
//! We use UUID v7 for time-ordered, globally unique identification.
//! Wire names are camelCase to match the document-store field names.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Listing cap when the caller does not override it. No cursor/pagination
/// exists beyond this cap.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Fixed key under which view layers persist the filter selection.
pub const FILTER_PREFERENCE_KEY: &str = "ideaFilters";

/// An authenticated identity as issued by the identity provider.
///
/// Role and activity counters live on the [`User`] profile, not here;
/// the Profile Manager turns a `Principal` into a `User`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
}

/// Who a user is on the board. Only `Admin` may triage idea status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Teacher,
    Parent,
    Admin,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Teacher => "Teacher",
            Role::Parent => "Parent",
            Role::Admin => "Administrator",
        }
    }
}

/// Topic bucket an idea is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    General,
    Education,
    Sports,
    Food,
    Facility,
    Events,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::General => "General",
            Category::Education => "Education",
            Category::Sports => "Sports",
            Category::Food => "Food",
            Category::Facility => "Facilities",
            Category::Events => "Events",
        }
    }
}

/// Triage state assigned by administrators. New ideas start `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Approved,
    InProgress,
    Completed,
    Rejected,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "Under review",
            Status::Approved => "Approved",
            Status::InProgress => "In progress",
            Status::Completed => "Completed",
            Status::Rejected => "Rejected",
        }
    }
}

/// Per-user profile and aggregate activity counters.
///
/// Counters are adjusted as side effects of idea/vote/comment operations
/// and never go below zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub ideas_count: u64,
    pub votes_count: u64,
    pub comments_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// A user-submitted proposal subject to voting, commenting, and triage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_role: Role,
    pub status: Status,
    pub votes_count: u64,
    pub comments_count: u64,
    pub views: u64,
    /// Exact voter identities. Invariant: `votes_count == votes.len()`.
    pub votes: BTreeSet<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A discussion entry tied to exactly one idea (by reference, not
/// embedding — the idea document never holds comment bodies).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub idea_id: Uuid,
    pub text: String,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_role: Role,
    pub created_at: DateTime<Utc>,
}

/// Submission payload for a new idea.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIdea {
    pub title: String,
    pub description: String,
    pub category: Category,
}

/// How a listing is ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdeaSort {
    /// Most recently created first.
    #[default]
    Newest,
    /// Highest vote count first. `popular` is the legacy wire name.
    #[serde(alias = "popular")]
    MostVoted,
    /// Highest comment count first.
    MostCommented,
}

/// Listing filter. Also the client preference shape view layers persist
/// under [`FILTER_PREFERENCE_KEY`]; `None` category/status round-trips as
/// the `"all"` sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdeaFilter {
    #[serde(with = "all_sentinel")]
    pub category: Option<Category>,
    #[serde(with = "all_sentinel")]
    pub status: Option<Status>,
    pub sort_by: IdeaSort,
    pub limit: usize,
}

impl Default for IdeaFilter {
    fn default() -> Self {
        Self {
            category: None,
            status: None,
            sort_by: IdeaSort::Newest,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

/// `"all"` ⇄ `None` on the wire.
mod all_sentinel {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => "all".serialize(serializer),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: serde::de::DeserializeOwned,
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        if raw.as_str() == Some("all") {
            return Ok(None);
        }
        serde_json::from_value(raw).map(Some).map_err(D::Error::custom)
    }
}
