//! # AppError
//!
//! Centralized error handling for the Ideaboard ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all core operations.
///
/// No variant is fatal: every failure degrades to a user-visible message
/// and an unchanged data state.
#[derive(Error, Debug)]
pub enum AppError {
    /// Referenced entity does not exist (e.g. Idea, Comment).
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),

    /// Input rejected before any store call (e.g. title too short).
    #[error("validation error: {0}")]
    Validation(String),

    /// No authenticated principal; blocks the operation before any store call.
    #[error("not signed in")]
    Unauthenticated,

    /// Principal lacks the role or ownership the operation requires.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Document store failure (network, transaction retry exhaustion).
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A specialized Result type for Ideaboard logic.
pub type Result<T> = std::result::Result<T, AppError>;

/// Failures at the document-store boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A transaction's read set went stale before commit. Retried by the
    /// calling operation; must never escape a core operation as-is.
    #[error("transaction conflict")]
    Conflict,

    /// Update/delete target does not exist.
    #[error("no document {1:?} in collection {0:?}")]
    Missing(String, String),

    /// Stored data did not match the expected shape.
    #[error("corrupt document: {0}")]
    Corrupt(String),

    /// Backend or network failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// A specialized Result type for store implementations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Identity-provider failures, mirroring the upstream provider's error codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid email format")]
    InvalidEmail,

    #[error("account disabled")]
    UserDisabled,

    #[error("no account for this email")]
    UserNotFound,

    #[error("wrong password")]
    WrongPassword,

    #[error("email already in use")]
    EmailInUse,

    #[error("password must be at least 6 characters")]
    WeakPassword,

    #[error("auth backend failure: {0}")]
    Backend(String),
}
