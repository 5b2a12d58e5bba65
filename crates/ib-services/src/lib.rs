//! # Ideaboard Services
//!
//! The idea/vote/comment consistency engine: profile management, idea
//! CRUD and listing, vote toggling, and comments, all written against the
//! `DocumentStore` port. Rendering and session handling live elsewhere;
//! every operation here takes the acting profile explicitly.

pub mod comments;
pub mod ideas;
pub mod profile;
pub mod votes;

pub use comments::CommentRepository;
pub use ideas::IdeaRepository;
pub use profile::ProfileManager;
pub use votes::{VoteCoordinator, VoteOutcome};

/// Attempt cap for optimistic-transaction retry loops. Conflicts under
/// the cap never reach a caller; exhaustion degrades to a store error.
/// Every conflict means some other writer committed, so a loop of N
/// attempts tolerates N-1 competing commits on the same document.
pub(crate) const MAX_TXN_ATTEMPTS: u32 = 10;
