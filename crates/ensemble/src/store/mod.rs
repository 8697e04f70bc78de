//! Persistence contracts shared by the repositories, plus the in-memory store.

mod memory;

pub use memory::InMemoryStore;

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Allocates record identifiers. Every repository owns its own sequence.
pub trait IdSource: Send + Sync {
    /// Returns a prefixed identifier such as `team-000042`.
    fn next_id(&self, prefix: &str) -> String;
}
