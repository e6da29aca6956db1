//! Transactional persistence seam shared by every workflow.
//!
//! Workflows describe the rows they need through repository traits
//! (`DirectoryRepository`, `ServiceRepository`, `EvaluatorRepository`,
//! `EvaluationRepository`) and run multi-row writes through
//! [`UnitOfWork::atomically`], so a failure anywhere in the closure leaves the
//! store exactly as it was.

mod memory;

pub use memory::{InMemoryStore, Tables};

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("constraint violated: {0}")]
    Invalid(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Runs work against a transaction handle that commits only on success.
pub trait UnitOfWork: Send + Sync {
    type Tx: Send + 'static;

    /// Stage every write made by `work`; commit them together when it returns
    /// `Ok`, discard them all otherwise.
    fn atomically<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self::Tx) -> Result<T, E>,
        E: From<RepositoryError>;

    /// Read-only access to the committed state.
    fn read<T, E, F>(&self, query: F) -> Result<T, E>
    where
        F: FnOnce(&Self::Tx) -> Result<T, E>,
        E: From<RepositoryError>;
}
