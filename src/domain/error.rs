//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the lineage model's preconditions.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("phylogeny has no root clade: {0}")]
    MissingRootClade(String),

    #[error("clade has no associated cell: {clade} (phylogeny {phylogeny})")]
    MissingCell { phylogeny: String, clade: String },

    #[error("threshold must be a finite number, got {0}")]
    InvalidThreshold(f64),

    #[error("fluorescence channel name must not be empty")]
    InvalidChannel,

    #[error("duplicate cell id in metadata: {0}")]
    DuplicateCell(String),

    #[error("duplicate clade name in forest: {0}")]
    DuplicateClade(String),

    #[error("malformed lineage in phylogeny {phylogeny}: {message}")]
    MalformedLineage { phylogeny: String, message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
