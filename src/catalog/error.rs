//! Catalog error types.

use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Input rejected before any store call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Passed through unchanged from the backing store
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Stored document {id} is not a valid video entry: {source}")]
    Decode {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_not_found())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_transient())
    }
}
