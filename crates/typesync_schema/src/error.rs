//! Reconciliation errors.

use crate::mapping::MappingError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors that abort reconciliation of a content type.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A required input is missing or blank. Nothing was applied.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A declared property resolves to no storage data-type definition.
    #[error("Cannot synchronize property '{property}' of content type '{content_type}': {source}")]
    UnresolvedMapping {
        content_type: String,
        property: String,
        #[source]
        source: MappingError,
    },

    /// The store failed; passed through unchanged.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
