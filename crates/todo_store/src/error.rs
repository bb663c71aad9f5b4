//! Error types for store operations.

use std::io;
use thiserror::Error;
use todo_sync_protocol::{RecordId, RecordKind};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while mutating or persisting local state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A todo was added while no list is selected.
    #[error("no active todo list selected")]
    NoActiveList,

    /// A list cannot be deleted while todos still reference it.
    #[error("todo list {list_id} still has {todo_count} todo(s)")]
    ReferentialIntegrity {
        /// The list that was to be deleted.
        list_id: RecordId,
        /// Number of todos referencing it.
        todo_count: usize,
    },

    /// The record to mutate does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Collection searched.
        kind: RecordKind,
        /// Requested id.
        id: RecordId,
    },

    /// An I/O error occurred in the backend.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A persisted record was written by a newer schema.
    #[error("record {key} has schema version {found}, newest supported is {supported}")]
    UnsupportedVersion {
        /// Record key.
        key: String,
        /// Version found in storage.
        found: u32,
        /// Newest version this build understands.
        supported: u32,
    },

    /// A persisted record has an unexpected shape.
    #[error("record corrupted: {0}")]
    Corrupted(String),

    /// Every id above the current maximum is taken.
    #[error("no {0} id left to assign")]
    IdsExhausted(RecordKind),

    /// A key cannot be used by the backend.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),
}

impl StoreError {
    /// Creates a not-found error.
    pub fn not_found(kind: RecordKind, id: RecordId) -> Self {
        Self::NotFound { kind, id }
    }

    /// Returns true if this error rejects the caller's input rather than
    /// reporting a storage failure.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            StoreError::NoActiveList
                | StoreError::ReferentialIntegrity { .. }
                | StoreError::NotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_classification() {
        assert!(StoreError::NoActiveList.is_rejection());
        assert!(StoreError::not_found(RecordKind::Todo, 9).is_rejection());
        assert!(!StoreError::Corrupted("bad".into()).is_rejection());
        assert!(!StoreError::IdsExhausted(RecordKind::Todo).is_rejection());
    }

    #[test]
    fn error_display() {
        let err = StoreError::ReferentialIntegrity {
            list_id: 2,
            todo_count: 3,
        };
        assert_eq!(err.to_string(), "todo list 2 still has 3 todo(s)");

        let err = StoreError::not_found(RecordKind::TodoList, 5);
        assert_eq!(err.to_string(), "todo list 5 not found");

        let err = StoreError::IdsExhausted(RecordKind::TodoList);
        assert_eq!(err.to_string(), "no todo list id left to assign");
    }
}
