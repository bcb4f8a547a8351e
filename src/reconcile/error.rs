//! Reconciliation error types

use thiserror::Error;

use crate::ledger::LedgerError;

/// Errors that stop a reconciliation run
///
/// Problems with individual posts never show up here; those entries are
/// logged and dropped.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The id does not resolve to a timeline object. The caller should drop
    /// its persisted id.
    #[error("Timeline object not found. Please create a new timeline.")]
    TimelineNotFound { timeline_id: String },

    /// The timeline exists but its post table reference has an unknown shape
    #[error("Cannot resolve posts table id from timeline object {timeline_id}")]
    TableUnresolvable { timeline_id: String },

    /// Transport failure while reading the timeline or its table
    #[error("Failed to read from ledger: {0}")]
    FetchFailed(#[from] LedgerError),
}

impl ReconcileError {
    /// Whether the caller must clear its persisted timeline id
    pub fn should_purge(&self) -> bool {
        matches!(self, ReconcileError::TimelineNotFound { .. })
    }

    /// Whether a manual retry can reasonably succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReconcileError::FetchFailed(_))
    }
}

/// Result type alias for reconciliation
pub type ReconcileResult<T> = Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let not_found = ReconcileError::TimelineNotFound {
            timeline_id: "0x1".to_string(),
        };
        assert!(not_found.should_purge());
        assert!(!not_found.is_retryable());

        let table = ReconcileError::TableUnresolvable {
            timeline_id: "0x1".to_string(),
        };
        assert!(!table.should_purge());
        assert!(!table.is_retryable());

        let fetch: ReconcileError = LedgerError::Timeout.into();
        assert!(!fetch.should_purge());
        assert!(fetch.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = ReconcileError::TimelineNotFound {
            timeline_id: "0x1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Timeline object not found. Please create a new timeline."
        );
    }
}
