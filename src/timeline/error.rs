//! Timeline action errors

use thiserror::Error;

use crate::ledger::LedgerError;
use crate::post::ValidationError;
use crate::reconcile::ReconcileError;
use crate::store::StoreError;

/// Errors surfaced by timeline actions
#[derive(Error, Debug)]
pub enum TimelineError {
    #[error("Package ID not configured")]
    PackageNotConfigured,

    #[error("Timeline not initialized")]
    NotInitialized,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Transaction {digest} did not create a shared timeline object")]
    NoTimelineCreated { digest: String },

    #[error("Local storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for timeline actions
pub type TimelineResult<T> = Result<T, TimelineError>;
