//! Timeline State Container
//!
//! Holds the current timeline id and its reconciled posts, and exposes the
//! user-facing actions: create a timeline, post to it, refresh, clear.
//!
//! Write actions submit through a [`TransactionSubmitter`](crate::ledger::TransactionSubmitter)
//! and wait for confirmation through the reader before triggering a
//! reconciliation run.

mod error;
mod service;
mod state;

pub use error::{TimelineError, TimelineResult};
pub use service::TimelineService;
pub use state::{TimelineConfig, TimelineState, CLOCK_OBJECT_ID, MODULE_NAME};
