//! Ledger Access
//!
//! Seams to the external ledger. Reading objects and waiting for
//! transaction effects goes through [`LedgerReader`]; submitting signed
//! transactions goes through [`TransactionSubmitter`]. Signing itself never
//! happens in this crate.
//!
//! ## Implementations
//!
//! - [`RpcLedgerClient`]: JSON-RPC node client (reads, confirmations)
//! - [`WalletCliSubmitter`]: shells out to the `iota` wallet CLI (writes)
//! - [`MemoryLedger`]: in-process ledger for tests and offline runs

mod error;
mod memory;
mod rpc;
mod types;
mod wallet;

pub use error::{LedgerError, LedgerResult};
pub use memory::MemoryLedger;
pub use rpc::{RpcConfig, RpcLedgerClient};
pub use types::{
    CallArg, ChildRef, ExecutionStatus, MoveCall, ObjectContent, ObjectOptions, ObjectRecord,
    ObjectReference, OwnedObjectRef, Owner, SubmittedTransaction, TransactionEffects,
    MOVE_OBJECT_KIND,
};
pub use wallet::{WalletCliConfig, WalletCliSubmitter};

use async_trait::async_trait;

/// Read capability against the ledger
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Fetch a single object. `Ok(None)` means the object does not exist.
    async fn fetch_object(
        &self,
        id: &str,
        options: ObjectOptions,
    ) -> LedgerResult<Option<ObjectRecord>>;

    /// List every dynamic child attached to `parent_id`.
    ///
    /// Implementations return the complete set, following any paging the
    /// backend uses internally.
    async fn fetch_children(&self, parent_id: &str) -> LedgerResult<Vec<ChildRef>>;

    /// Block until the transaction is visible and return its effects
    async fn wait_for_transaction(&self, digest: &str) -> LedgerResult<TransactionEffects>;
}

/// Write capability: sign and execute a Move call
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Human-readable name of the backend, used in logs
    fn name(&self) -> &str;

    /// Submit the call and return once the ledger has accepted it
    async fn submit(&self, call: MoveCall) -> LedgerResult<SubmittedTransaction>;
}
