//! # mjtimeline
//!
//! Micro-journalism timeline on an IOTA Move ledger. A user creates a shared
//! timeline object and appends short posts to it; the feed is read back by
//! scanning the timeline's post table on chain.
//!
//! ## Modules
//!
//! - [`reconcile`]: Rebuilds the ordered post list from raw ledger records
//! - [`ledger`]: Read/write seams to the ledger and their implementations
//! - [`timeline`]: State container and user actions
//! - [`store`]: Local persistence of the current timeline id
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mjtimeline::ledger::MemoryLedger;
//! use mjtimeline::store::TimelineStore;
//! use mjtimeline::timeline::{TimelineConfig, TimelineService};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ledger = Arc::new(MemoryLedger::new());
//!     let config = TimelineConfig {
//!         package_id: Some("0xpkg".to_string()),
//!         ..Default::default()
//!     };
//!     let service = TimelineService::new(
//!         ledger.clone(),
//!         ledger,
//!         TimelineStore::new("./data"),
//!         config,
//!     );
//!
//!     service.create_timeline().await?;
//!     service.create_post("Hello from the ledger").await?;
//!
//!     for post in service.snapshot().await.posts {
//!         println!("#{} {}: {}", post.id, post.short_author(), post.content);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod ledger;
pub mod post;
pub mod reconcile;
pub mod store;
pub mod timeline;

pub use post::{validate_content, Post, ValidationError};

pub use ledger::{
    LedgerError, LedgerReader, MemoryLedger, RpcConfig, RpcLedgerClient, TransactionSubmitter,
    WalletCliConfig, WalletCliSubmitter,
};

pub use reconcile::{
    resolve_table_ref, ReconcileConfig, ReconcileError, Reconciler, TimelineSnapshot,
};

pub use store::{StoreError, TimelineStore, TIMELINE_ID_KEY};

pub use timeline::{TimelineConfig, TimelineError, TimelineService, TimelineState};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig};
