//! Timeline Service
//!
//! Owns the published [`TimelineState`] and performs every action that
//! changes it. Reconciliation runs are numbered; a run's result is only
//! published if it is newer than the last published run and the timeline
//! id has not changed underneath it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::error::{TimelineError, TimelineResult};
use super::state::{TimelineConfig, TimelineState, CLOCK_OBJECT_ID, MODULE_NAME};
use crate::ledger::{CallArg, LedgerReader, MoveCall, TransactionSubmitter};
use crate::post::{validate_content, Post};
use crate::reconcile::{ReconcileConfig, ReconcileResult, Reconciler, TimelineSnapshot};
use crate::store::TimelineStore;

/// State container plus the actions that mutate it
pub struct TimelineService {
    reader: Arc<dyn LedgerReader>,
    submitter: Arc<dyn TransactionSubmitter>,
    reconciler: Reconciler,
    store: TimelineStore,
    config: TimelineConfig,
    shared: RwLock<Shared>,
    /// Token of the newest run still in flight, 0 when idle
    fetching_run: AtomicU64,
}

#[derive(Default)]
struct Shared {
    view: TimelineState,
    /// Token of the most recently started run
    latest_run: u64,
    /// Token of the run whose result is currently published
    published_run: u64,
}

impl TimelineService {
    pub fn new(
        reader: Arc<dyn LedgerReader>,
        submitter: Arc<dyn TransactionSubmitter>,
        store: TimelineStore,
        config: TimelineConfig,
    ) -> Self {
        let reconciler = Reconciler::new(
            Arc::clone(&reader),
            ReconcileConfig {
                max_concurrent_fetches: config.max_concurrent_fetches,
            },
        );

        Self {
            reader,
            submitter,
            reconciler,
            store,
            config,
            shared: RwLock::new(Shared::default()),
            fetching_run: AtomicU64::new(0),
        }
    }

    /// Copy of the current published state
    pub async fn snapshot(&self) -> TimelineState {
        let mut view = self.shared.read().await.view.clone();
        view.is_fetching_posts = self.fetching_run.load(Ordering::SeqCst) != 0;
        view
    }

    /// Restore the persisted timeline id and load its posts
    pub async fn load_persisted(&self) -> TimelineResult<Option<String>> {
        let stored = {
            let mut shared = self.shared.write().await;
            let stored = self.store.load().await?;
            if let Some(id) = &stored {
                shared.view.timeline_id = Some(id.clone());
            }
            stored
        };

        if let Some(id) = &stored {
            tracing::info!(timeline_id = %id, "Restored timeline from local storage");
            if let Err(e) = self.fetch_posts().await {
                tracing::warn!(error = %e, "Initial post fetch failed");
            }
        }

        Ok(self.shared.read().await.view.timeline_id.clone())
    }

    /// Reconcile the current timeline and publish the result
    ///
    /// Returns the posts of this run even if a newer run has already
    /// published; without a timeline id this is a no-op.
    pub async fn fetch_posts(&self) -> TimelineResult<Vec<Post>> {
        let (timeline_id, token) = {
            let mut shared = self.shared.write().await;
            let id = match shared.view.timeline_id.clone() {
                Some(id) => id,
                None => return Ok(Vec::new()),
            };
            shared.latest_run += 1;
            (id, shared.latest_run)
        };

        // Cleared on completion and also if this future is dropped mid-run
        let _in_flight = FetchGuard::start(&self.fetching_run, token);

        let result = self.reconciler.reconcile(&timeline_id).await;
        self.publish(&timeline_id, token, result).await
    }

    async fn publish(
        &self,
        timeline_id: &str,
        token: u64,
        result: ReconcileResult<TimelineSnapshot>,
    ) -> TimelineResult<Vec<Post>> {
        let mut shared = self.shared.write().await;

        let same_timeline = shared.view.timeline_id.as_deref() == Some(timeline_id);
        let newer = token > shared.published_run;

        match result {
            Ok(snapshot) => {
                if same_timeline && newer {
                    shared.published_run = token;
                    shared.view.posts = snapshot.posts.clone();
                    shared.view.error = None;
                    tracing::debug!(
                        timeline_id,
                        run = token,
                        posts = snapshot.posts.len(),
                        "Published timeline posts"
                    );
                } else {
                    tracing::debug!(timeline_id, run = token, "Discarding superseded run");
                }
                Ok(snapshot.posts)
            }
            Err(e) => {
                let purge = same_timeline && e.should_purge();

                if same_timeline && newer {
                    shared.published_run = token;
                    shared.view.error = Some(e.to_string());
                }

                if purge {
                    tracing::warn!(timeline_id, "Clearing stale timeline id");
                    shared.view.timeline_id = None;
                    shared.view.posts.clear();
                    // Store and view change under the same lock
                    if let Err(store_err) = self.store.clear().await {
                        tracing::error!(error = %store_err, "Failed to clear local storage");
                    }
                } else {
                    tracing::error!(timeline_id, error = %e, "Error fetching posts");
                }

                Err(e.into())
            }
        }
    }

    /// Create a new shared timeline and make it current
    pub async fn create_timeline(&self) -> TimelineResult<String> {
        self.begin_action().await;
        let result = self.submit_create_timeline().await;
        self.finish_action(&result).await;

        let timeline_id = result?;
        if let Err(e) = self.fetch_posts().await {
            tracing::warn!(error = %e, "Post fetch after timeline creation failed");
        }
        Ok(timeline_id)
    }

    async fn submit_create_timeline(&self) -> TimelineResult<String> {
        let package = self.package_id()?;
        let call = MoveCall::new(package, MODULE_NAME, "create_timeline");

        let tx = self.submitter.submit(call).await?;
        self.record_digest(&tx.digest).await;

        let effects = self.reader.wait_for_transaction(&tx.digest).await?;
        let timeline_id = effects
            .first_shared_created()
            .ok_or_else(|| TimelineError::NoTimelineCreated {
                digest: tx.digest.clone(),
            })?
            .to_string();

        {
            let mut shared = self.shared.write().await;
            self.store.save(&timeline_id).await?;
            shared.view.timeline_id = Some(timeline_id.clone());
            shared.view.posts.clear();
        }

        tracing::info!(
            timeline_id = %timeline_id,
            digest = %tx.digest,
            backend = self.submitter.name(),
            "Timeline created"
        );
        Ok(timeline_id)
    }

    /// Validate and submit a post, then refresh the timeline
    ///
    /// Returns the transaction digest.
    pub async fn create_post(&self, content: &str) -> TimelineResult<String> {
        self.begin_action().await;
        let result = self.submit_create_post(content).await;
        self.finish_action(&result).await;

        let digest = result?;
        if let Err(e) = self.fetch_posts().await {
            tracing::warn!(error = %e, "Post fetch after submission failed");
        }
        Ok(digest)
    }

    async fn submit_create_post(&self, content: &str) -> TimelineResult<String> {
        let package = self.package_id()?;
        let timeline_id = self
            .shared
            .read()
            .await
            .view
            .timeline_id
            .clone()
            .ok_or(TimelineError::NotInitialized)?;
        let content = validate_content(content)?;

        let call = MoveCall::new(package, MODULE_NAME, "create_post")
            .arg(CallArg::Object(timeline_id.clone()))
            .arg(CallArg::String(content))
            .arg(CallArg::Object(CLOCK_OBJECT_ID.to_string()));

        let tx = self.submitter.submit(call).await?;
        self.record_digest(&tx.digest).await;

        self.reader.wait_for_transaction(&tx.digest).await?;
        tracing::info!(timeline_id = %timeline_id, digest = %tx.digest, "Post submitted");

        // Give the node time to index the new dynamic field
        if self.config.settle_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;
        }

        Ok(tx.digest)
    }

    /// Forget the current timeline, in memory and in local storage
    pub async fn clear_timeline(&self) -> TimelineResult<()> {
        let mut shared = self.shared.write().await;
        self.store.clear().await?;
        shared.view.timeline_id = None;
        shared.view.posts.clear();
        shared.view.error = None;
        drop(shared);

        tracing::info!("Timeline cleared");
        Ok(())
    }

    /// Periodically re-run reconciliation if `poll_interval_ms` is set
    pub fn start_polling(self: Arc<Self>) -> Option<JoinHandle<()>> {
        let interval_ms = match self.config.poll_interval_ms {
            Some(ms) if ms > 0 => ms,
            _ => {
                tracing::info!("Timeline polling disabled");
                return None;
            }
        };

        tracing::info!(interval_ms, "Starting timeline polling");

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));

            // Skip the first immediate tick
            ticker.tick().await;

            loop {
                ticker.tick().await;

                if !self.shared.read().await.view.has_timeline() {
                    continue;
                }
                if let Err(e) = self.fetch_posts().await {
                    tracing::debug!(error = %e, "Scheduled refresh failed");
                }
            }
        }))
    }

    fn package_id(&self) -> TimelineResult<&str> {
        self.config
            .package_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(TimelineError::PackageNotConfigured)
    }

    async fn begin_action(&self) {
        let mut shared = self.shared.write().await;
        shared.view.is_loading = true;
        shared.view.error = None;
        shared.view.last_digest = None;
    }

    async fn record_digest(&self, digest: &str) {
        self.shared.write().await.view.last_digest = Some(digest.to_string());
    }

    async fn finish_action<T>(&self, result: &TimelineResult<T>) {
        let mut shared = self.shared.write().await;
        shared.view.is_loading = false;
        if let Err(e) = result {
            tracing::error!(error = %e, "Timeline action failed");
            shared.view.error = Some(e.to_string());
        }
    }
}

/// Marks a run as in flight for as long as it lives
struct FetchGuard<'a> {
    fetching_run: &'a AtomicU64,
    token: u64,
}

impl<'a> FetchGuard<'a> {
    fn start(fetching_run: &'a AtomicU64, token: u64) -> Self {
        fetching_run.fetch_max(token, Ordering::SeqCst);
        Self {
            fetching_run,
            token,
        }
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        // Only the newest run clears the flag
        let _ = self.fetching_run.compare_exchange(
            self.token,
            0,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}
