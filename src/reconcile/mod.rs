//! Post Reconciliation
//!
//! Rebuilds a timeline's post list from raw ledger records.
//!
//! ## Data Flow
//!
//! 1. Fetch the timeline object; anything but a Move object means the id is stale
//! 2. Read the post counter and resolve the post table reference
//! 3. Enumerate the table's dynamic fields
//! 4. Fetch every field concurrently; failures are logged and skipped
//! 5. Extract and validate each payload, de-duplicate by id, sort newest first
//!
//! The result is rebuilt from scratch on every run; nothing is cached here.

mod error;
mod payload;
mod table_ref;

pub use error::{ReconcileError, ReconcileResult};
pub use payload::{extract_post, parse_counter, parse_post_key, PayloadRejection};
pub use table_ref::{resolve_table_ref, TableRefStrategy, TABLE_REF_STRATEGIES};

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ledger::{ChildRef, LedgerReader, ObjectOptions};
use crate::post::Post;

/// Configuration for reconciliation runs
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Upper bound on in-flight child fetches
    pub max_concurrent_fetches: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 8,
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineSnapshot {
    pub timeline_id: String,
    /// Counter stored on the timeline object
    pub post_count: u64,
    /// Posts, newest first
    pub posts: Vec<Post>,
    /// Children that were enumerated but did not yield a post
    pub skipped: usize,
}

/// Rebuilds post lists from a ledger reader
pub struct Reconciler {
    reader: Arc<dyn LedgerReader>,
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(reader: Arc<dyn LedgerReader>, config: ReconcileConfig) -> Self {
        Self { reader, config }
    }

    /// Run one reconciliation for `timeline_id`
    pub async fn reconcile(&self, timeline_id: &str) -> ReconcileResult<TimelineSnapshot> {
        let record = self
            .reader
            .fetch_object(timeline_id, ObjectOptions::content())
            .await?;

        let fields = match record.as_ref().and_then(|r| r.move_fields()) {
            Some(fields) => fields,
            None => {
                tracing::warn!(timeline_id, "Timeline object not found, id is stale");
                return Err(ReconcileError::TimelineNotFound {
                    timeline_id: timeline_id.to_string(),
                });
            }
        };

        let post_count = fields.get("post_count").map(parse_counter).unwrap_or(0);

        let table_id = resolve_table_ref(fields).ok_or_else(|| {
            tracing::error!(timeline_id, "Timeline has no resolvable posts table");
            ReconcileError::TableUnresolvable {
                timeline_id: timeline_id.to_string(),
            }
        })?;

        let children = self.reader.fetch_children(&table_id).await?;
        let enumerated = children.len();

        tracing::debug!(
            timeline_id,
            table_id = %table_id,
            post_count,
            children = enumerated,
            "Fetching timeline posts"
        );

        let posts = self.collect_posts(children).await;
        let skipped = enumerated - posts.len();

        if skipped > 0 {
            tracing::info!(timeline_id, skipped, "Some timeline entries were skipped");
        }

        Ok(TimelineSnapshot {
            timeline_id: timeline_id.to_string(),
            post_count,
            posts,
            skipped,
        })
    }

    /// Fetch and extract every child; per-child failures never escape
    async fn collect_posts(&self, children: Vec<ChildRef>) -> Vec<Post> {
        let reader = &self.reader;
        let fetched: Vec<_> = stream::iter(children)
            .map(|child| async move {
                let result = reader
                    .fetch_object(&child.child_id, ObjectOptions::content())
                    .await;
                (child, result)
            })
            .buffered(self.config.max_concurrent_fetches.max(1))
            .collect()
            .await;

        let mut by_id: BTreeMap<u64, Post> = BTreeMap::new();

        for (child, result) in fetched {
            let record = match result {
                Ok(Some(record)) => record,
                Ok(None) => {
                    tracing::warn!(child_id = %child.child_id, "Post object disappeared");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(child_id = %child.child_id, error = %e, "Failed to fetch post");
                    continue;
                }
            };

            match extract_post(&child.key, &record) {
                Ok(post) => {
                    if by_id.contains_key(&post.id) {
                        tracing::debug!(post_id = post.id, "Duplicate post key ignored");
                    } else {
                        by_id.insert(post.id, post);
                    }
                }
                Err(reason) => {
                    tracing::warn!(child_id = %child.child_id, key = %child.key, %reason, "Skipping malformed post");
                }
            }
        }

        by_id.into_values().rev().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{MemoryLedger, ObjectRecord};
    use serde_json::{json, Value};

    const TIMELINE: &str = "0xtimeline";
    const TABLE: &str = "0xtable";

    fn timeline_record(post_count: Value) -> ObjectRecord {
        ObjectRecord::move_object(
            TIMELINE,
            "0xpkg::timeline::Timeline",
            json!({
                "id": { "id": TIMELINE },
                "post_count": post_count,
                "posts": {
                    "type": "0x2::table::Table<u64, 0xpkg::timeline::Post>",
                    "fields": { "id": { "id": TABLE }, "size": "0" }
                }
            }),
        )
    }

    fn post_value(author: &str, content: &str, ts: u64) -> Value {
        json!({
            "type": "0xpkg::timeline::Post",
            "fields": { "author": author, "content": content, "timestamp": ts.to_string() }
        })
    }

    fn reconciler(ledger: Arc<MemoryLedger>) -> Reconciler {
        Reconciler::new(ledger, ReconcileConfig::default())
    }

    #[tokio::test]
    async fn test_mixed_children_yield_only_valid_posts() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.insert_object(timeline_record(json!("3"))).await;
        ledger
            .insert_dynamic_field(TABLE, json!("0"), "0xc0", post_value("0xA", "hi", 10))
            .await;
        ledger
            .insert_dynamic_field(TABLE, json!("1"), "0xc1", post_value("", "bad", 11))
            .await;
        ledger
            .insert_dynamic_field(TABLE, json!("2"), "0xc2", post_value("0xC", "lost", 12))
            .await;
        ledger.fail_fetch("0xc2").await;

        let snapshot = reconciler(ledger).reconcile(TIMELINE).await.unwrap();

        assert_eq!(snapshot.post_count, 3);
        assert_eq!(snapshot.skipped, 2);
        assert_eq!(
            snapshot.posts,
            vec![Post {
                id: 0,
                author: "0xA".to_string(),
                content: "hi".to_string(),
                timestamp: 10,
            }]
        );
    }

    #[tokio::test]
    async fn test_posts_sorted_newest_first() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.insert_object(timeline_record(json!("4"))).await;
        for (key, child) in [("2", "0xc2"), ("0", "0xc0"), ("3", "0xc3"), ("1", "0xc1")] {
            ledger
                .insert_dynamic_field(TABLE, json!(key), child, post_value("0xA", key, 0))
                .await;
        }

        let snapshot = reconciler(ledger).reconcile(TIMELINE).await.unwrap();
        let ids: Vec<u64> = snapshot.posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 2, 1, 0]);
    }

    #[tokio::test]
    async fn test_numeric_and_string_keys() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.insert_object(timeline_record(json!(3))).await;
        ledger
            .insert_dynamic_field(TABLE, json!(7), "0xc7", post_value("0xA", "number", 0))
            .await;
        ledger
            .insert_dynamic_field(TABLE, json!("8"), "0xc8", post_value("0xA", "string", 0))
            .await;
        ledger
            .insert_dynamic_field(TABLE, json!("eight"), "0xcx", post_value("0xA", "bad key", 0))
            .await;

        let snapshot = reconciler(ledger).reconcile(TIMELINE).await.unwrap();
        let ids: Vec<u64> = snapshot.posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![8, 7]);
        assert_eq!(snapshot.skipped, 1);
    }

    #[tokio::test]
    async fn test_duplicate_keys_deduplicated() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.insert_object(timeline_record(json!("1"))).await;
        ledger
            .insert_dynamic_field(TABLE, json!("0"), "0xfirst", post_value("0xA", "first", 1))
            .await;
        ledger
            .insert_dynamic_field(TABLE, json!("0"), "0xsecond", post_value("0xB", "second", 2))
            .await;

        let snapshot = reconciler(ledger).reconcile(TIMELINE).await.unwrap();
        assert_eq!(snapshot.posts.len(), 1);
        assert_eq!(snapshot.posts[0].content, "first");
    }

    #[tokio::test]
    async fn test_zero_counter_string_and_integer() {
        for counter in [json!("0"), json!(0)] {
            let ledger = Arc::new(MemoryLedger::new());
            ledger.insert_object(timeline_record(counter)).await;

            let snapshot = reconciler(ledger).reconcile(TIMELINE).await.unwrap();
            assert_eq!(snapshot.post_count, 0);
            assert!(snapshot.posts.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unparseable_counter_is_zero() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.insert_object(timeline_record(json!("lots"))).await;

        let snapshot = reconciler(ledger).reconcile(TIMELINE).await.unwrap();
        assert_eq!(snapshot.post_count, 0);
    }

    #[tokio::test]
    async fn test_missing_timeline() {
        let ledger = Arc::new(MemoryLedger::new());
        let err = reconciler(ledger).reconcile(TIMELINE).await.unwrap_err();
        assert!(matches!(err, ReconcileError::TimelineNotFound { .. }));
        assert!(err.should_purge());
    }

    #[tokio::test]
    async fn test_wrong_object_kind_is_not_found() {
        let ledger = Arc::new(MemoryLedger::new());
        let mut record = timeline_record(json!("0"));
        if let Some(content) = record.content.as_mut() {
            content.data_type = "package".to_string();
        }
        ledger.insert_object(record).await;

        let err = reconciler(ledger).reconcile(TIMELINE).await.unwrap_err();
        assert!(matches!(err, ReconcileError::TimelineNotFound { .. }));
    }

    #[tokio::test]
    async fn test_fallback_table_shape() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger
            .insert_object(ObjectRecord::move_object(
                TIMELINE,
                "0xpkg::timeline::Timeline",
                json!({ "post_count": "1", "posts": { "id": TABLE } }),
            ))
            .await;
        ledger
            .insert_dynamic_field(TABLE, json!("0"), "0xc0", post_value("0xA", "hello", 1))
            .await;

        let snapshot = reconciler(ledger).reconcile(TIMELINE).await.unwrap();
        assert_eq!(snapshot.posts.len(), 1);
    }

    #[tokio::test]
    async fn test_unresolvable_table() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger
            .insert_object(ObjectRecord::move_object(
                TIMELINE,
                "0xpkg::timeline::Timeline",
                json!({ "post_count": "1", "posts": { "size": "1" } }),
            ))
            .await;

        let err = reconciler(ledger).reconcile(TIMELINE).await.unwrap_err();
        assert!(matches!(err, ReconcileError::TableUnresolvable { .. }));
        assert!(!err.should_purge());
    }

    #[tokio::test]
    async fn test_missing_posts_field_is_unresolvable() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger
            .insert_object(ObjectRecord::move_object(
                TIMELINE,
                "0xpkg::timeline::Timeline",
                json!({ "id": { "id": TIMELINE }, "post_count": "0" }),
            ))
            .await;

        let err = reconciler(ledger).reconcile(TIMELINE).await.unwrap_err();
        assert!(matches!(err, ReconcileError::TableUnresolvable { .. }));
    }

    #[tokio::test]
    async fn test_transport_failure_is_fetch_failed() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.fail_fetch(TIMELINE).await;

        let err = reconciler(Arc::clone(&ledger))
            .reconcile(TIMELINE)
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        let ledger = Arc::new(MemoryLedger::new());
        ledger.insert_object(timeline_record(json!("0"))).await;
        ledger.fail_fetch(TABLE).await;
        let err = reconciler(ledger).reconcile(TIMELINE).await.unwrap_err();
        assert!(matches!(err, ReconcileError::FetchFailed(_)));
    }
}
