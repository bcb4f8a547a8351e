//! In-memory ledger
//!
//! Implements both ledger seams against a local object map, and executes
//! the `timeline` contract's two entry functions the way the on-chain
//! module does: a shared `Timeline` owning a `Table<u64, Post>`, with each
//! post stored as a dynamic field keyed by the running post count.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use super::error::{LedgerError, LedgerResult};
use super::types::{
    CallArg, ChildRef, ExecutionStatus, MoveCall, ObjectOptions, ObjectRecord, ObjectReference,
    OwnedObjectRef, Owner, SubmittedTransaction, TransactionEffects,
};
use super::{LedgerReader, TransactionSubmitter};

/// In-process ledger
pub struct MemoryLedger {
    inner: RwLock<Inner>,
    sender: String,
}

#[derive(Default)]
struct Inner {
    objects: HashMap<String, ObjectRecord>,
    children: HashMap<String, Vec<ChildRef>>,
    failing: HashSet<String>,
    transactions: HashMap<String, TransactionEffects>,
    submitted: Vec<MoveCall>,
    next_seq: u64,
}

impl Inner {
    fn fresh_id(&mut self) -> String {
        self.next_seq += 1;
        format!("0x{:064x}", self.next_seq)
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::with_sender("0x0000000000000000000000000000000000000000000000000000000000000a11")
    }

    /// Ledger whose transactions are all signed by `sender`
    pub fn with_sender(sender: impl Into<String>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            sender: sender.into(),
        }
    }

    /// Insert or replace an object
    pub async fn insert_object(&self, record: ObjectRecord) {
        let mut inner = self.inner.write().await;
        inner.objects.insert(record.object_id.clone(), record);
    }

    /// Delete an object (its children stay orphaned, as on-chain)
    pub async fn remove_object(&self, id: &str) {
        self.inner.write().await.objects.remove(id);
    }

    /// Register a dynamic child under `parent_id`
    pub async fn add_child(&self, parent_id: &str, key: Value, child_id: &str) {
        let mut inner = self.inner.write().await;
        inner
            .children
            .entry(parent_id.to_string())
            .or_default()
            .push(ChildRef::new(key, child_id));
    }

    /// Insert a dynamic field object wrapping `value` and attach it to `table_id`
    pub async fn insert_dynamic_field(&self, table_id: &str, key: Value, child_id: &str, value: Value) {
        let fields = json!({
            "id": { "id": child_id },
            "name": key.clone(),
            "value": value,
        });
        self.insert_object(ObjectRecord::move_object(
            child_id,
            "0x2::dynamic_field::Field<u64, timeline::Post>",
            fields,
        ))
        .await;
        self.add_child(table_id, key, child_id).await;
    }

    /// Make every fetch of `id` fail with a transport error
    pub async fn fail_fetch(&self, id: &str) {
        self.inner.write().await.failing.insert(id.to_string());
    }

    /// Calls submitted so far, oldest first
    pub async fn submitted_calls(&self) -> Vec<MoveCall> {
        self.inner.read().await.submitted.clone()
    }

    fn create_timeline(&self, inner: &mut Inner, call: &MoveCall) -> TransactionEffects {
        let timeline_id = inner.fresh_id();
        let table_id = inner.fresh_id();
        let post_type = format!("{}::timeline::Post", call.package);

        let fields = json!({
            "id": { "id": timeline_id },
            "post_count": "0",
            "posts": {
                "type": format!("0x2::table::Table<u64, {}>", post_type),
                "fields": { "id": { "id": table_id }, "size": "0" }
            }
        });

        let mut record = ObjectRecord::move_object(
            timeline_id.clone(),
            &format!("{}::timeline::Timeline", call.package),
            fields,
        );
        record.owner = Some(Owner::Shared {
            initial_shared_version: json!(inner.next_seq),
        });
        inner.objects.insert(timeline_id.clone(), record.clone());

        TransactionEffects {
            status: ExecutionStatus::success(),
            created: vec![OwnedObjectRef {
                owner: record.owner.unwrap_or(Owner::Immutable),
                reference: ObjectReference {
                    object_id: timeline_id,
                    version: json!(inner.next_seq),
                    digest: None,
                },
            }],
        }
    }

    fn create_post(&self, inner: &mut Inner, call: &MoveCall) -> LedgerResult<TransactionEffects> {
        let (timeline_id, content) = match call.arguments.as_slice() {
            [CallArg::Object(timeline), CallArg::String(content), ..] => {
                (timeline.clone(), content.clone())
            }
            _ => {
                return Err(LedgerError::ExecutionFailed(
                    "create_post expects (timeline, content, clock)".to_string(),
                ))
            }
        };

        let (post_id, table_id) = {
            let fields = inner
                .objects
                .get(&timeline_id)
                .and_then(ObjectRecord::move_fields)
                .ok_or_else(|| {
                    LedgerError::ExecutionFailed(format!("object {} not found", timeline_id))
                })?;
            let count = fields["post_count"]
                .as_str()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0);
            let table = fields["posts"]["fields"]["id"]["id"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            (count, table)
        };

        let child_id = inner.fresh_id();
        let timestamp = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let key = json!(post_id.to_string());

        let wrapper = json!({
            "id": { "id": child_id },
            "name": key.clone(),
            "value": {
                "type": format!("{}::timeline::Post", call.package),
                "fields": {
                    "author": self.sender,
                    "content": content,
                    "timestamp": timestamp.to_string(),
                }
            }
        });
        inner.objects.insert(
            child_id.clone(),
            ObjectRecord::move_object(
                child_id.clone(),
                &format!("0x2::dynamic_field::Field<u64, {}::timeline::Post>", call.package),
                wrapper,
            ),
        );
        inner
            .children
            .entry(table_id)
            .or_default()
            .push(ChildRef::new(key, child_id));

        if let Some(content) = inner
            .objects
            .get_mut(&timeline_id)
            .and_then(|r| r.content.as_mut())
        {
            content.fields["post_count"] = json!((post_id + 1).to_string());
        }

        Ok(TransactionEffects {
            status: ExecutionStatus::success(),
            created: Vec::new(),
        })
    }
}

#[async_trait]
impl LedgerReader for MemoryLedger {
    async fn fetch_object(
        &self,
        id: &str,
        _options: ObjectOptions,
    ) -> LedgerResult<Option<ObjectRecord>> {
        let inner = self.inner.read().await;
        if inner.failing.contains(id) {
            return Err(LedgerError::Unavailable);
        }
        Ok(inner.objects.get(id).cloned())
    }

    async fn fetch_children(&self, parent_id: &str) -> LedgerResult<Vec<ChildRef>> {
        let inner = self.inner.read().await;
        if inner.failing.contains(parent_id) {
            return Err(LedgerError::Unavailable);
        }
        Ok(inner.children.get(parent_id).cloned().unwrap_or_default())
    }

    async fn wait_for_transaction(&self, digest: &str) -> LedgerResult<TransactionEffects> {
        self.inner
            .read()
            .await
            .transactions
            .get(digest)
            .cloned()
            .ok_or_else(|| LedgerError::ConfirmationTimeout {
                digest: digest.to_string(),
                waited_ms: 0,
            })
    }
}

#[async_trait]
impl TransactionSubmitter for MemoryLedger {
    fn name(&self) -> &str {
        "memory"
    }

    async fn submit(&self, call: MoveCall) -> LedgerResult<SubmittedTransaction> {
        let mut inner = self.inner.write().await;
        inner.submitted.push(call.clone());

        let effects = match (call.module.as_str(), call.function.as_str()) {
            ("timeline", "create_timeline") => self.create_timeline(&mut inner, &call),
            ("timeline", "create_post") => self.create_post(&mut inner, &call)?,
            _ => {
                return Err(LedgerError::ExecutionFailed(format!(
                    "function {} not found",
                    call.target()
                )))
            }
        };

        inner.next_seq += 1;
        let digest = format!("tx{:08}", inner.next_seq);
        inner.transactions.insert(digest.clone(), effects);

        Ok(SubmittedTransaction { digest })
    }
}
