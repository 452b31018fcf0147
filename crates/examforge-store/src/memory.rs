//! In-memory store for dry runs and tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use examforge_core::error::StoreError;
use examforge_core::model::{RecordId, Surface};
use examforge_core::traits::{Operation, QuestionStore, StoredRecord};

type Collections = BTreeMap<(Surface, RecordId), Map<String, Value>>;

/// A `QuestionStore` that keeps records in process.
///
/// Ids are assigned sequentially from 1. Individual submit calls can be made
/// to fail, which is how partial batch failures are exercised.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Collections>,
    next_id: AtomicUsize,
    submit_calls: AtomicUsize,
    list_calls: AtomicUsize,
    /// 1-based submit call numbers that fail.
    fail_calls: HashSet<usize>,
    fail_unauthorized: bool,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the listed submit calls (1-based) fail with an API error.
    pub fn failing_on(mut self, calls: &[usize]) -> Self {
        self.fail_calls.extend(calls.iter().copied());
        self
    }

    /// Makes the failing calls report a rejected credential instead.
    pub fn unauthorized(mut self) -> Self {
        self.fail_unauthorized = true;
        self
    }

    /// Delays every call, to make progress reporting observable.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::Relaxed)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::Relaxed)
    }

    /// Every stored record of `surface`, in id order.
    pub fn records(&self, surface: Surface) -> Vec<StoredRecord> {
        self.lock()
            .iter()
            .filter(|((s, _), _)| *s == surface)
            .map(|((_, id), fields)| StoredRecord {
                id: Some(*id),
                fields: fields.clone(),
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn into_fields(record: Value) -> Result<Map<String, Value>, StoreError> {
        match record {
            Value::Object(mut fields) => {
                fields.remove("id");
                Ok(fields)
            }
            other => Err(StoreError::Api {
                status: 400,
                message: format!("expected a JSON object, got {other}"),
            }),
        }
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn submit(
        &self,
        surface: Surface,
        operation: Operation,
        record: Value,
    ) -> Result<StoredRecord, StoreError> {
        self.pause().await;
        let call = self.submit_calls.fetch_add(1, Ordering::Relaxed) + 1;
        if self.fail_calls.contains(&call) {
            return Err(if self.fail_unauthorized {
                StoreError::Unauthorized("token expired".into())
            } else {
                StoreError::Api {
                    status: 500,
                    message: format!("injected failure on call {call}"),
                }
            });
        }

        let mut records = self.lock();
        match operation {
            Operation::Create => {
                let id = (self.next_id.fetch_add(1, Ordering::Relaxed) + 1) as RecordId;
                let fields = Self::into_fields(record)?;
                records.insert((surface, id), fields.clone());
                Ok(StoredRecord {
                    id: Some(id),
                    fields,
                })
            }
            Operation::Update(id) => {
                let slot = records
                    .get_mut(&(surface, id))
                    .ok_or_else(|| StoreError::NotFound(format!("{surface} record {id}")))?;
                *slot = Self::into_fields(record)?;
                Ok(StoredRecord {
                    id: Some(id),
                    fields: slot.clone(),
                })
            }
            Operation::Delete(id) => {
                records
                    .remove(&(surface, id))
                    .ok_or_else(|| StoreError::NotFound(format!("{surface} record {id}")))?;
                Ok(StoredRecord::default())
            }
        }
    }

    async fn list(
        &self,
        surface: Surface,
        filter_key: &str,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        self.pause().await;
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        let key = surface.filter_label();
        Ok(self
            .records(surface)
            .into_iter()
            .filter(|record| {
                record.fields.get(key).is_some_and(|value| match value {
                    Value::String(s) => s == filter_key,
                    other => other.to_string() == filter_key,
                })
            })
            .collect())
    }
}
