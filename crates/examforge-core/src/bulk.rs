//! Bulk QCM import.
//!
//! Validates a whole batch before touching the store, then persists it one
//! item at a time, in order, counting failures instead of stopping on them.

use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde_json::Value;

use crate::error::{AuthoringError, StoreError};
use crate::import;
use crate::model::{QcmQuestion, RecordId, Surface};
use crate::registry;
use crate::submit::prepare_qcm;
use crate::traits::{Operation, QuestionStore, StoredRecord};

/// Progress reporting for a running batch.
pub trait ImportProgress: Send + Sync {
    /// Called after every persistence attempt. `current` is 1-based.
    fn on_progress(&self, current: usize, total: usize);
    fn on_item_failed(&self, _position: usize, _error: &StoreError) {}
}

/// No-op progress reporter.
pub struct NoopProgress;

impl ImportProgress for NoopProgress {
    fn on_progress(&self, _: usize, _: usize) {}
}

/// Per-item outcomes of a batch, keyed by 0-based input index.
#[derive(Debug, Default)]
pub struct BatchLedger {
    pub successes: Vec<(usize, StoredRecord)>,
    pub failures: Vec<(usize, StoreError)>,
}

impl BatchLedger {
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    pub fn error_count(&self) -> usize {
        self.failures.len()
    }
}

/// Outcome of a persisted batch.
#[derive(Debug)]
pub struct BatchReport {
    pub chapter_id: RecordId,
    pub total: usize,
    pub ledger: BatchLedger,
    /// At least one item was refused for credentials.
    pub auth_failed: bool,
    /// The list reload after the loop.
    pub reloaded: Result<Vec<StoredRecord>, StoreError>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl BatchReport {
    /// One-line summary for the author.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Import finished: {} questions added",
            self.ledger.success_count()
        );
        if self.ledger.error_count() > 0 {
            summary.push_str(&format!(", {} errors", self.ledger.error_count()));
        }
        summary
    }
}

/// What a bulk import did with its input.
#[derive(Debug)]
pub enum BulkOutcome {
    /// A lone candidate is not persisted; it goes to the form instead.
    Single(QcmQuestion),
    Batch(BatchReport),
}

/// Parses and validates a batch. Fails on the first invalid candidate,
/// naming its 1-based position.
pub fn parse_batch(text: &str) -> Result<Vec<QcmQuestion>, AuthoringError> {
    let candidates = import::parse_candidates(text)?;
    if candidates.is_empty() {
        return Err(AuthoringError::NothingToImport);
    }
    candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| {
            registry::normalize_qcm(candidate).map_err(|e| e.at_position(index + 1))
        })
        .collect()
}

/// Imports `text` into chapter `chapter_id`.
pub async fn import_batch(
    text: &str,
    chapter_id: RecordId,
    store: &dyn QuestionStore,
    progress: &dyn ImportProgress,
) -> Result<BulkOutcome, AuthoringError> {
    let mut questions = parse_batch(text)?;
    if questions.len() == 1 {
        if let Some(question) = questions.pop() {
            return Ok(BulkOutcome::Single(question));
        }
    }

    let payloads = questions
        .iter()
        .map(|question| prepare_qcm(question, chapter_id))
        .collect::<Result<Vec<Value>, _>>()?;

    Ok(BulkOutcome::Batch(
        persist_batch(payloads, chapter_id, store, progress).await,
    ))
}

async fn persist_batch(
    payloads: Vec<Value>,
    chapter_id: RecordId,
    store: &dyn QuestionStore,
    progress: &dyn ImportProgress,
) -> BatchReport {
    let start = Instant::now();
    let total = payloads.len();
    tracing::info!(total, chapter_id, store = store.name(), "bulk import started");

    let ledger = stream::iter(payloads.into_iter().enumerate())
        .fold(BatchLedger::default(), |mut ledger, (index, payload)| async move {
            match store.submit(Surface::Qcm, Operation::Create, payload).await {
                Ok(stored) => ledger.successes.push((index, stored)),
                Err(e) => {
                    tracing::warn!(position = index + 1, error = %e, "bulk item failed");
                    progress.on_item_failed(index + 1, &e);
                    ledger.failures.push((index, e));
                }
            }
            progress.on_progress(index + 1, total);
            ledger
        })
        .await;

    let auth_failed = ledger.failures.iter().any(|(_, e)| e.is_auth());
    if auth_failed {
        tracing::error!("store refused the credential during bulk import");
    }

    let reloaded = store.list(Surface::Qcm, &chapter_id.to_string()).await;
    if let Err(e) = &reloaded {
        tracing::error!(chapter_id, error = %e, "reloading the chapter list failed");
    }

    let report = BatchReport {
        chapter_id,
        total,
        ledger,
        auth_failed,
        reloaded,
        finished_at: Utc::now(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    tracing::info!(
        added = report.ledger.success_count(),
        errors = report.ledger.error_count(),
        duration_ms = report.duration_ms,
        "bulk import finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Store double: fails the create calls whose 0-based index is listed.
    struct ScriptedStore {
        fail_at: Vec<usize>,
        unauthorized: bool,
        calls: Mutex<Vec<Value>>,
    }

    impl ScriptedStore {
        fn new(fail_at: &[usize]) -> Self {
            Self {
                fail_at: fail_at.to_vec(),
                unauthorized: false,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QuestionStore for ScriptedStore {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn submit(
            &self,
            _surface: Surface,
            _operation: Operation,
            record: Value,
        ) -> Result<StoredRecord, StoreError> {
            let mut calls = self.calls.lock().unwrap();
            let index = calls.len();
            calls.push(record);
            if self.fail_at.contains(&index) {
                if self.unauthorized {
                    return Err(StoreError::Unauthorized("token expired".into()));
                }
                return Err(StoreError::Api {
                    status: 500,
                    message: "boom".into(),
                });
            }
            Ok(StoredRecord {
                id: Some(index as i64 + 100),
                ..Default::default()
            })
        }

        async fn list(&self, _: Surface, _: &str) -> Result<Vec<StoredRecord>, StoreError> {
            Ok(Vec::new())
        }
    }

    struct Recorder(Mutex<Vec<(usize, usize)>>);

    impl ImportProgress for Recorder {
        fn on_progress(&self, current: usize, total: usize) {
            self.0.lock().unwrap().push((current, total));
        }
    }

    fn qcm(question: &str, answer: &str) -> Value {
        serde_json::json!({
            "question": question,
            "options": [
                {"id": "a", "text": "1"}, {"id": "b", "text": "2"},
                {"id": "c", "text": "3"}, {"id": "d", "text": "4"}
            ],
            "correctAnswer": answer
        })
    }

    fn batch(items: &[Value]) -> String {
        serde_json::to_string(items).unwrap()
    }

    #[tokio::test]
    async fn partial_failure_is_counted() {
        let store = ScriptedStore::new(&[1]);
        let recorder = Recorder(Mutex::new(Vec::new()));
        let text = batch(&[qcm("Q1", "a"), qcm("Q2", "B"), qcm("Q3", "c")]);

        let outcome = import_batch(&text, 7, &store, &recorder).await.unwrap();
        let BulkOutcome::Batch(report) = outcome else {
            panic!("expected a batch");
        };
        assert_eq!(report.total, 3);
        assert_eq!(report.ledger.success_count(), 2);
        assert_eq!(report.ledger.error_count(), 1);
        assert_eq!(report.ledger.failures[0].0, 1);
        assert_eq!(report.summary(), "Import finished: 2 questions added, 1 errors");
        assert!(!report.auth_failed);
        assert!(report.reloaded.is_ok());

        assert_eq!(*recorder.0.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);

        let calls = store.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|c| c["chapterId"] == 7));
        assert_eq!(calls[1]["correctAnswer"], "b");
        assert_eq!(calls[0]["question"], "Q1");
        assert_eq!(calls[2]["question"], "Q3");
    }

    #[tokio::test]
    async fn invalid_candidate_aborts_before_persistence() {
        let store = ScriptedStore::new(&[]);
        let mut broken = qcm("Q2", "a");
        broken.as_object_mut().unwrap().remove("correctAnswer");
        let text = batch(&[qcm("Q1", "a"), broken, qcm("Q3", "a")]);

        let err = import_batch(&text, 7, &store, &NoopProgress).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert_eq!(err.position(), Some(2));
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn single_candidate_is_not_persisted() {
        let store = ScriptedStore::new(&[]);
        let text = serde_json::to_string(&qcm("Seule", "D")).unwrap();
        let outcome = import_batch(&text, 7, &store, &NoopProgress).await.unwrap();
        match outcome {
            BulkOutcome::Single(question) => {
                assert_eq!(question.question, "Seule");
                assert_eq!(question.correct_answer, "d");
            }
            BulkOutcome::Batch(_) => panic!("single candidate must not be persisted"),
        }
        assert!(store.calls.lock().unwrap().is_empty());

        let text = batch(&[qcm("Seule", "a")]);
        let outcome = import_batch(&text, 7, &store, &NoopProgress).await.unwrap();
        assert!(matches!(outcome, BulkOutcome::Single(_)));
    }

    #[tokio::test]
    async fn empty_and_malformed_input() {
        let store = ScriptedStore::new(&[]);
        let err = import_batch("[]", 1, &store, &NoopProgress).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert_eq!(err.to_string(), "nothing to import: the JSON array is empty");

        let err = import_batch("[{", 1, &store, &NoopProgress).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn auth_failures_are_counted_and_flagged() {
        let mut store = ScriptedStore::new(&[0, 1]);
        store.unauthorized = true;
        let text = batch(&[qcm("Q1", "a"), qcm("Q2", "a")]);
        let BulkOutcome::Batch(report) = import_batch(&text, 2, &store, &NoopProgress)
            .await
            .unwrap()
        else {
            panic!("expected a batch");
        };
        assert!(report.auth_failed);
        assert_eq!(report.ledger.error_count() + report.ledger.success_count(), report.total);
        assert_eq!(report.summary(), "Import finished: 0 questions added, 2 errors");
    }
}
