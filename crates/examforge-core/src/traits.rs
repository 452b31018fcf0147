//! The persistence seam.
//!
//! The core never talks to a backend directly. Everything it persists goes
//! through [`QuestionStore`], implemented by the `examforge-store` crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::model::{RecordId, Surface};

/// Trait for the backing store of question records.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Human-readable store name (e.g. "http").
    fn name(&self) -> &str;

    /// Create, update or delete one record of `surface`.
    async fn submit(
        &self,
        surface: Surface,
        operation: Operation,
        record: Value,
    ) -> Result<StoredRecord, StoreError>;

    /// List the records of `surface` matching `filter_key` (an exam id for
    /// questions and essays, a chapter id for QCM).
    async fn list(&self, surface: Surface, filter_key: &str)
        -> Result<Vec<StoredRecord>, StoreError>;
}

/// What a [`QuestionStore::submit`] call does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update(RecordId),
    Delete(RecordId),
}

impl Operation {
    pub fn verb(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update(_) => "update",
            Operation::Delete(_) => "delete",
        }
    }
}

/// A record as returned by the store: its id plus whatever fields the
/// store sent back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl StoredRecord {
    /// The record as one JSON object, id included.
    pub fn to_value(&self) -> Value {
        let mut fields = self.fields.clone();
        if let Some(id) = self.id {
            fields.insert("id".into(), Value::from(id));
        }
        Value::Object(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_record_splits_id() {
        let stored: StoredRecord =
            serde_json::from_str(r#"{"id": 7, "question": "Q", "type": "text"}"#).unwrap();
        assert_eq!(stored.id, Some(7));
        assert_eq!(stored.fields["question"], "Q");
        assert!(!stored.fields.contains_key("id"));
        assert_eq!(stored.to_value()["id"], 7);
    }

    #[test]
    fn operation_verbs() {
        assert_eq!(Operation::Create.verb(), "create");
        assert_eq!(Operation::Update(1).verb(), "update");
        assert_eq!(Operation::Delete(1).verb(), "delete");
    }
}
