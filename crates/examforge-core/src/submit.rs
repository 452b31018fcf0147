//! Submission: building the persisted payload and driving the store.

use serde_json::Value;

use crate::criteria::{
    essay_criteria, ESSAY_SUBJECT_POINTS, ESSAY_SUBJECT_QUESTION, ESSAY_SUBJECT_QUESTION_ARABIC,
    ESSAY_SUBJECT_SUBTITLE, ESSAY_SUBJECT_SUBTITLE_ARABIC,
};
use crate::error::{AuthoringError, StoreError};
use crate::model::{QcmQuestion, QuestionPayload, QuestionRecord, RecordId, Surface};
use crate::traits::{Operation, QuestionStore, StoredRecord};

/// Result of a successful submission: what the store returned, and the
/// reloaded list. A failed reload does not undo the submission.
#[derive(Debug)]
pub struct Submitted {
    pub stored: StoredRecord,
    pub listing: Result<Vec<StoredRecord>, StoreError>,
}

/// Applies submission-time overrides to `record`. For `essay_subject` the
/// rubric, headers and points are fixed, and both prompts are required.
pub fn finalize(record: &QuestionRecord) -> Result<QuestionRecord, AuthoringError> {
    let mut record = record.clone();
    if let QuestionPayload::EssaySubject(subject) = &mut record.payload {
        if subject.prompt.trim().is_empty() || subject.prompt_arabic.trim().is_empty() {
            return Err(AuthoringError::missing(&["prompt", "promptArabic"]));
        }
        subject.criteria = Some(essay_criteria());
        subject.sub_title = ESSAY_SUBJECT_SUBTITLE.to_string();
        subject.sub_title_arabic = ESSAY_SUBJECT_SUBTITLE_ARABIC.to_string();
        record.points = ESSAY_SUBJECT_POINTS;
        record.question = ESSAY_SUBJECT_QUESTION.to_string();
        record.question_arabic = ESSAY_SUBJECT_QUESTION_ARABIC.to_string();
    }
    Ok(record)
}

/// The JSON body sent to the store for `record`, tagged with its exam.
pub fn prepare_question(
    record: &QuestionRecord,
    exam_id: RecordId,
) -> Result<Value, AuthoringError> {
    let record = finalize(record)?;
    let mut payload = to_payload(&record)?;
    if let Value::Object(fields) = &mut payload {
        fields.insert("examId".into(), Value::from(exam_id));
    }
    Ok(payload)
}

/// The JSON body sent to the store for a QCM question of `chapter_id`.
pub fn prepare_qcm(qcm: &QcmQuestion, chapter_id: RecordId) -> Result<Value, AuthoringError> {
    let mut qcm = qcm.clone();
    qcm.chapter_id = Some(chapter_id);
    to_payload(&qcm)
}

fn to_payload<T: serde::Serialize>(value: &T) -> Result<Value, AuthoringError> {
    serde_json::to_value(value)
        .map_err(|e| AuthoringError::shape(format!("cannot serialize record: {e}")))
}

fn operation_for(id: Option<RecordId>) -> Operation {
    match id {
        Some(id) => Operation::Update(id),
        None => Operation::Create,
    }
}

/// Creates or updates `record` and reloads the exam's list.
pub async fn submit_question(
    store: &dyn QuestionStore,
    surface: Surface,
    record: &QuestionRecord,
    exam_id: RecordId,
) -> Result<Submitted, AuthoringError> {
    let payload = prepare_question(record, exam_id)?;
    let operation = operation_for(record.id);
    persist(store, surface, operation, payload, &exam_id.to_string()).await
}

/// Creates or updates a QCM question and reloads the chapter's list.
pub async fn submit_qcm(
    store: &dyn QuestionStore,
    qcm: &QcmQuestion,
    chapter_id: RecordId,
) -> Result<Submitted, AuthoringError> {
    let payload = prepare_qcm(qcm, chapter_id)?;
    let operation = operation_for(qcm.id);
    persist(store, Surface::Qcm, operation, payload, &chapter_id.to_string()).await
}

/// Deletes one record and reloads the list under `filter_key`.
pub async fn delete_record(
    store: &dyn QuestionStore,
    surface: Surface,
    id: RecordId,
    filter_key: &str,
) -> Result<Submitted, AuthoringError> {
    persist(store, surface, Operation::Delete(id), Value::Null, filter_key).await
}

async fn persist(
    store: &dyn QuestionStore,
    surface: Surface,
    operation: Operation,
    payload: Value,
    filter_key: &str,
) -> Result<Submitted, AuthoringError> {
    let stored = store
        .submit(surface, operation, payload)
        .await
        .inspect_err(|e| {
            tracing::warn!(%surface, operation = operation.verb(), error = %e, "submission failed")
        })?;
    tracing::debug!(%surface, operation = operation.verb(), id = ?stored.id, "record persisted");

    let listing = store.list(surface, filter_key).await;
    if let Err(e) = &listing {
        tracing::error!(%surface, %filter_key, error = %e, "reloading the list failed");
    }
    Ok(Submitted { stored, listing })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::QuestionKind;
    use crate::registry::canonical_record;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every call in order.
    #[derive(Default)]
    struct CallLog {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl QuestionStore for CallLog {
        fn name(&self) -> &str {
            "call-log"
        }

        async fn submit(
            &self,
            surface: Surface,
            operation: Operation,
            _: Value,
        ) -> Result<StoredRecord, StoreError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{} {surface} {operation:?}", operation.verb()));
            Ok(StoredRecord::default())
        }

        async fn list(&self, surface: Surface, key: &str) -> Result<Vec<StoredRecord>, StoreError> {
            self.calls.lock().unwrap().push(format!("list {surface} {key}"));
            Ok(Vec::new())
        }
    }

    fn essay_subject() -> QuestionRecord {
        let mut record = canonical_record(QuestionKind::EssaySubject);
        record.question = "anything".into();
        record.points = 3.0;
        if let QuestionPayload::EssaySubject(p) = &mut record.payload {
            p.prompt = "Rédigez une lettre".into();
            p.prompt_arabic = "اكتب رسالة".into();
            p.sub_title = "ignored".into();
        }
        record
    }

    #[test]
    fn essay_subject_override() {
        let payload = prepare_question(&essay_subject(), 4).unwrap();
        assert_eq!(payload["points"], 10.0);
        assert_eq!(payload["question"], ESSAY_SUBJECT_QUESTION);
        assert_eq!(payload["questionArabic"], ESSAY_SUBJECT_QUESTION_ARABIC);
        assert_eq!(payload["subTitle"], "Sujet");
        assert_eq!(payload["subTitleArabic"], "الموضوع");
        assert_eq!(payload["examId"], 4);
        assert_eq!(payload["type"], "essay_subject");
        assert_eq!(
            payload["criteria"],
            serde_json::to_value(essay_criteria()).unwrap()
        );
    }

    #[test]
    fn essay_subject_requires_both_prompts() {
        let mut record = essay_subject();
        if let QuestionPayload::EssaySubject(p) = &mut record.payload {
            p.prompt_arabic = "  ".into();
        }
        let err = finalize(&record).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert!(err.to_string().contains("promptArabic"));
    }

    #[test]
    fn other_kinds_pass_through() {
        let mut record = canonical_record(QuestionKind::Matching);
        record.points = 1.5;
        assert_eq!(finalize(&record).unwrap(), record);
    }

    #[test]
    fn qcm_payload_carries_chapter() {
        let payload = prepare_qcm(&QcmQuestion::default(), 9).unwrap();
        assert_eq!(payload["chapterId"], 9);
        assert_eq!(payload["options"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn delete_issues_one_delete_then_one_reload() {
        let store = CallLog::default();
        let submitted = delete_record(&store, Surface::Essays, 31, "6").await.unwrap();
        assert_eq!(submitted.stored, StoredRecord::default());
        assert!(submitted.listing.unwrap().is_empty());

        let calls = store.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].ends_with("essays Delete(31)"), "{}", calls[0]);
        assert_eq!(calls[1], "list essays 6");
    }

    #[test]
    fn operation_follows_identity() {
        assert_eq!(operation_for(None), Operation::Create);
        assert_eq!(operation_for(Some(3)), Operation::Update(3));
    }
}
