//! Question type registry.
//!
//! Owns the closed kind set of each surface, the canonical empty record of
//! each kind, and the one merge that turns an untyped candidate into a typed
//! record. Single import, bulk import and edit-load all go through here.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AuthoringError;
use crate::model::{
    QcmQuestion, QuestionKind, QuestionPayload, QuestionRecord, Surface, VocabularyHelper,
    QCM_OPTION_IDS,
};
use crate::traits::StoredRecord;

const QUESTION_KINDS: [QuestionKind; 6] = [
    QuestionKind::Text,
    QuestionKind::MultipleChoice,
    QuestionKind::MultipleChoiceSingle,
    QuestionKind::Table,
    QuestionKind::Matching,
    QuestionKind::WordPlacement,
];

const ESSAY_KINDS: [QuestionKind; 4] = [
    QuestionKind::EssayIntroduction,
    QuestionKind::EssayDevelopment,
    QuestionKind::EssayConclusion,
    QuestionKind::EssaySubject,
];

/// The closed kind set of `surface`. QCM records carry no kind.
pub fn kinds(surface: Surface) -> &'static [QuestionKind] {
    match surface {
        Surface::Questions => &QUESTION_KINDS,
        Surface::Essays => &ESSAY_KINDS,
        Surface::Qcm => &[],
    }
}

/// Kind of a fresh record on `surface`.
pub fn default_kind(surface: Surface) -> QuestionKind {
    match surface {
        Surface::Essays => QuestionKind::EssayIntroduction,
        Surface::Questions | Surface::Qcm => QuestionKind::Text,
    }
}

/// Points of a fresh record on `surface`.
pub fn template_points(surface: Surface) -> f64 {
    match surface {
        Surface::Essays => 2.0,
        Surface::Questions | Surface::Qcm => 1.0,
    }
}

/// The canonical empty record of `kind`: every text field empty, every list
/// empty, optional composites absent.
pub fn canonical_record(kind: QuestionKind) -> QuestionRecord {
    QuestionRecord {
        id: None,
        question: String::new(),
        question_arabic: String::new(),
        instruction: String::new(),
        instruction_arabic: String::new(),
        points: template_points(kind.surface()),
        order: None,
        helper: VocabularyHelper::default(),
        answer: String::new(),
        answer_arabic: String::new(),
        payload: QuestionPayload::empty(kind),
    }
}

/// The canonical empty QCM question.
pub fn canonical_qcm() -> QcmQuestion {
    QcmQuestion::default()
}

/// Checks the import contract of one candidate against `surface`.
///
/// Returns the candidate's kind for the questions and essays surfaces, and
/// `None` for QCM.
pub fn check_contract(
    surface: Surface,
    candidate: &Value,
) -> Result<Option<QuestionKind>, AuthoringError> {
    let fields = as_object(candidate)?;
    match surface {
        Surface::Qcm => check_qcm_contract(fields).map(|_| None),
        Surface::Questions | Surface::Essays => {
            check_question_contract(surface, fields).map(Some)
        }
    }
}

fn check_question_contract(
    surface: Surface,
    fields: &Map<String, Value>,
) -> Result<QuestionKind, AuthoringError> {
    if !is_field_set(fields, "type") || !is_field_set(fields, "question") {
        return Err(AuthoringError::missing(&["type", "question"]));
    }

    let tag = &fields["type"];
    tag.as_str()
        .and_then(|name| name.parse::<QuestionKind>().ok())
        .filter(|kind| kind.surface() == surface)
        .ok_or_else(|| AuthoringError::InvalidType {
            found: tag.as_str().map(str::to_string).unwrap_or_else(|| tag.to_string()),
            valid: kinds(surface).iter().map(QuestionKind::as_str).collect(),
        })
}

fn check_qcm_contract(fields: &Map<String, Value>) -> Result<(), AuthoringError> {
    if ["question", "options", "correctAnswer"]
        .iter()
        .any(|key| !is_field_set(fields, key))
    {
        return Err(AuthoringError::missing(&["question", "options", "correctAnswer"]));
    }

    let options = fields["options"]
        .as_array()
        .filter(|options| options.len() == QCM_OPTION_IDS.len())
        .ok_or_else(|| {
            AuthoringError::shape("the \"options\" array must contain exactly 4 entries")
        })?;

    let ids_valid = options.iter().all(|option| {
        option
            .get("id")
            .and_then(Value::as_str)
            .is_some_and(is_qcm_option_id)
    });
    if !ids_valid {
        return Err(AuthoringError::shape(
            "each option must have a valid \"id\" (a, b, c or d)",
        ));
    }

    if !fields["correctAnswer"].as_str().is_some_and(is_qcm_option_id) {
        return Err(AuthoringError::shape("\"correctAnswer\" must be a, b, c or d"));
    }

    Ok(())
}

fn is_qcm_option_id(id: &str) -> bool {
    QCM_OPTION_IDS.contains(&id.to_lowercase().as_str())
}

/// Validates `candidate` and merges it over the canonical record of its
/// kind. Never carries an `id`: identity belongs to the store.
pub fn normalize_question(
    surface: Surface,
    candidate: &Value,
) -> Result<QuestionRecord, AuthoringError> {
    let kind = check_contract(surface, candidate)?.unwrap_or(default_kind(surface));
    let merged = merge_over(&canonical_record(kind), as_object(candidate)?)?;
    let mut record: QuestionRecord = from_merged(merged)?;
    if let QuestionPayload::MultipleChoice(payload) = &mut record.payload {
        for item in &mut payload.sub_questions {
            item.set_verdict(item.answer);
        }
    }
    tracing::debug!(kind = %record.kind(), "normalized question candidate");
    Ok(record)
}

/// Validates `candidate` against the QCM rules and merges it over the
/// canonical QCM question. Option and answer ids come out lower-cased; the
/// chapter is left for the caller to stamp.
pub fn normalize_qcm(candidate: &Value) -> Result<QcmQuestion, AuthoringError> {
    check_contract(Surface::Qcm, candidate)?;
    let merged = merge_over(&canonical_qcm(), as_object(candidate)?)?;
    let mut qcm: QcmQuestion = from_merged(merged)?;
    qcm.id = None;
    qcm.chapter_id = None;
    qcm.correct_answer = qcm.correct_answer.to_lowercase();
    for option in &mut qcm.options {
        option.id = option.id.to_lowercase();
    }
    Ok(qcm)
}

/// Reads a stored question back into a typed record, id included. Used by
/// edit-load.
pub fn load_question(stored: &StoredRecord) -> Result<QuestionRecord, AuthoringError> {
    from_merged(strip_nulls(stored.to_value()))
}

/// Reads a stored QCM question back into a typed record.
pub fn load_qcm(stored: &StoredRecord) -> Result<QcmQuestion, AuthoringError> {
    from_merged(strip_nulls(stored.to_value()))
}

/// Overwrites each key of the serialized `template` with the candidate's
/// value when that value is set. Keys the template does not know are
/// dropped.
fn merge_over<T: Serialize>(
    template: &T,
    candidate: &Map<String, Value>,
) -> Result<Value, AuthoringError> {
    let mut merged = serde_json::to_value(template)
        .map_err(|e| AuthoringError::shape(format!("cannot build template: {e}")))?;
    if let Value::Object(slots) = &mut merged {
        for (key, slot) in slots.iter_mut() {
            if let Some(value) = candidate.get(key).filter(|v| is_set(v)) {
                *slot = strip_nulls(value.clone());
            }
        }
    }
    Ok(merged)
}

fn from_merged<T: DeserializeOwned>(merged: Value) -> Result<T, AuthoringError> {
    serde_json::from_value(merged).map_err(|e| AuthoringError::shape(format!("invalid payload: {e}")))
}

/// Whether a candidate value counts as provided. Mirrors the authoring
/// form's notion of "filled in": null, `false`, `0` and `""` are not; any
/// array or object is, even when empty.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn is_field_set(fields: &Map<String, Value>, key: &str) -> bool {
    fields.get(key).is_some_and(is_set)
}

/// Drops null-valued object keys at every depth so typed defaults apply.
fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

fn as_object(candidate: &Value) -> Result<&Map<String, Value>, AuthoringError> {
    candidate
        .as_object()
        .ok_or_else(|| AuthoringError::shape("each question must be a JSON object"))
}

/// A non-blocking finding about a record.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// The field the warning is about (if applicable).
    pub field: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn on(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.to_string()),
            message: message.into(),
        }
    }
}

/// Structural checks that do not block import or submission.
pub fn lint_record(record: &QuestionRecord) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let on_quarter = (record.points * 4.0).fract() == 0.0;
    if record.kind() != QuestionKind::EssaySubject && (record.points <= 0.0 || !on_quarter) {
        warnings.push(ValidationWarning::on(
            "points",
            format!("points must be a positive multiple of 0.25, got {}", record.points),
        ));
    }

    if !record.helper.is_aligned() {
        warnings.push(ValidationWarning::on(
            "helper",
            format!(
                "helper has {} French words but {} Arabic words",
                record.helper.french.len(),
                record.helper.arabic.len()
            ),
        ));
    }

    match &record.payload {
        QuestionPayload::Table(payload) => {
            if let Some(content) = payload.table_content.as_ref().filter(|c| !c.is_aligned()) {
                warnings.push(ValidationWarning::on(
                    "tableContent",
                    format!(
                        "table lists differ in length: {} headers, {} Arabic headers, {} answers",
                        content.headers.len(),
                        content.headers_arabic.len(),
                        content.answer.len()
                    ),
                ));
            }
        }
        QuestionPayload::WordPlacement(payload) => {
            let words = &payload.drag_drop_words;
            if !words.placeholders_match_words() {
                warnings.push(ValidationWarning::on(
                    "dragDropWords",
                    format!(
                        "template placeholders {:?} do not match the {} word(s); expected [0]..[{}]",
                        words.placeholder_indices(),
                        words.words.len(),
                        words.words.len().saturating_sub(1)
                    ),
                ));
            }
        }
        QuestionPayload::MultipleChoiceSingle(payload) => {
            let unknown: Vec<&str> = record
                .answer
                .split(" et ")
                .filter(|id| !id.is_empty())
                .filter(|id| !payload.options.iter().any(|o| o.id == *id))
                .collect();
            if !payload.options.is_empty() && !unknown.is_empty() {
                warnings.push(ValidationWarning::on(
                    "answer",
                    format!("answer refers to unknown option(s): {}", unknown.join(", ")),
                ));
            }
            for (index, sub) in payload.sub_questions.iter().enumerate() {
                if !sub.answer.is_empty() && !sub.options.iter().any(|o| o.id == sub.answer) {
                    warnings.push(ValidationWarning::on(
                        "subQuestions",
                        format!(
                            "sub-question {} answer \"{}\" is not one of its options",
                            index + 1,
                            sub.answer
                        ),
                    ));
                }
            }
        }
        QuestionPayload::EssayIntroduction(payload)
        | QuestionPayload::EssayDevelopment(payload)
        | QuestionPayload::EssayConclusion(payload) => {
            for (index, phrase) in payload.progressive_phrases.iter().enumerate() {
                if !phrase.helper.is_aligned() {
                    warnings.push(ValidationWarning::on(
                        "progressivePhrases",
                        format!("phrase {} helper lists differ in length", index + 1),
                    ));
                }
            }
        }
        QuestionPayload::Text(_)
        | QuestionPayload::MultipleChoice(_)
        | QuestionPayload::Matching(_)
        | QuestionPayload::EssaySubject(_) => {}
    }

    warnings
}
