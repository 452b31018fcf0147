//! Single-record JSON import.
//!
//! Turns pasted text into one normalized record, or one user-facing error.
//! Nothing here mutates state; the form applies the result.

use serde_json::Value;

use crate::error::AuthoringError;
use crate::model::{ChoiceMode, QcmQuestion, QuestionRecord, Surface};
use crate::registry;

/// Confirmation shown after a successful single import.
pub const IMPORT_CONFIRMATION: &str = "JSON imported successfully";

/// A normalized record together with the choice mode it implies.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedQuestion {
    pub record: QuestionRecord,
    pub mode: ChoiceMode,
}

/// Parses `text` into a JSON value.
pub fn parse(text: &str) -> Result<Value, AuthoringError> {
    serde_json::from_str(text).map_err(|e| AuthoringError::Parse(e.to_string()))
}

/// Parses `text`, which must hold one JSON object.
pub fn parse_object(text: &str) -> Result<Value, AuthoringError> {
    let value = parse(text)?;
    if !value.is_object() {
        return Err(AuthoringError::Parse(format!(
            "expected a JSON object, found {}",
            json_type(&value)
        )));
    }
    Ok(value)
}

/// Parses `text` into import candidates: an object yields one candidate, an
/// array yields its elements in order.
pub fn parse_candidates(text: &str) -> Result<Vec<Value>, AuthoringError> {
    match parse(text)? {
        Value::Array(items) => Ok(items),
        object @ Value::Object(_) => Ok(vec![object]),
        other => Err(AuthoringError::Parse(format!(
            "expected a JSON object or array, found {}",
            json_type(&other)
        ))),
    }
}

/// Imports one question of the questions or essays surface.
pub fn import_question(surface: Surface, text: &str) -> Result<ImportedQuestion, AuthoringError> {
    let candidate = parse_object(text)?;
    let record = registry::normalize_question(surface, &candidate)?;
    let mode = record.implied_mode();
    tracing::debug!(%surface, kind = %record.kind(), ?mode, "imported question");
    Ok(ImportedQuestion { record, mode })
}

/// Imports one QCM question.
pub fn import_qcm(text: &str) -> Result<QcmQuestion, AuthoringError> {
    let candidate = parse_object(text)?;
    registry::normalize_qcm(&candidate)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{QuestionKind, QuestionPayload};

    #[test]
    fn parse_error_carries_diagnostic() {
        let err = import_question(Surface::Questions, "{\"type\": ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn top_level_array_is_parse_error_for_single_import() {
        let err = import_question(Surface::Questions, "[]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn candidates_from_object_or_array() {
        assert_eq!(parse_candidates("{\"a\": 1}").unwrap().len(), 1);
        assert_eq!(parse_candidates("[{}, {}, 3]").unwrap().len(), 3);
        assert_eq!(parse_candidates("\"x\"").unwrap_err().kind(), ErrorKind::Parse);
    }

    #[test]
    fn grouped_import_implies_grouped_mode() {
        let imported = import_question(
            Surface::Questions,
            r#"{
                "type": "multiple_choice_single",
                "question": "Choisissez",
                "subQuestions": [
                    {"id": 1, "question": "1)", "options": [{"id": "a"}, {"id": "b"}], "answer": "b"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(imported.mode, ChoiceMode::Grouped);

        let imported = import_question(
            Surface::Questions,
            r#"{"type": "multiple_choice_single", "question": "Q", "options": [{"id": "a"}]}"#,
        )
        .unwrap();
        assert_eq!(imported.mode, ChoiceMode::Simple);
    }

    #[test]
    fn essay_import_defaults_points_to_two() {
        let imported = import_question(
            Surface::Essays,
            r#"{"type": "essay_development", "question": "Développement",
                "progressivePhrases": [{"template": "D'abord, [0]", "words": ["il faut"]}]}"#,
        )
        .unwrap();
        assert_eq!(imported.record.points, 2.0);
        assert_eq!(imported.record.kind(), QuestionKind::EssayDevelopment);
        match imported.record.payload {
            QuestionPayload::EssayDevelopment(p) => {
                assert_eq!(p.progressive_phrases[0].words, vec!["il faut".to_string()]);
                assert!(p.progressive_phrases[0].helper.french.is_empty());
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn qcm_single_import() {
        let qcm = import_qcm(
            r#"{"question": "2+2 ?", "correctAnswer": "B",
                "options": [{"id":"a","text":"3"},{"id":"b","text":"4"},{"id":"c","text":"5"},{"id":"d","text":"22"}]}"#,
        )
        .unwrap();
        assert_eq!(qcm.correct_answer, "b");
        assert_eq!(qcm.options[1].text, "4");
    }
}
