//! The chapter QCM form.
//!
//! Same reducer discipline as [`QuestionForm`](crate::form::QuestionForm),
//! over a [`QcmQuestion`], plus the asynchronous bulk import path.

use std::time::Duration;

use crate::bulk::{self, BulkOutcome, ImportProgress};
use crate::error::AuthoringError;
use crate::import::{self, IMPORT_CONFIRMATION};
use crate::model::{Lang, QcmQuestion, RecordId};
use crate::notice::{Notice, CONFIRMATION_MS, SUMMARY_MS};
use crate::registry;
use crate::submit::{self, Submitted};
use crate::traits::QuestionStore;

#[derive(Debug, Clone, PartialEq)]
pub enum QcmAction {
    Edit(QcmEdit),
    ImportSingle(String),
    LoadForEdit(QcmQuestion),
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QcmEdit {
    Question(Lang, String),
    /// Text of option `index` (0..4).
    OptionText { index: usize, lang: Lang, value: String },
    CorrectAnswer(String),
    Explanation(Lang, String),
}

/// Controller over one in-progress QCM question.
#[derive(Debug)]
pub struct QcmForm {
    question: QcmQuestion,
    notice: Notice,
    confirmation_ttl: Duration,
    summary_ttl: Duration,
}

impl Default for QcmForm {
    fn default() -> Self {
        Self::new()
    }
}

impl QcmForm {
    pub fn new() -> Self {
        Self {
            question: registry::canonical_qcm(),
            notice: Notice::new(),
            confirmation_ttl: Duration::from_millis(CONFIRMATION_MS),
            summary_ttl: Duration::from_millis(SUMMARY_MS),
        }
    }

    pub fn with_notice_ttls(mut self, confirmation: Duration, summary: Duration) -> Self {
        self.confirmation_ttl = confirmation;
        self.summary_ttl = summary;
        self
    }

    pub fn question(&self) -> &QcmQuestion {
        &self.question
    }

    pub fn editing(&self) -> Option<RecordId> {
        self.question.id
    }

    pub fn notice(&self) -> Option<String> {
        self.notice.current()
    }

    pub fn apply(&mut self, action: QcmAction) -> Result<(), AuthoringError> {
        match action {
            QcmAction::Reset => self.reset(),
            QcmAction::ImportSingle(text) => {
                self.question = import::import_qcm(&text)?;
                self.notice.post(IMPORT_CONFIRMATION, self.confirmation_ttl);
            }
            QcmAction::LoadForEdit(question) => self.question = question,
            QcmAction::Edit(edit) => {
                let mut draft = self.question.clone();
                apply_edit(&mut draft, edit)?;
                self.question = draft;
            }
        }
        Ok(())
    }

    /// Bulk import into `chapter_id`. A lone candidate populates the form;
    /// a batch is persisted and its summary posted.
    pub async fn import_bulk(
        &mut self,
        text: &str,
        chapter_id: RecordId,
        store: &dyn QuestionStore,
        progress: &dyn ImportProgress,
    ) -> Result<BulkOutcome, AuthoringError> {
        let outcome = bulk::import_batch(text, chapter_id, store, progress).await?;
        match &outcome {
            BulkOutcome::Single(question) => {
                self.question = question.clone();
                self.notice.post(IMPORT_CONFIRMATION, self.confirmation_ttl);
            }
            BulkOutcome::Batch(report) => self.notice.post(report.summary(), self.summary_ttl),
        }
        Ok(outcome)
    }

    /// Persists the question into `chapter_id` and resets the form.
    pub async fn submit(
        &mut self,
        store: &dyn QuestionStore,
        chapter_id: RecordId,
    ) -> Result<Submitted, AuthoringError> {
        let submitted = submit::submit_qcm(store, &self.question, chapter_id).await?;
        self.reset();
        Ok(submitted)
    }

    fn reset(&mut self) {
        self.question = registry::canonical_qcm();
        self.notice.clear();
    }
}

fn apply_edit(question: &mut QcmQuestion, edit: QcmEdit) -> Result<(), AuthoringError> {
    match edit {
        QcmEdit::Question(Lang::French, value) => question.question = value,
        QcmEdit::Question(Lang::Arabic, value) => question.question_arabic = value,
        QcmEdit::Explanation(Lang::French, value) => question.explanation = value,
        QcmEdit::Explanation(Lang::Arabic, value) => question.explanation_arabic = value,
        QcmEdit::OptionText { index, lang, value } => {
            let option = question
                .options
                .get_mut(index)
                .ok_or_else(|| AuthoringError::shape(format!("option {index} does not exist")))?;
            match lang {
                Lang::French => option.text = value,
                Lang::Arabic => option.text_arabic = value,
            }
        }
        QcmEdit::CorrectAnswer(id) => {
            let id = id.to_lowercase();
            if !question.options.iter().any(|option| option.id == id) {
                return Err(AuthoringError::shape(format!(
                    "\"correctAnswer\" must be one of the option ids, got \"{id}\""
                )));
            }
            question.correct_answer = id;
        }
    }
    Ok(())
}
