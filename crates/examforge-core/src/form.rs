//! The form state controller.
//!
//! [`QuestionForm`] owns one in-progress record and the choice mode of the
//! `multiple_choice_single` kind. Every change goes through
//! [`QuestionForm::apply`] with one [`FormAction`]; an action that fails
//! leaves the form exactly as it was.

use std::time::Duration;

use crate::error::AuthoringError;
use crate::import::{self, IMPORT_CONFIRMATION};
use crate::model::{
    ChoiceMode, ChoiceOption, GroupedChoice, ItemId, Lang, MatchingPair, ProgressivePhrase,
    QuestionKind, QuestionPayload, QuestionRecord, RecordId, Surface, TableContent, TableField,
    TextSubQuestion, TrueFalseItem, Verdict,
};
use crate::notice::{Notice, CONFIRMATION_MS};
use crate::registry;
use crate::submit::{self, Submitted};
use crate::traits::QuestionStore;

/// The closed set of form actions.
#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    /// Switch kind. The payload is reset; base fields are kept.
    SetType(QuestionKind),
    /// Switch the `multiple_choice_single` mode.
    SetMode(ChoiceMode),
    Edit(FieldEdit),
    /// Replace the record with pasted JSON.
    ImportSingle(String),
    /// Replace the record with a stored one for editing.
    LoadForEdit(QuestionRecord),
    Reset,
}

/// Text fields of a sub-question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubQuestionField {
    Label,
    Question,
    QuestionArabic,
    Answer,
    AnswerArabic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionField {
    Id,
    Text,
    TextArabic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSide {
    Left,
    Right,
    RightArabic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseField {
    Template,
    Description,
    DescriptionArabic,
}

/// One field-level edit. Edits that do not exist on the current kind are
/// rejected with `InvalidShape`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    Question(Lang, String),
    Instruction(Lang, String),
    Answer(Lang, String),
    Points(f64),
    Order(Option<i64>),

    AddHelperWord,
    SetHelperWord { index: usize, lang: Lang, value: String },
    RemoveHelperWord(usize),

    /// `text` only: seed one sub-question, or clear them all.
    ToggleSubQuestions(bool),
    AddSubQuestion,
    RemoveSubQuestion(usize),
    SetSubQuestion { index: usize, field: SubQuestionField, value: String },
    SetSubQuestionPoints { index: usize, points: f64 },
    SetVerdict { index: usize, verdict: Verdict },

    AddOption,
    SetOption { index: usize, field: OptionField, value: String },
    RemoveOption(usize),
    /// Select or deselect an option of a simple `multiple_choice_single`.
    ToggleAnswer(String),
    SetSubOption { sub: usize, index: usize, field: OptionField, value: String },
    SetSubAnswer { sub: usize, option_id: String },

    AddTableColumn,
    SetTableCell { column: usize, field: TableField, value: String },

    AddMatchingPair,
    SetMatchingPair { index: usize, side: PairSide, value: String },
    RemoveMatchingPair(usize),

    SetTemplate(String),
    AddWord,
    SetWord { index: usize, value: String },
    RemoveWord(usize),

    AddPhrase,
    SetPhrase { index: usize, field: PhraseField, value: String },
    SetPhraseWords { index: usize, words: Vec<String> },
    AddPhraseHelperWord(usize),
    SetPhraseHelperWord { phrase: usize, index: usize, lang: Lang, value: String },
    RemovePhraseHelperWord { phrase: usize, index: usize },
    RemovePhrase(usize),

    Prompt(Lang, String),
    SubTitle(Lang, String),
}

/// Label of the next `text` sub-question given how many exist:
/// `a`..`j`, then `"11"`, `"12"`, ...
pub fn sub_question_label(count: usize) -> String {
    const LETTERS: &[u8; 10] = b"abcdefghij";
    match LETTERS.get(count) {
        Some(letter) => char::from(*letter).to_string(),
        None => (count + 1).to_string(),
    }
}

/// Controller over one in-progress question.
#[derive(Debug)]
pub struct QuestionForm {
    surface: Surface,
    record: QuestionRecord,
    mode: ChoiceMode,
    notice: Notice,
    confirmation_ttl: Duration,
}

impl QuestionForm {
    /// A blank form on the questions surface.
    pub fn for_questions() -> Self {
        Self::blank(Surface::Questions)
    }

    /// A blank form on the essays surface.
    pub fn for_essays() -> Self {
        Self::blank(Surface::Essays)
    }

    fn blank(surface: Surface) -> Self {
        Self {
            surface,
            record: registry::canonical_record(registry::default_kind(surface)),
            mode: ChoiceMode::Simple,
            notice: Notice::new(),
            confirmation_ttl: Duration::from_millis(CONFIRMATION_MS),
        }
    }

    pub fn with_confirmation_ttl(mut self, ttl: Duration) -> Self {
        self.confirmation_ttl = ttl;
        self
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn record(&self) -> &QuestionRecord {
        &self.record
    }

    pub fn mode(&self) -> ChoiceMode {
        self.mode
    }

    /// Id of the stored record being edited, if any.
    pub fn editing(&self) -> Option<RecordId> {
        self.record.id
    }

    /// The visible confirmation message, if any.
    pub fn notice(&self) -> Option<String> {
        self.notice.current()
    }

    /// Applies one action. On error nothing changes.
    pub fn apply(&mut self, action: FormAction) -> Result<(), AuthoringError> {
        match action {
            FormAction::Reset => {
                self.reset();
                Ok(())
            }
            FormAction::ImportSingle(text) => {
                let imported = import::import_question(self.surface, &text)?;
                self.record = imported.record;
                self.mode = imported.mode;
                self.notice.post(IMPORT_CONFIRMATION, self.confirmation_ttl);
                Ok(())
            }
            FormAction::LoadForEdit(record) => {
                self.check_kind(record.kind())?;
                self.mode = record.implied_mode();
                self.record = record;
                Ok(())
            }
            FormAction::SetType(kind) => {
                self.check_kind(kind)?;
                self.record.payload = QuestionPayload::empty(kind);
                self.mode = ChoiceMode::Simple;
                tracing::debug!(%kind, "question type switched");
                Ok(())
            }
            FormAction::SetMode(mode) => self.switch_mode(mode),
            FormAction::Edit(edit) => {
                let mut draft = self.record.clone();
                apply_edit(&mut draft, self.mode, edit)?;
                self.record = draft;
                Ok(())
            }
        }
    }

    /// Persists the record and resets the form on success. On failure the
    /// form is left untouched.
    pub async fn submit(
        &mut self,
        store: &dyn QuestionStore,
        exam_id: RecordId,
    ) -> Result<Submitted, AuthoringError> {
        let submitted =
            submit::submit_question(store, self.surface, &self.record, exam_id).await?;
        self.reset();
        Ok(submitted)
    }

    fn reset(&mut self) {
        self.record = registry::canonical_record(registry::default_kind(self.surface));
        self.mode = ChoiceMode::Simple;
        self.notice.clear();
    }

    fn check_kind(&self, kind: QuestionKind) -> Result<(), AuthoringError> {
        if kind.surface() == self.surface {
            return Ok(());
        }
        Err(AuthoringError::InvalidType {
            found: kind.as_str().to_string(),
            valid: registry::kinds(self.surface)
                .iter()
                .map(QuestionKind::as_str)
                .collect(),
        })
    }

    fn switch_mode(&mut self, mode: ChoiceMode) -> Result<(), AuthoringError> {
        let kind = self.record.kind();
        let QuestionPayload::MultipleChoiceSingle(payload) = &mut self.record.payload else {
            return Err(not_applicable(kind, "mode"));
        };
        match mode {
            ChoiceMode::Grouped => {
                payload.options.clear();
                self.record.answer.clear();
            }
            // The answer survives the trip to simple mode but not the trip
            // to grouped mode.
            ChoiceMode::Simple => payload.sub_questions.clear(),
        }
        self.mode = mode;
        Ok(())
    }
}

fn apply_edit(
    record: &mut QuestionRecord,
    mode: ChoiceMode,
    edit: FieldEdit,
) -> Result<(), AuthoringError> {
    let kind = record.kind();
    match edit {
        FieldEdit::Question(lang, value) => {
            *bilingual(&mut record.question, &mut record.question_arabic, lang) = value
        }
        FieldEdit::Instruction(lang, value) => {
            *bilingual(&mut record.instruction, &mut record.instruction_arabic, lang) = value
        }
        FieldEdit::Answer(lang, value) => {
            *bilingual(&mut record.answer, &mut record.answer_arabic, lang) = value
        }
        FieldEdit::Points(points) => record.points = points,
        FieldEdit::Order(order) => record.order = order,

        FieldEdit::AddHelperWord => record.helper.push_pair(),
        FieldEdit::SetHelperWord { index, lang, value } => {
            if !record.helper.set(index, lang, value) {
                return Err(missing_item("helper word", index));
            }
        }
        FieldEdit::RemoveHelperWord(index) => {
            if !record.helper.remove(index) {
                return Err(missing_item("helper word", index));
            }
        }

        FieldEdit::ToggleSubQuestions(on) => {
            let QuestionPayload::Text(payload) = &mut record.payload else {
                return Err(not_applicable(kind, "subQuestions"));
            };
            if !on {
                payload.sub_questions.clear();
            } else if payload.sub_questions.is_empty() {
                payload.sub_questions.push(new_text_sub_question(0));
            }
        }
        FieldEdit::AddSubQuestion => match &mut record.payload {
            QuestionPayload::Text(p) => {
                let label_index = p.sub_questions.len();
                p.sub_questions.push(new_text_sub_question(label_index));
            }
            QuestionPayload::MultipleChoice(p) => p.sub_questions.push(TrueFalseItem {
                id: Some(ItemId::generate()),
                ..Default::default()
            }),
            QuestionPayload::MultipleChoiceSingle(p) if mode == ChoiceMode::Grouped => {
                p.sub_questions.push(GroupedChoice {
                    id: Some(ItemId::generate()),
                    options: vec![ChoiceOption::with_id("a"), ChoiceOption::with_id("b")],
                    ..Default::default()
                })
            }
            _ => return Err(not_applicable_in(kind, mode, "subQuestions")),
        },
        FieldEdit::RemoveSubQuestion(index) => match &mut record.payload {
            QuestionPayload::Text(p) => remove_at(&mut p.sub_questions, index, "sub-question")?,
            QuestionPayload::MultipleChoice(p) => {
                remove_at(&mut p.sub_questions, index, "sub-question")?
            }
            QuestionPayload::MultipleChoiceSingle(p) if mode == ChoiceMode::Grouped => {
                remove_at(&mut p.sub_questions, index, "sub-question")?
            }
            _ => return Err(not_applicable_in(kind, mode, "subQuestions")),
        },
        FieldEdit::SetSubQuestion { index, field, value } => {
            set_sub_question(&mut record.payload, mode, index, field, value)?
        }
        FieldEdit::SetSubQuestionPoints { index, points } => {
            let QuestionPayload::Text(p) = &mut record.payload else {
                return Err(not_applicable(kind, "subQuestions[].points"));
            };
            item_at(&mut p.sub_questions, index, "sub-question")?.points = points;
        }
        FieldEdit::SetVerdict { index, verdict } => {
            let QuestionPayload::MultipleChoice(p) = &mut record.payload else {
                return Err(not_applicable(kind, "subQuestions[].answer"));
            };
            item_at(&mut p.sub_questions, index, "sub-question")?.set_verdict(verdict);
        }

        FieldEdit::AddOption => simple_options(record, mode)?.push(ChoiceOption::default()),
        FieldEdit::SetOption { index, field, value } => {
            let option = item_at(simple_options(record, mode)?, index, "option")?;
            *option_field(option, field) = value;
        }
        FieldEdit::RemoveOption(index) => {
            remove_at(simple_options(record, mode)?, index, "option")?
        }
        FieldEdit::ToggleAnswer(option_id) => {
            simple_options(record, mode)?;
            let mut selected: Vec<String> = record
                .answer
                .split(" et ")
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
            if let Some(position) = selected.iter().position(|id| *id == option_id) {
                selected.remove(position);
            } else {
                selected.push(option_id);
                selected.sort();
            }
            record.answer = selected.join(" et ");
        }
        FieldEdit::SetSubOption { sub, index, field, value } => {
            let sub_question = grouped_item(record, mode, sub)?;
            let option = item_at(&mut sub_question.options, index, "option")?;
            *option_field(option, field) = value;
        }
        FieldEdit::SetSubAnswer { sub, option_id } => {
            grouped_item(record, mode, sub)?.answer = option_id;
        }

        FieldEdit::AddTableColumn => {
            let QuestionPayload::Table(p) = &mut record.payload else {
                return Err(not_applicable(kind, "tableContent"));
            };
            p.table_content
                .get_or_insert_with(TableContent::default)
                .push_column();
        }
        FieldEdit::SetTableCell { column, field, value } => {
            let QuestionPayload::Table(p) = &mut record.payload else {
                return Err(not_applicable(kind, "tableContent"));
            };
            let updated = p
                .table_content
                .as_mut()
                .is_some_and(|content| content.set_cell(column, field, value));
            if !updated {
                return Err(missing_item("table column", column));
            }
        }

        FieldEdit::AddMatchingPair => matching_pairs(record)?.push(MatchingPair::default()),
        FieldEdit::SetMatchingPair { index, side, value } => {
            let pair = item_at(matching_pairs(record)?, index, "matching pair")?;
            match side {
                PairSide::Left => pair.left = value,
                PairSide::Right => pair.right = value,
                PairSide::RightArabic => pair.right_arabic = value,
            }
        }
        FieldEdit::RemoveMatchingPair(index) => {
            remove_at(matching_pairs(record)?, index, "matching pair")?
        }

        FieldEdit::SetTemplate(template) => {
            let QuestionPayload::WordPlacement(p) = &mut record.payload else {
                return Err(not_applicable(kind, "dragDropWords"));
            };
            p.drag_drop_words.template = template;
        }
        FieldEdit::AddWord => placement_words(record)?.push(String::new()),
        FieldEdit::SetWord { index, value } => {
            *item_at(placement_words(record)?, index, "word")? = value
        }
        FieldEdit::RemoveWord(index) => remove_at(placement_words(record)?, index, "word")?,

        FieldEdit::AddPhrase => phrases(record)?.push(ProgressivePhrase::default()),
        FieldEdit::SetPhrase { index, field, value } => {
            let phrase = item_at(phrases(record)?, index, "phrase")?;
            match field {
                PhraseField::Template => phrase.template = value,
                PhraseField::Description => phrase.description = value,
                PhraseField::DescriptionArabic => phrase.description_arabic = value,
            }
        }
        FieldEdit::SetPhraseWords { index, words } => {
            item_at(phrases(record)?, index, "phrase")?.words = words
        }
        FieldEdit::AddPhraseHelperWord(index) => {
            item_at(phrases(record)?, index, "phrase")?.helper.push_pair()
        }
        FieldEdit::SetPhraseHelperWord { phrase, index, lang, value } => {
            let helper = &mut item_at(phrases(record)?, phrase, "phrase")?.helper;
            if !helper.set(index, lang, value) {
                return Err(missing_item("helper word", index));
            }
        }
        FieldEdit::RemovePhraseHelperWord { phrase, index } => {
            let helper = &mut item_at(phrases(record)?, phrase, "phrase")?.helper;
            if !helper.remove(index) {
                return Err(missing_item("helper word", index));
            }
        }
        FieldEdit::RemovePhrase(index) => remove_at(phrases(record)?, index, "phrase")?,

        FieldEdit::Prompt(lang, value) => {
            let QuestionPayload::EssaySubject(p) = &mut record.payload else {
                return Err(not_applicable(kind, "prompt"));
            };
            *bilingual(&mut p.prompt, &mut p.prompt_arabic, lang) = value;
        }
        FieldEdit::SubTitle(lang, value) => {
            let QuestionPayload::EssaySubject(p) = &mut record.payload else {
                return Err(not_applicable(kind, "subTitle"));
            };
            *bilingual(&mut p.sub_title, &mut p.sub_title_arabic, lang) = value;
        }
    }
    Ok(())
}

fn set_sub_question(
    payload: &mut QuestionPayload,
    mode: ChoiceMode,
    index: usize,
    field: SubQuestionField,
    value: String,
) -> Result<(), AuthoringError> {
    let kind = payload.kind();
    match payload {
        QuestionPayload::Text(p) => {
            let sub = item_at(&mut p.sub_questions, index, "sub-question")?;
            let slot = match field {
                SubQuestionField::Label => &mut sub.label,
                SubQuestionField::Question => &mut sub.question,
                SubQuestionField::QuestionArabic => &mut sub.question_arabic,
                SubQuestionField::Answer => &mut sub.answer,
                SubQuestionField::AnswerArabic => &mut sub.answer_arabic,
            };
            *slot = value;
        }
        QuestionPayload::MultipleChoice(p) => {
            let sub = item_at(&mut p.sub_questions, index, "sub-question")?;
            match field {
                SubQuestionField::Question => sub.question = value,
                SubQuestionField::QuestionArabic => sub.question_arabic = value,
                _ => return Err(not_applicable(kind, "subQuestions[] field")),
            }
        }
        QuestionPayload::MultipleChoiceSingle(p) if mode == ChoiceMode::Grouped => {
            let sub = item_at(&mut p.sub_questions, index, "sub-question")?;
            match field {
                SubQuestionField::Question => sub.question = value,
                SubQuestionField::QuestionArabic => sub.question_arabic = value,
                SubQuestionField::Answer => sub.answer = value,
                _ => return Err(not_applicable(kind, "subQuestions[] field")),
            }
        }
        _ => return Err(not_applicable_in(kind, mode, "subQuestions")),
    }
    Ok(())
}

fn new_text_sub_question(count: usize) -> TextSubQuestion {
    TextSubQuestion {
        id: Some(ItemId::generate()),
        label: sub_question_label(count),
        ..Default::default()
    }
}

fn bilingual<'a>(french: &'a mut String, arabic: &'a mut String, lang: Lang) -> &'a mut String {
    match lang {
        Lang::French => french,
        Lang::Arabic => arabic,
    }
}

fn option_field(option: &mut ChoiceOption, field: OptionField) -> &mut String {
    match field {
        OptionField::Id => &mut option.id,
        OptionField::Text => &mut option.text,
        OptionField::TextArabic => &mut option.text_arabic,
    }
}

fn simple_options(
    record: &mut QuestionRecord,
    mode: ChoiceMode,
) -> Result<&mut Vec<ChoiceOption>, AuthoringError> {
    let kind = record.kind();
    match &mut record.payload {
        QuestionPayload::MultipleChoiceSingle(p) if mode == ChoiceMode::Simple => Ok(&mut p.options),
        _ => Err(not_applicable_in(kind, mode, "options")),
    }
}

fn grouped_item(
    record: &mut QuestionRecord,
    mode: ChoiceMode,
    index: usize,
) -> Result<&mut GroupedChoice, AuthoringError> {
    let kind = record.kind();
    match &mut record.payload {
        QuestionPayload::MultipleChoiceSingle(p) if mode == ChoiceMode::Grouped => {
            item_at(&mut p.sub_questions, index, "sub-question")
        }
        _ => Err(not_applicable_in(kind, mode, "subQuestions")),
    }
}

fn matching_pairs(record: &mut QuestionRecord) -> Result<&mut Vec<MatchingPair>, AuthoringError> {
    let kind = record.kind();
    match &mut record.payload {
        QuestionPayload::Matching(p) => Ok(&mut p.matching_pairs),
        _ => Err(not_applicable(kind, "matchingPairs")),
    }
}

fn placement_words(record: &mut QuestionRecord) -> Result<&mut Vec<String>, AuthoringError> {
    let kind = record.kind();
    match &mut record.payload {
        QuestionPayload::WordPlacement(p) => Ok(&mut p.drag_drop_words.words),
        _ => Err(not_applicable(kind, "dragDropWords")),
    }
}

fn phrases(record: &mut QuestionRecord) -> Result<&mut Vec<ProgressivePhrase>, AuthoringError> {
    let kind = record.kind();
    record
        .payload
        .phrases_mut()
        .ok_or_else(|| not_applicable(kind, "progressivePhrases"))
}

fn item_at<'a, T>(
    items: &'a mut [T],
    index: usize,
    what: &str,
) -> Result<&'a mut T, AuthoringError> {
    items.get_mut(index).ok_or_else(|| missing_item(what, index))
}

fn remove_at<T>(items: &mut Vec<T>, index: usize, what: &str) -> Result<(), AuthoringError> {
    if index >= items.len() {
        return Err(missing_item(what, index));
    }
    items.remove(index);
    Ok(())
}

fn missing_item(what: &str, index: usize) -> AuthoringError {
    AuthoringError::shape(format!("{what} {index} does not exist"))
}

fn not_applicable(kind: QuestionKind, field: &str) -> AuthoringError {
    AuthoringError::shape(format!("\"{field}\" does not apply to {kind} questions"))
}

fn not_applicable_in(kind: QuestionKind, mode: ChoiceMode, field: &str) -> AuthoringError {
    if kind == QuestionKind::MultipleChoiceSingle {
        let mode = match mode {
            ChoiceMode::Simple => "simple",
            ChoiceMode::Grouped => "grouped",
        };
        return AuthoringError::shape(format!("\"{field}\" is not available in {mode} mode"));
    }
    not_applicable(kind, field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::SingleChoicePayload;

    fn edit(form: &mut QuestionForm, edit: FieldEdit) {
        form.apply(FormAction::Edit(edit)).unwrap();
    }

    fn single_choice(form: &QuestionForm) -> &SingleChoicePayload {
        match &form.record().payload {
            QuestionPayload::MultipleChoiceSingle(p) => p,
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn labels_run_a_to_j_then_numbers() {
        let labels: Vec<String> = (0..12).map(sub_question_label).collect();
        assert_eq!(labels[0], "a");
        assert_eq!(labels[9], "j");
        assert_eq!(labels[10], "11");
        assert_eq!(labels[11], "12");
    }

    #[test]
    fn eleventh_text_sub_question_is_labelled_11() {
        let mut form = QuestionForm::for_questions();
        edit(&mut form, FieldEdit::ToggleSubQuestions(true));
        for _ in 0..10 {
            edit(&mut form, FieldEdit::AddSubQuestion);
        }
        let QuestionPayload::Text(p) = &form.record().payload else {
            panic!("expected text payload");
        };
        assert_eq!(p.sub_questions.len(), 11);
        assert_eq!(p.sub_questions[0].label, "a");
        assert_eq!(p.sub_questions[0].points, 0.5);
        assert_eq!(p.sub_questions[10].label, "11");
    }

    #[test]
    fn toggling_sub_questions_off_clears_them() {
        let mut form = QuestionForm::for_questions();
        edit(&mut form, FieldEdit::ToggleSubQuestions(true));
        edit(&mut form, FieldEdit::ToggleSubQuestions(true));
        edit(&mut form, FieldEdit::ToggleSubQuestions(false));
        assert_eq!(form.record().payload, QuestionPayload::empty(QuestionKind::Text));
    }

    #[test]
    fn type_switch_resets_payload_keeps_base_fields() {
        let mut form = QuestionForm::for_questions();
        edit(&mut form, FieldEdit::Question(Lang::French, "Lisez".into()));
        edit(&mut form, FieldEdit::Points(2.5));
        form.apply(FormAction::SetType(QuestionKind::Table)).unwrap();
        edit(&mut form, FieldEdit::AddTableColumn);

        form.apply(FormAction::SetType(QuestionKind::WordPlacement)).unwrap();
        assert_eq!(form.record().question, "Lisez");
        assert_eq!(form.record().points, 2.5);
        let QuestionPayload::WordPlacement(p) = &form.record().payload else {
            panic!("expected word placement payload");
        };
        assert_eq!(p.drag_drop_words.template, "");
        assert!(p.drag_drop_words.words.is_empty());
    }

    #[test]
    fn type_outside_surface_is_rejected() {
        let mut form = QuestionForm::for_questions();
        let err = form
            .apply(FormAction::SetType(QuestionKind::EssaySubject))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
        assert_eq!(form.record().kind(), QuestionKind::Text);
    }

    #[test]
    fn mode_round_trip_clears_answer_and_options() {
        let mut form = QuestionForm::for_questions();
        form.apply(FormAction::SetType(QuestionKind::MultipleChoiceSingle))
            .unwrap();
        edit(&mut form, FieldEdit::AddOption);
        edit(&mut form, FieldEdit::SetOption {
            index: 0,
            field: OptionField::Id,
            value: "a".into(),
        });
        edit(&mut form, FieldEdit::ToggleAnswer("a".into()));
        assert_eq!(form.record().answer, "a");

        form.apply(FormAction::SetMode(ChoiceMode::Grouped)).unwrap();
        assert_eq!(form.record().answer, "");
        assert!(single_choice(&form).options.is_empty());

        edit(&mut form, FieldEdit::AddSubQuestion);
        let ids: Vec<&str> = single_choice(&form).sub_questions[0]
            .options
            .iter()
            .map(|o| o.id.as_str())
            .collect();
        assert_eq!(ids, ["a", "b"]);

        form.apply(FormAction::SetMode(ChoiceMode::Simple)).unwrap();
        assert_eq!(form.record().answer, "");
        assert!(single_choice(&form).sub_questions.is_empty());
        assert_eq!(form.mode(), ChoiceMode::Simple);
    }

    #[test]
    fn simple_mode_keeps_options_and_answer() {
        let mut form = QuestionForm::for_questions();
        form.apply(FormAction::SetType(QuestionKind::MultipleChoiceSingle))
            .unwrap();
        edit(&mut form, FieldEdit::AddOption);
        edit(&mut form, FieldEdit::ToggleAnswer("b".into()));
        form.apply(FormAction::SetMode(ChoiceMode::Simple)).unwrap();
        assert_eq!(single_choice(&form).options.len(), 1);
        assert_eq!(form.record().answer, "b");
    }

    #[test]
    fn answer_toggle_sorts_and_joins() {
        let mut form = QuestionForm::for_questions();
        form.apply(FormAction::SetType(QuestionKind::MultipleChoiceSingle))
            .unwrap();
        edit(&mut form, FieldEdit::ToggleAnswer("c".into()));
        edit(&mut form, FieldEdit::ToggleAnswer("a".into()));
        assert_eq!(form.record().answer, "a et c");
        edit(&mut form, FieldEdit::ToggleAnswer("c".into()));
        assert_eq!(form.record().answer, "a");
    }

    #[test]
    fn options_unavailable_in_grouped_mode() {
        let mut form = QuestionForm::for_questions();
        form.apply(FormAction::SetType(QuestionKind::MultipleChoiceSingle))
            .unwrap();
        form.apply(FormAction::SetMode(ChoiceMode::Grouped)).unwrap();
        let err = form
            .apply(FormAction::Edit(FieldEdit::AddOption))
            .unwrap_err();
        assert!(err.to_string().contains("grouped mode"));
    }

    #[test]
    fn mode_switch_rejected_on_other_kinds() {
        let mut form = QuestionForm::for_questions();
        let err = form
            .apply(FormAction::SetMode(ChoiceMode::Grouped))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidShape);
        assert_eq!(form.mode(), ChoiceMode::Simple);
    }

    #[test]
    fn verdict_sets_both_answers() {
        let mut form = QuestionForm::for_questions();
        form.apply(FormAction::SetType(QuestionKind::MultipleChoice))
            .unwrap();
        edit(&mut form, FieldEdit::AddSubQuestion);
        edit(&mut form, FieldEdit::SetVerdict { index: 0, verdict: Verdict::Faux });
        let QuestionPayload::MultipleChoice(p) = &form.record().payload else {
            panic!("expected true/false payload");
        };
        assert_eq!(p.sub_questions[0].answer, Verdict::Faux);
        assert_eq!(p.sub_questions[0].answer_arabic, "خطأ");
        assert!(p.sub_questions[0].id.is_some());
    }

    #[test]
    fn table_columns_stay_aligned() {
        let mut form = QuestionForm::for_questions();
        form.apply(FormAction::SetType(QuestionKind::Table)).unwrap();
        edit(&mut form, FieldEdit::AddTableColumn);
        edit(&mut form, FieldEdit::AddTableColumn);
        edit(&mut form, FieldEdit::SetTableCell {
            column: 1,
            field: TableField::HeaderArabic,
            value: "الاسم".into(),
        });
        let QuestionPayload::Table(p) = &form.record().payload else {
            panic!("expected table payload");
        };
        let content = p.table_content.as_ref().unwrap();
        assert!(content.is_aligned());
        assert_eq!(content.column_count(), 2);
        assert_eq!(content.headers_arabic[1], "الاسم");
    }

    #[test]
    fn failed_edit_leaves_record_untouched() {
        let mut form = QuestionForm::for_questions();
        edit(&mut form, FieldEdit::AddHelperWord);
        let before = form.record().clone();
        let err = form
            .apply(FormAction::Edit(FieldEdit::SetHelperWord {
                index: 3,
                lang: Lang::Arabic,
                value: "x".into(),
            }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidShape);
        assert_eq!(form.record(), &before);

        let err = form
            .apply(FormAction::Edit(FieldEdit::AddMatchingPair))
            .unwrap_err();
        assert!(err.to_string().contains("matchingPairs"));
    }

    #[test]
    fn helper_edits_touch_both_lists() {
        let mut form = QuestionForm::for_essays();
        edit(&mut form, FieldEdit::AddPhrase);
        edit(&mut form, FieldEdit::AddPhraseHelperWord(0));
        edit(&mut form, FieldEdit::SetPhraseHelperWord {
            phrase: 0,
            index: 0,
            lang: Lang::French,
            value: "ensuite".into(),
        });
        edit(&mut form, FieldEdit::AddHelperWord);
        edit(&mut form, FieldEdit::RemoveHelperWord(0));
        assert!(form.record().helper.french.is_empty());
        assert!(form.record().helper.arabic.is_empty());
        let QuestionPayload::EssayIntroduction(p) = &form.record().payload else {
            panic!("expected essay section payload");
        };
        assert_eq!(p.progressive_phrases[0].helper.french, vec!["ensuite".to_string()]);
        assert_eq!(p.progressive_phrases[0].helper.arabic, vec![String::new()]);
    }

    #[test]
    fn essay_form_starts_at_two_points() {
        let form = QuestionForm::for_essays();
        assert_eq!(form.record().points, 2.0);
        assert_eq!(form.record().kind(), QuestionKind::EssayIntroduction);
    }

    #[test]
    fn import_replaces_record_and_confirms() {
        let mut form = QuestionForm::for_questions();
        form.apply(FormAction::ImportSingle(
            r#"{"type":"text","question":"Lisez le texte","points":2}"#.into(),
        ))
        .unwrap();
        assert_eq!(form.record().question, "Lisez le texte");
        assert_eq!(form.record().points, 2.0);
        assert_eq!(form.notice().as_deref(), Some(IMPORT_CONFIRMATION));
    }

    #[test]
    fn failed_import_changes_nothing() {
        let mut form = QuestionForm::for_questions();
        edit(&mut form, FieldEdit::Question(Lang::Arabic, "سؤال".into()));
        let before = form.record().clone();

        let err = form
            .apply(FormAction::ImportSingle(r#"{"type":"essay","question":"Q"}"#.into()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
        assert_eq!(form.record(), &before);
        assert!(form.notice().is_none());
    }

    #[test]
    fn load_for_edit_sets_mode_from_record() {
        let mut form = QuestionForm::for_questions();
        let mut record = registry::canonical_record(QuestionKind::MultipleChoiceSingle);
        record.id = Some(5);
        if let QuestionPayload::MultipleChoiceSingle(p) = &mut record.payload {
            p.sub_questions.push(GroupedChoice::default());
        }
        form.apply(FormAction::LoadForEdit(record)).unwrap();
        assert_eq!(form.mode(), ChoiceMode::Grouped);
        assert_eq!(form.editing(), Some(5));

        form.apply(FormAction::Reset).unwrap();
        assert_eq!(form.editing(), None);
        assert_eq!(form.mode(), ChoiceMode::Simple);
        assert_eq!(form.record(), &registry::canonical_record(QuestionKind::Text));
    }
}
