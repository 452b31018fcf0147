//! Core data model types for examforge.
//!
//! A [`QuestionRecord`] carries the base fields shared by every kind and a
//! [`QuestionPayload`] whose variant is selected by the `type` tag. Chapter
//! QCM records live on their own surface as [`QcmQuestion`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::criteria::EssayCriteria;

/// Identifier assigned by the store. Never generated locally.
pub type RecordId = i64;

/// A management surface: one closed kind set and one store collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Questions,
    Essays,
    Qcm,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Questions => "questions",
            Surface::Essays => "essays",
            Surface::Qcm => "qcm",
        }
    }

    /// What the list filter key identifies on this surface.
    pub fn filter_label(&self) -> &'static str {
        match self {
            Surface::Questions | Surface::Essays => "examId",
            Surface::Qcm => "chapterId",
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Surface {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "questions" | "question" => Ok(Surface::Questions),
            "essays" | "essay" => Ok(Surface::Essays),
            "qcm" => Ok(Surface::Qcm),
            other => Err(format!("unknown surface: {other}")),
        }
    }
}

/// The `type` tag of a question record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Text,
    MultipleChoice,
    MultipleChoiceSingle,
    Table,
    Matching,
    WordPlacement,
    EssayIntroduction,
    EssayDevelopment,
    EssayConclusion,
    EssaySubject,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 10] = [
        QuestionKind::Text,
        QuestionKind::MultipleChoice,
        QuestionKind::MultipleChoiceSingle,
        QuestionKind::Table,
        QuestionKind::Matching,
        QuestionKind::WordPlacement,
        QuestionKind::EssayIntroduction,
        QuestionKind::EssayDevelopment,
        QuestionKind::EssayConclusion,
        QuestionKind::EssaySubject,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Text => "text",
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::MultipleChoiceSingle => "multiple_choice_single",
            QuestionKind::Table => "table",
            QuestionKind::Matching => "matching",
            QuestionKind::WordPlacement => "word_placement",
            QuestionKind::EssayIntroduction => "essay_introduction",
            QuestionKind::EssayDevelopment => "essay_development",
            QuestionKind::EssayConclusion => "essay_conclusion",
            QuestionKind::EssaySubject => "essay_subject",
        }
    }

    /// The surface whose closed set contains this kind.
    pub fn surface(&self) -> Surface {
        match self {
            QuestionKind::Text
            | QuestionKind::MultipleChoice
            | QuestionKind::MultipleChoiceSingle
            | QuestionKind::Table
            | QuestionKind::Matching
            | QuestionKind::WordPlacement => Surface::Questions,
            QuestionKind::EssayIntroduction
            | QuestionKind::EssayDevelopment
            | QuestionKind::EssayConclusion
            | QuestionKind::EssaySubject => Surface::Essays,
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown question type: {s}"))
    }
}

/// Which side of a `multiple_choice_single` record is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceMode {
    #[default]
    Simple,
    Grouped,
}

/// Language of one half of a bilingual field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    French,
    Arabic,
}

/// Identifier of a nested item (sub-question). Imported files carry either
/// numbers or strings; items added in the form get a uuid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(i64),
    Text(String),
}

impl ItemId {
    pub fn generate() -> Self {
        ItemId::Text(uuid::Uuid::new_v4().to_string())
    }
}

/// Bilingual vocabulary hints. Word `i` of `french` pairs with word `i` of
/// `arabic`; both lists are always grown and shrunk together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyHelper {
    pub french: Vec<String>,
    pub arabic: Vec<String>,
}

impl VocabularyHelper {
    pub fn push_pair(&mut self) {
        self.french.push(String::new());
        self.arabic.push(String::new());
    }

    pub fn set(&mut self, index: usize, lang: Lang, value: String) -> bool {
        let words = match lang {
            Lang::French => &mut self.french,
            Lang::Arabic => &mut self.arabic,
        };
        match words.get_mut(index) {
            Some(word) => {
                *word = value;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.french.len() || index >= self.arabic.len() {
            return false;
        }
        self.french.remove(index);
        self.arabic.remove(index);
        true
    }

    pub fn is_aligned(&self) -> bool {
        self.french.len() == self.arabic.len()
    }
}

/// Sub-question of a `text` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextSubQuestion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    pub label: String,
    pub question: String,
    pub question_arabic: String,
    pub answer: String,
    pub answer_arabic: String,
    pub points: f64,
}

impl Default for TextSubQuestion {
    fn default() -> Self {
        Self {
            id: None,
            label: String::new(),
            question: String::new(),
            question_arabic: String::new(),
            answer: String::new(),
            answer_arabic: String::new(),
            points: 0.5,
        }
    }
}

/// Answer of a true/false statement.
///
/// Reads `VRAI`/`FAUX` in any case, their Arabic forms, `true`/`false`
/// strings and JSON booleans. Always written as `VRAI` or `FAUX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Verdict {
    #[default]
    #[serde(rename = "VRAI")]
    Vrai,
    #[serde(rename = "FAUX")]
    Faux,
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "VRAI" | "TRUE" | "صحيح" => Ok(Verdict::Vrai),
            "FAUX" | "FALSE" | "خطأ" => Ok(Verdict::Faux),
            other => Err(format!("unknown verdict \"{other}\", expected VRAI or FAUX")),
        }
    }
}

impl<'de> Deserialize<'de> for Verdict {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(true) => Ok(Verdict::Vrai),
            Raw::Flag(false) => Ok(Verdict::Faux),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

impl Verdict {
    pub fn arabic(&self) -> &'static str {
        match self {
            Verdict::Vrai => "صحيح",
            Verdict::Faux => "خطأ",
        }
    }
}

/// One statement of a `multiple_choice` (true/false) record. The Arabic
/// answer always mirrors the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrueFalseItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    pub question: String,
    pub question_arabic: String,
    pub answer: Verdict,
    pub answer_arabic: String,
}

impl Default for TrueFalseItem {
    fn default() -> Self {
        Self {
            id: None,
            question: String::new(),
            question_arabic: String::new(),
            answer: Verdict::Vrai,
            answer_arabic: Verdict::Vrai.arabic().to_string(),
        }
    }
}

impl TrueFalseItem {
    pub fn set_verdict(&mut self, verdict: Verdict) {
        self.answer = verdict;
        self.answer_arabic = verdict.arabic().to_string();
    }
}

/// A selectable option.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChoiceOption {
    pub id: String,
    #[serde(deserialize_with = "text_or_number")]
    pub text: String,
    #[serde(deserialize_with = "text_or_number")]
    pub text_arabic: String,
}

/// Option labels are sometimes bare numbers in imported files (`"text": 56`).
fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

impl ChoiceOption {
    pub fn with_id(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }
}

/// A sub-question of a grouped `multiple_choice_single` record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroupedChoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    pub question: String,
    pub question_arabic: String,
    pub options: Vec<ChoiceOption>,
    pub answer: String,
}

/// Columns of a `table` record: three parallel lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableContent {
    pub headers: Vec<String>,
    pub headers_arabic: Vec<String>,
    pub answer: Vec<String>,
}

/// One of the three parallel lists of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableField {
    Header,
    HeaderArabic,
    Answer,
}

impl TableContent {
    pub fn push_column(&mut self) {
        self.headers.push(String::new());
        self.headers_arabic.push(String::new());
        self.answer.push(String::new());
    }

    pub fn set_cell(&mut self, column: usize, field: TableField, value: String) -> bool {
        let cells = match field {
            TableField::Header => &mut self.headers,
            TableField::HeaderArabic => &mut self.headers_arabic,
            TableField::Answer => &mut self.answer,
        };
        match cells.get_mut(column) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn is_aligned(&self) -> bool {
        self.headers.len() == self.headers_arabic.len() && self.headers.len() == self.answer.len()
    }
}

/// A left/right pair of a `matching` record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchingPair {
    pub left: String,
    pub right: String,
    pub right_arabic: String,
}

/// Template and word bank of a `word_placement` record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragDropWords {
    pub template: String,
    pub words: Vec<String>,
}

impl DragDropWords {
    /// Indices of the `[n]` placeholders found in the template.
    pub fn placeholder_indices(&self) -> BTreeSet<usize> {
        let mut found = BTreeSet::new();
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('[') {
            rest = &rest[open + 1..];
            if let Some(close) = rest.find(']') {
                if let Ok(index) = rest[..close].parse::<usize>() {
                    found.insert(index);
                    rest = &rest[close + 1..];
                }
            }
        }
        found
    }

    /// `true` when the placeholders are exactly `[0]..[n-1]` for `n` words.
    pub fn placeholders_match_words(&self) -> bool {
        let indices = self.placeholder_indices();
        indices.len() == self.words.len() && indices.iter().copied().eq(0..self.words.len())
    }
}

/// A fill-in-the-blank fragment of an essay section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProgressivePhrase {
    pub template: String,
    pub words: Vec<String>,
    pub helper: VocabularyHelper,
    pub description: String,
    pub description_arabic: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextPayload {
    pub sub_questions: Vec<TextSubQuestion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrueFalsePayload {
    pub sub_questions: Vec<TrueFalseItem>,
}

/// Both sides of a `multiple_choice_single` record. Only one is populated
/// at a time, according to the form's [`ChoiceMode`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SingleChoicePayload {
    pub options: Vec<ChoiceOption>,
    pub sub_questions: Vec<GroupedChoice>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TablePayload {
    pub table_content: Option<TableContent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchingPayload {
    pub matching_pairs: Vec<MatchingPair>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WordPlacementPayload {
    pub drag_drop_words: DragDropWords,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EssaySectionPayload {
    pub progressive_phrases: Vec<ProgressivePhrase>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EssaySubjectPayload {
    pub prompt: String,
    pub prompt_arabic: String,
    pub sub_title: String,
    pub sub_title_arabic: String,
    /// Replaced by the canonical rubric on submission, so an imported value
    /// that is not rubric-shaped is read as absent.
    #[serde(deserialize_with = "rubric_or_none")]
    pub criteria: Option<EssayCriteria>,
}

fn rubric_or_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<EssayCriteria>, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match serde_json::from_value(value) {
        Ok(criteria) => Some(criteria),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring criteria that are not rubric-shaped");
            None
        }
    }))
}

/// Kind-specific part of a record, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionPayload {
    Text(TextPayload),
    MultipleChoice(TrueFalsePayload),
    MultipleChoiceSingle(SingleChoicePayload),
    Table(TablePayload),
    Matching(MatchingPayload),
    WordPlacement(WordPlacementPayload),
    EssayIntroduction(EssaySectionPayload),
    EssayDevelopment(EssaySectionPayload),
    EssayConclusion(EssaySectionPayload),
    EssaySubject(EssaySubjectPayload),
}

impl QuestionPayload {
    /// The empty payload of `kind`. `word_placement` starts with an empty
    /// template and word list; `table` starts without content.
    pub fn empty(kind: QuestionKind) -> Self {
        match kind {
            QuestionKind::Text => QuestionPayload::Text(TextPayload::default()),
            QuestionKind::MultipleChoice => {
                QuestionPayload::MultipleChoice(TrueFalsePayload::default())
            }
            QuestionKind::MultipleChoiceSingle => {
                QuestionPayload::MultipleChoiceSingle(SingleChoicePayload::default())
            }
            QuestionKind::Table => QuestionPayload::Table(TablePayload::default()),
            QuestionKind::Matching => QuestionPayload::Matching(MatchingPayload::default()),
            QuestionKind::WordPlacement => {
                QuestionPayload::WordPlacement(WordPlacementPayload::default())
            }
            QuestionKind::EssayIntroduction => {
                QuestionPayload::EssayIntroduction(EssaySectionPayload::default())
            }
            QuestionKind::EssayDevelopment => {
                QuestionPayload::EssayDevelopment(EssaySectionPayload::default())
            }
            QuestionKind::EssayConclusion => {
                QuestionPayload::EssayConclusion(EssaySectionPayload::default())
            }
            QuestionKind::EssaySubject => {
                QuestionPayload::EssaySubject(EssaySubjectPayload::default())
            }
        }
    }

    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionPayload::Text(_) => QuestionKind::Text,
            QuestionPayload::MultipleChoice(_) => QuestionKind::MultipleChoice,
            QuestionPayload::MultipleChoiceSingle(_) => QuestionKind::MultipleChoiceSingle,
            QuestionPayload::Table(_) => QuestionKind::Table,
            QuestionPayload::Matching(_) => QuestionKind::Matching,
            QuestionPayload::WordPlacement(_) => QuestionKind::WordPlacement,
            QuestionPayload::EssayIntroduction(_) => QuestionKind::EssayIntroduction,
            QuestionPayload::EssayDevelopment(_) => QuestionKind::EssayDevelopment,
            QuestionPayload::EssayConclusion(_) => QuestionKind::EssayConclusion,
            QuestionPayload::EssaySubject(_) => QuestionKind::EssaySubject,
        }
    }

    /// Progressive phrases of the three essay-section kinds.
    pub fn phrases_mut(&mut self) -> Option<&mut Vec<ProgressivePhrase>> {
        match self {
            QuestionPayload::EssayIntroduction(p)
            | QuestionPayload::EssayDevelopment(p)
            | QuestionPayload::EssayConclusion(p) => Some(&mut p.progressive_phrases),
            _ => None,
        }
    }
}

/// A question of the `questions` or `essays` surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    /// Store-assigned identifier; absent on new records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub question_arabic: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub instruction_arabic: String,
    #[serde(default = "default_points")]
    pub points: f64,
    /// Display sequencing hint.
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub helper: VocabularyHelper,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub answer_arabic: String,
    #[serde(flatten)]
    pub payload: QuestionPayload,
}

fn default_points() -> f64 {
    1.0
}

impl QuestionRecord {
    pub fn kind(&self) -> QuestionKind {
        self.payload.kind()
    }

    /// The choice mode a loaded record implies: grouped only for a
    /// `multiple_choice_single` record that already has sub-questions.
    pub fn implied_mode(&self) -> ChoiceMode {
        match &self.payload {
            QuestionPayload::MultipleChoiceSingle(p) if !p.sub_questions.is_empty() => {
                ChoiceMode::Grouped
            }
            _ => ChoiceMode::Simple,
        }
    }
}

/// A chapter QCM question: four options `a`..`d` and one correct answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QcmQuestion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub chapter_id: Option<RecordId>,
    pub question: String,
    pub question_arabic: String,
    pub options: Vec<ChoiceOption>,
    pub correct_answer: String,
    pub explanation: String,
    pub explanation_arabic: String,
}

/// Option ids accepted on a QCM question.
pub const QCM_OPTION_IDS: [&str; 4] = ["a", "b", "c", "d"];

impl Default for QcmQuestion {
    fn default() -> Self {
        Self {
            id: None,
            chapter_id: None,
            question: String::new(),
            question_arabic: String::new(),
            options: QCM_OPTION_IDS.iter().map(|id| ChoiceOption::with_id(id)).collect(),
            correct_answer: String::new(),
            explanation: String::new(),
            explanation_arabic: String::new(),
        }
    }
}
