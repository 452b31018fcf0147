//! The fixed bilingual grading rubric of the `essay_subject` kind.
//!
//! The rubric is not authored: every `essay_subject` submission carries
//! exactly [`essay_criteria`], together with the fixed header strings and
//! point total below.

use serde::{Deserialize, Serialize};

/// Points of every `essay_subject` question.
pub const ESSAY_SUBJECT_POINTS: f64 = 10.0;
pub const ESSAY_SUBJECT_QUESTION: &str = "PRODUCTION ÉCRITE";
pub const ESSAY_SUBJECT_QUESTION_ARABIC: &str = "الإنتاج الكتابي";
pub const ESSAY_SUBJECT_SUBTITLE: &str = "Sujet";
pub const ESSAY_SUBJECT_SUBTITLE_ARABIC: &str = "الموضوع";

/// One graded line of a rubric category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaItem {
    pub text: String,
    #[serde(default)]
    pub text_arabic: String,
    pub points: f64,
}

/// A titled group of rubric lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaCategory {
    pub title: String,
    #[serde(default)]
    pub title_arabic: String,
    #[serde(default)]
    pub items: Vec<CriteriaItem>,
    pub total_points: f64,
}

impl CriteriaCategory {
    /// Sum of the item points.
    pub fn item_points(&self) -> f64 {
        self.items.iter().map(|item| item.points).sum()
    }
}

/// Rubric of an essay subject: discourse and language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EssayCriteria {
    pub discourse: CriteriaCategory,
    pub language: CriteriaCategory,
}

impl EssayCriteria {
    pub fn total_points(&self) -> f64 {
        self.discourse.total_points + self.language.total_points
    }
}

fn item(text: &str, text_arabic: &str, points: f64) -> CriteriaItem {
    CriteriaItem {
        text: text.to_string(),
        text_arabic: text_arabic.to_string(),
        points,
    }
}

/// Builds the canonical rubric. Pure and input-free: every call returns an
/// equal value.
pub fn essay_criteria() -> EssayCriteria {
    EssayCriteria {
        discourse: CriteriaCategory {
            title: "Critères d'évaluation du discours".into(),
            title_arabic: "معايير تقييم الخطاب".into(),
            items: vec![
                item(
                    "Conformité de la production à la consigne d'écriture",
                    "مطابقة الإنتاج لتعليمة الكتابة",
                    2.5,
                ),
                item("Cohérence de l'argumentation", "تماسك الحجاج", 1.5),
                item(
                    "Structure du texte (organisation et progression du texte)",
                    "بنية النص (تنظيم وتطور النص)",
                    1.0,
                ),
            ],
            total_points: 5.0,
        },
        language: CriteriaCategory {
            title: "Critères d'évaluation de la langue".into(),
            title_arabic: "معايير تقييم اللغة".into(),
            items: vec![
                item(
                    "Vocabulaire (usage des termes précis et variés)",
                    "المفردات (استخدام مصطلحات دقيقة ومتنوعة)",
                    1.0,
                ),
                item(
                    "Syntaxe (construction des phrases correctes)",
                    "التركيب (بناء جمل صحيحة)",
                    1.0,
                ),
                item(
                    "Ponctuation (usage d'une ponctuation adéquate)",
                    "الترقيم (استخدام ترقيم مناسب)",
                    1.0,
                ),
                item(
                    "Respect des règles orthographiques et grammaticales",
                    "احترام القواعد الإملائية والنحوية",
                    1.0,
                ),
                item(
                    "Conjugaison (emploi des temps verbaux)",
                    "التصريف (استخدام الأزمنة الفعلية)",
                    1.0,
                ),
            ],
            total_points: 5.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rubric_shape() {
        let criteria = essay_criteria();
        assert_eq!(criteria.discourse.items.len(), 3);
        assert_eq!(criteria.language.items.len(), 5);

        let discourse: Vec<f64> = criteria.discourse.items.iter().map(|i| i.points).collect();
        assert_eq!(discourse, vec![2.5, 1.5, 1.0]);
        assert!(criteria.language.items.iter().all(|i| i.points == 1.0));
    }

    #[test]
    fn category_totals_match_items() {
        let criteria = essay_criteria();
        assert_eq!(criteria.discourse.item_points(), criteria.discourse.total_points);
        assert_eq!(criteria.language.item_points(), criteria.language.total_points);
        assert_eq!(criteria.total_points(), ESSAY_SUBJECT_POINTS);
    }

    #[test]
    fn generator_is_idempotent() {
        assert_eq!(essay_criteria(), essay_criteria());
    }

    #[test]
    fn every_line_is_bilingual() {
        let criteria = essay_criteria();
        for line in criteria.discourse.items.iter().chain(&criteria.language.items) {
            assert!(!line.text.is_empty());
            assert!(!line.text_arabic.is_empty());
        }
    }
}
