//! The two fixed topic taxonomies and the code-to-category mapping.
//!
//! Codes are 1-indexed. Anything outside a table's range is "unmapped" and
//! yields `None`; it is never an error.

use std::fmt;

use clap::ValueEnum;
use serde::{Serialize, Serializer};

/// Which of the two independent taxonomies a query is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Taxonomy {
    /// Information-need topics, coded 1–10 on question phrases.
    Questions,
    /// Reflection topics, coded 1–6 on reflection phrases.
    Reflections,
}

impl fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Taxonomy::Questions => f.write_str("question"),
            Taxonomy::Reflections => f.write_str("reflection"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QuestionTopic {
    GeneralInfo,
    SurgeryPreparation,
    SurgeryAnesthesia,
    Recovery,
    PainManagement,
    Complications,
    PostopCare,
    Expectations,
    AdditionalResources,
    LogisticsWaitingTimes,
}

impl QuestionTopic {
    pub const ALL: [QuestionTopic; 10] = [
        QuestionTopic::GeneralInfo,
        QuestionTopic::SurgeryPreparation,
        QuestionTopic::SurgeryAnesthesia,
        QuestionTopic::Recovery,
        QuestionTopic::PainManagement,
        QuestionTopic::Complications,
        QuestionTopic::PostopCare,
        QuestionTopic::Expectations,
        QuestionTopic::AdditionalResources,
        QuestionTopic::LogisticsWaitingTimes,
    ];

    pub fn from_code(code: i64) -> Option<Self> {
        lookup(&Self::ALL, code)
    }

    pub fn label(self) -> &'static str {
        match self {
            QuestionTopic::GeneralInfo => "Info general",
            QuestionTopic::SurgeryPreparation => "Preparación para la cirugía",
            QuestionTopic::SurgeryAnesthesia => "Cirugía/Anestesia",
            QuestionTopic::Recovery => "Proceso de recuperación",
            QuestionTopic::PainManagement => "Manejo dolor",
            QuestionTopic::Complications => "Complicaciones",
            QuestionTopic::PostopCare => "Cuidados postop",
            QuestionTopic::Expectations => "Expectativas",
            QuestionTopic::AdditionalResources => "Recursos Adicionales",
            QuestionTopic::LogisticsWaitingTimes => "Logística y tiempos de espera",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReflectionTopic {
    PainComplications,
    WishForSurgery,
    FearWorryAnxiety,
    ConfidencePositivity,
    DailyRoutine,
    Other,
}

impl ReflectionTopic {
    pub const ALL: [ReflectionTopic; 6] = [
        ReflectionTopic::PainComplications,
        ReflectionTopic::WishForSurgery,
        ReflectionTopic::FearWorryAnxiety,
        ReflectionTopic::ConfidencePositivity,
        ReflectionTopic::DailyRoutine,
        ReflectionTopic::Other,
    ];

    pub fn from_code(code: i64) -> Option<Self> {
        lookup(&Self::ALL, code)
    }

    pub fn label(self) -> &'static str {
        match self {
            ReflectionTopic::PainComplications => "Dolor/Complicaciones",
            ReflectionTopic::WishForSurgery => "Deseo de operarse",
            ReflectionTopic::FearWorryAnxiety => "Miedo/preocupación/Ansiedad",
            ReflectionTopic::ConfidencePositivity => "Confianza y positividad",
            ReflectionTopic::DailyRoutine => "Rutina diaria",
            ReflectionTopic::Other => "Otros",
        }
    }
}

fn lookup<T: Copy>(table: &[T], code: i64) -> Option<T> {
    if code < 1 {
        return None;
    }
    table.get(usize::try_from(code - 1).ok()?).copied()
}

/// A mapped category label in one of the two taxonomies.
///
/// Ordering follows the canonical enumeration position, which is also the
/// tie-break used whenever categories are sorted by a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Question(QuestionTopic),
    Reflection(ReflectionTopic),
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Question(t) => t.label(),
            Category::Reflection(t) => t.label(),
        }
    }

    pub fn taxonomy(self) -> Taxonomy {
        match self {
            Category::Question(_) => Taxonomy::Questions,
            Category::Reflection(_) => Taxonomy::Reflections,
        }
    }

    /// The 1-indexed code this category is stored under.
    pub fn code(self) -> i64 {
        let pos = match self {
            Category::Question(t) => QuestionTopic::ALL.iter().position(|x| *x == t),
            Category::Reflection(t) => ReflectionTopic::ALL.iter().position(|x| *x == t),
        };
        pos.map_or(0, |p| p as i64 + 1)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Maps a code to its category, or `None` when the code is unmapped.
pub fn category_for(taxonomy: Taxonomy, code: i64) -> Option<Category> {
    match taxonomy {
        Taxonomy::Questions => QuestionTopic::from_code(code).map(Category::Question),
        Taxonomy::Reflections => ReflectionTopic::from_code(code).map(Category::Reflection),
    }
}

/// All categories of a taxonomy in canonical order.
pub fn categories(taxonomy: Taxonomy) -> Vec<Category> {
    match taxonomy {
        Taxonomy::Questions => QuestionTopic::ALL.iter().copied().map(Category::Question).collect(),
        Taxonomy::Reflections => ReflectionTopic::ALL
            .iter()
            .copied()
            .map(Category::Reflection)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_codes_in_range_have_labels() {
        for code in 1..=10 {
            let c = category_for(Taxonomy::Questions, code).unwrap();
            assert!(!c.label().is_empty());
            assert_eq!(c.code(), code);
        }
        assert_eq!(category_for(Taxonomy::Questions, 0), None);
        assert_eq!(category_for(Taxonomy::Questions, 11), None);
        assert_eq!(category_for(Taxonomy::Questions, -3), None);
    }

    #[test]
    fn reflection_codes_in_range_have_labels() {
        for code in 1..=6 {
            let c = category_for(Taxonomy::Reflections, code).unwrap();
            assert!(!c.label().is_empty());
            assert_eq!(c.taxonomy(), Taxonomy::Reflections);
        }
        assert_eq!(category_for(Taxonomy::Reflections, 0), None);
        assert_eq!(category_for(Taxonomy::Reflections, 7), None);
        assert_eq!(category_for(Taxonomy::Reflections, i64::MAX), None);
    }

    #[test]
    fn canonical_order_matches_codes() {
        let qs = categories(Taxonomy::Questions);
        assert_eq!(qs.len(), 10);
        assert!(qs.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(qs[9].label(), "Logística y tiempos de espera");
        assert_eq!(categories(Taxonomy::Reflections)[5].label(), "Otros");
    }
}
