//! Incident classification.
//!
//! Maps a free-text description onto a municipal service category and an
//! initial priority. Classification is a pure function of its inputs: the
//! same description and hint always yield the same result.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Municipal service area responsible for an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Trees, parks, and green spaces.
    #[serde(rename = "Áreas Verdes")]
    GreenAreas,
    /// Water, sewers, and flooding.
    #[serde(rename = "Obras Sanitarias")]
    Sanitation,
    /// Pavements, potholes, and roads.
    #[serde(rename = "Infraestructura")]
    Infrastructure,
    /// Street lighting.
    #[serde(rename = "Alumbrado Público")]
    PublicLighting,
    /// Waste collection.
    #[serde(rename = "Aseo")]
    Cleaning,
    /// Catch-all when nothing more specific matches.
    #[serde(rename = "Atención General")]
    GeneralAttention,
}

impl Category {
    /// Every category, most specific first.
    pub const ALL: [Self; 6] = [
        Self::GreenAreas,
        Self::Sanitation,
        Self::Infrastructure,
        Self::PublicLighting,
        Self::Cleaning,
        Self::GeneralAttention,
    ];

    /// Human label, also used as the ticket's area name.
    pub fn label(self) -> &'static str {
        match self {
            Self::GreenAreas => "Áreas Verdes",
            Self::Sanitation => "Obras Sanitarias",
            Self::Infrastructure => "Infraestructura",
            Self::PublicLighting => "Alumbrado Público",
            Self::Cleaning => "Aseo",
            Self::GeneralAttention => "Atención General",
        }
    }

    /// ASCII identifier accepted as a hint and stored in the database.
    pub fn slug(self) -> &'static str {
        match self {
            Self::GreenAreas => "areas_verdes",
            Self::Sanitation => "obras_sanitarias",
            Self::Infrastructure => "infraestructura",
            Self::PublicLighting => "alumbrado_publico",
            Self::Cleaning => "aseo",
            Self::GeneralAttention => "atencion_general",
        }
    }

    /// Priority assigned when this category is chosen.
    pub fn base_priority(self) -> Priority {
        Priority(match self {
            Self::GreenAreas => 90,
            Self::Sanitation => 85,
            Self::Infrastructure => 80,
            Self::PublicLighting => 75,
            Self::Cleaning => 70,
            Self::GeneralAttention => 50,
        })
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::GreenAreas => &["arbol"],
            Self::Sanitation => &["agua", "alcantarilla", "inundacion"],
            Self::Infrastructure => &["vereda", "hoyo", "bache", "pavimento"],
            Self::PublicLighting => &["luz", "alumbrado", "poste", "foco"],
            Self::Cleaning => &["basura", "contenedor", "residuo"],
            Self::GeneralAttention => &[],
        }
    }

    /// Resolve a label or slug, ignoring case, accents, and separators.
    ///
    /// # Examples
    /// ```
    /// use vita_backend::domain::Category;
    ///
    /// assert_eq!(Category::from_hint("alumbrado publico"), Some(Category::PublicLighting));
    /// assert_eq!(Category::from_hint("bomberos"), None);
    /// ```
    pub fn from_hint(hint: &str) -> Option<Self> {
        let wanted = fold_separators(&fold(hint));
        if wanted.is_empty() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|category| {
                fold_separators(&fold(category.label())) == wanted || category.slug() == wanted
            })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bounded ticket priority; higher is more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Priority(u8);

/// Errors raised for out-of-range priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error(
    "priority must be between {min} and {max}, got {value}",
    min = Priority::MIN.0,
    max = Priority::MAX.0
)]
pub struct PriorityOutOfRange {
    /// Rejected value.
    pub value: i64,
}

impl Priority {
    /// Lowest priority.
    pub const MIN: Self = Self(0);
    /// Highest priority.
    pub const MAX: Self = Self(100);

    /// Validate a raw score.
    pub fn new(value: i64) -> Result<Self, PriorityOutOfRange> {
        u8::try_from(value)
            .ok()
            .filter(|score| *score <= Self::MAX.0)
            .map(Self)
            .ok_or(PriorityOutOfRange { value })
    }

    /// Numeric score.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Coarse urgency band for this score.
    pub fn urgency(self) -> UrgencyLevel {
        match self.0 {
            85.. => UrgencyLevel::High,
            60.. => UrgencyLevel::Medium,
            _ => UrgencyLevel::Low,
        }
    }
}

/// Urgency band derived from [`Priority`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UrgencyLevel {
    /// Priority 85 and above.
    #[serde(rename = "Alta")]
    High,
    /// Priority 60 to 84.
    #[serde(rename = "Media")]
    Medium,
    /// Priority below 60.
    #[serde(rename = "Baja")]
    Low,
}

impl UrgencyLevel {
    /// Wire label.
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "Alta",
            Self::Medium => "Media",
            Self::Low => "Baja",
        }
    }
}

/// Outcome of classifying an incident description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Responsible service area.
    pub category: Category,
    /// Initial priority.
    pub priority: Priority,
}

impl Classification {
    fn of(category: Category) -> Self {
        Self {
            category,
            priority: category.base_priority(),
        }
    }
}

/// Policy that assigns a category and priority to a new incident.
///
/// Implementations must be deterministic and must never fail: unusable input
/// falls back to [`Category::GeneralAttention`].
pub trait IncidentClassifier: Send + Sync {
    /// Classify `description`, optionally steered by a caller-supplied hint.
    fn classify(&self, description: &str, hint: Option<&str>) -> Classification;
}

/// Descriptions with fewer non-whitespace characters are not classified.
pub const MIN_DESCRIPTION_SIGNAL: usize = 3;

/// Keyword table classifier.
///
/// A hint naming a known category wins over keywords. Otherwise categories
/// are tried in [`Category::ALL`] order and the first whose keyword appears
/// in the description is chosen. Matching ignores case and accents.
///
/// # Examples
/// ```
/// use vita_backend::domain::{Category, IncidentClassifier, KeywordClassifier};
///
/// let result = KeywordClassifier.classify("Se cayó un árbol en la plaza", None);
/// assert_eq!(result.category, Category::GreenAreas);
/// assert_eq!(result.priority.value(), 90);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl IncidentClassifier for KeywordClassifier {
    fn classify(&self, description: &str, hint: Option<&str>) -> Classification {
        let signal = description.chars().filter(|c| !c.is_whitespace()).count();
        if signal < MIN_DESCRIPTION_SIGNAL {
            return Classification::of(Category::GeneralAttention);
        }
        if let Some(category) = hint.and_then(Category::from_hint) {
            return Classification::of(category);
        }
        let text = fold(description);
        let category = Category::ALL
            .into_iter()
            .find(|category| category.keywords().iter().any(|kw| text.contains(kw)))
            .unwrap_or(Category::GeneralAttention);
        Classification::of(category)
    }
}

/// Lower-case and strip Spanish diacritics.
fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

fn fold_separators(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Se cayó un árbol sobre la calle", Category::GreenAreas, 90)]
    #[case("ARBOL caido", Category::GreenAreas, 90)]
    #[case("Hay una fuga de agua", Category::Sanitation, 85)]
    #[case("La alcantarilla está tapada", Category::Sanitation, 85)]
    #[case("Inundación en el paso bajo nivel", Category::Sanitation, 85)]
    #[case("Bache enorme frente al colegio", Category::Infrastructure, 80)]
    #[case("Vereda rota", Category::Infrastructure, 80)]
    #[case("Poste sin luz desde ayer", Category::PublicLighting, 75)]
    #[case("Contenedor de basura desbordado", Category::Cleaning, 70)]
    #[case("Ruidos molestos de madrugada", Category::GeneralAttention, 50)]
    fn keywords_select_category(
        #[case] description: &str,
        #[case] category: Category,
        #[case] priority: u8,
    ) {
        let result = KeywordClassifier.classify(description, None);
        assert_eq!(result.category, category);
        assert_eq!(result.priority.value(), priority);
    }

    #[rstest]
    fn earlier_category_wins_when_several_match() {
        let result = KeywordClassifier.classify("Árbol cayó sobre un poste de luz", None);
        assert_eq!(result.category, Category::GreenAreas);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("a b")]
    fn unusable_description_falls_back(#[case] description: &str) {
        let result = KeywordClassifier.classify(description, Some("aseo"));
        assert_eq!(result.category, Category::GeneralAttention);
        assert_eq!(result.priority, Category::GeneralAttention.base_priority());
    }

    #[rstest]
    #[case("Aseo")]
    #[case("aseo")]
    #[case("Alumbrado Público")]
    #[case("alumbrado-publico")]
    fn hint_overrides_keywords(#[case] hint: &str) {
        let result = KeywordClassifier.classify("Árbol caído", Some(hint));
        assert_ne!(result.category, Category::GreenAreas);
    }

    #[rstest]
    fn unknown_hint_is_ignored() {
        let result = KeywordClassifier.classify("Árbol caído", Some("bomberos"));
        assert_eq!(result.category, Category::GreenAreas);
    }

    #[rstest]
    fn classification_is_deterministic() {
        let text = "Foco apagado en la esquina";
        assert_eq!(
            KeywordClassifier.classify(text, None),
            KeywordClassifier.classify(text, None)
        );
    }

    #[rstest]
    #[case(90, UrgencyLevel::High)]
    #[case(85, UrgencyLevel::High)]
    #[case(84, UrgencyLevel::Medium)]
    #[case(60, UrgencyLevel::Medium)]
    #[case(59, UrgencyLevel::Low)]
    #[case(0, UrgencyLevel::Low)]
    fn urgency_bands(#[case] score: i64, #[case] expected: UrgencyLevel) {
        let priority = Priority::new(score).expect("in range");
        assert_eq!(priority.urgency(), expected);
    }

    #[rstest]
    #[case(-1)]
    #[case(101)]
    #[case(300)]
    fn priority_rejects_out_of_range(#[case] score: i64) {
        assert_eq!(Priority::new(score), Err(PriorityOutOfRange { value: score }));
    }

    #[rstest]
    fn every_slug_round_trips_through_hint() {
        for category in Category::ALL {
            assert_eq!(Category::from_hint(category.slug()), Some(category));
            assert_eq!(Category::from_hint(category.label()), Some(category));
        }
    }
}
