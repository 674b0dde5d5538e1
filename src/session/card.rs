//! Option cards
//!
//! A card is one generated idea within a dimension. Its generated body never
//! changes; refinement only appends to the card's conversation log.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{REFINEMENT_CONFIDENCE_CAP, REFINEMENT_CONFIDENCE_STEP};
use crate::error::CanvasError;

/// Unique card identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(Uuid);

impl CardId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CardId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Conceptual dimension a card belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Design,
    Technical,
    User,
    Business,
    Ethical,
}

impl Dimension {
    /// Every dimension, in canonical order
    pub const ALL: [Dimension; 5] = [
        Dimension::Design,
        Dimension::Technical,
        Dimension::User,
        Dimension::Business,
        Dimension::Ethical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Design => "design",
            Dimension::Technical => "technical",
            Dimension::User => "user",
            Dimension::Business => "business",
            Dimension::Ethical => "ethical",
        }
    }

    /// Human label
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Design => "Design",
            Dimension::Technical => "Technical",
            Dimension::User => "User",
            Dimension::Business => "Business",
            Dimension::Ethical => "Ethical",
        }
    }
}

/// Accepts the wire names plus a few short aliases, case-insensitively
impl FromStr for Dimension {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "design" => Ok(Dimension::Design),
            "technical" | "tech" => Ok(Dimension::Technical),
            "user" | "ux" => Ok(Dimension::User),
            "business" => Ok(Dimension::Business),
            "ethical" | "ethics" => Ok(Dimension::Ethical),
            _ => Err(CanvasError::UnknownDimension(s.to_string())),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speaker of a refinement message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of a card's refinement log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refinement {
    pub role: Role,
    pub content: String,
}

/// Card content as produced by an [`super::OptionGenerator`], before it has an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDraft {
    pub dimension: Dimension,
    pub title: String,
    pub description: String,
    pub confidence: f32,
    #[serde(default)]
    pub tags: Vec<String>,
    pub content: String,
}

/// A draggable option card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    id: CardId,
    dimension: Dimension,
    title: String,
    description: String,
    confidence: f32,
    tags: Vec<String>,
    content: String,
    refinements: Vec<Refinement>,
    collected: bool,
    artifact_id: Option<String>,
}

impl Card {
    /// Build a card from a draft. Confidence is clamped into [0, 1].
    pub fn from_draft(id: CardId, draft: OptionDraft) -> Self {
        let confidence = if draft.confidence.is_finite() {
            draft.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            id,
            dimension: draft.dimension,
            title: draft.title,
            description: draft.description,
            confidence,
            tags: draft.tags,
            content: draft.content,
            refinements: Vec::new(),
            collected: false,
            artifact_id: None,
        }
    }

    pub fn id(&self) -> CardId {
        self.id
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn refinements(&self) -> &[Refinement] {
        &self.refinements
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }

    pub fn artifact_id(&self) -> Option<&str> {
        self.artifact_id.as_deref()
    }

    /// Append one refinement exchange and nudge confidence upward.
    ///
    /// Returns the new confidence.
    pub fn record_refinement(&mut self, message: String, reply: String) -> f32 {
        self.refinements.push(Refinement {
            role: Role::User,
            content: message,
        });
        self.refinements.push(Refinement {
            role: Role::Assistant,
            content: reply,
        });
        self.confidence = refined_confidence(self.confidence);
        self.confidence
    }

    /// Mark collected. Returns false (and changes nothing) if already collected.
    pub fn mark_collected(&mut self, artifact_id: String) -> bool {
        if self.collected {
            return false;
        }
        self.collected = true;
        self.artifact_id = Some(artifact_id);
        true
    }
}

/// Confidence after one more refinement: +step, capped, never lower than before
pub fn refined_confidence(current: f32) -> f32 {
    current.max((current + REFINEMENT_CONFIDENCE_STEP).min(REFINEMENT_CONFIDENCE_CAP))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn draft(dimension: Dimension, confidence: f32) -> OptionDraft {
        OptionDraft {
            dimension,
            title: format!("{} idea", dimension.label()),
            description: "short".to_string(),
            confidence,
            tags: vec![dimension.as_str().to_string()],
            content: "body".to_string(),
        }
    }

    #[test]
    fn test_from_draft_clamps_confidence() {
        let card = Card::from_draft(CardId::new(), draft(Dimension::User, 1.7));
        assert_eq!(card.confidence(), 1.0);
        let card = Card::from_draft(CardId::new(), draft(Dimension::User, f32::NAN));
        assert_eq!(card.confidence(), 0.0);
        assert!(card.refinements().is_empty());
        assert!(!card.is_collected());
    }

    #[test]
    fn test_refinement_appends_pair() {
        let mut card = Card::from_draft(CardId::new(), draft(Dimension::Design, 0.7));
        let confidence = card.record_refinement("make it bolder".into(), "bolder".into());
        assert_eq!(card.refinements().len(), 2);
        assert_eq!(card.refinements()[0].role, Role::User);
        assert_eq!(card.refinements()[1].role, Role::Assistant);
        assert!((confidence - 0.75).abs() < 1e-6);
        assert_eq!(card.content(), "body");
    }

    #[test]
    fn test_confidence_caps() {
        assert_eq!(refined_confidence(0.95), 0.98);
        assert_eq!(refined_confidence(0.98), 0.98);
        // Already above the cap: unchanged, never lowered
        assert_eq!(refined_confidence(0.99), 0.99);
    }

    #[test]
    fn test_collected_is_monotonic() {
        let mut card = Card::from_draft(CardId::new(), draft(Dimension::Business, 0.8));
        assert!(card.mark_collected("a-1".into()));
        assert!(!card.mark_collected("a-2".into()));
        assert_eq!(card.artifact_id(), Some("a-1"));
        assert!(card.is_collected());
    }

    #[test]
    fn test_dimension_parse() {
        assert_eq!("Tech".parse::<Dimension>().unwrap(), Dimension::Technical);
        assert_eq!(" ethics ".parse::<Dimension>().unwrap(), Dimension::Ethical);
        let err = "marketing".parse::<Dimension>().unwrap_err();
        assert!(matches!(err, CanvasError::UnknownDimension(ref s) if s == "marketing"));
        assert_eq!(
            serde_json::to_string(&Dimension::User).unwrap(),
            "\"user\""
        );
    }

    proptest! {
        #[test]
        fn prop_confidence_monotonic_and_bounded(start in 0.0f32..=1.0, rounds in 1usize..30) {
            let mut card = Card::from_draft(CardId::new(), draft(Dimension::Technical, start));
            let mut last = card.confidence();
            for i in 0..rounds {
                let c = card.record_refinement(format!("m{i}"), format!("r{i}"));
                prop_assert!(c >= last);
                prop_assert!((0.0..=1.0).contains(&c));
                prop_assert!(c <= REFINEMENT_CONFIDENCE_CAP.max(start));
                last = c;
            }
            prop_assert_eq!(card.refinements().len() % 2, 0);
        }
    }
}
