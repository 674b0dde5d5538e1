//! Next-action suggestions
//!
//! A pure function of the cards and the phase; the display layer shows the
//! result and nothing feeds back into the core.

use serde::{Deserialize, Serialize};

use super::card::{Card, Dimension};
use super::phase::Phase;
use crate::consts::{HIGH_CONFIDENCE, MAX_SUGGESTIONS};

/// Minimum distinct dimensions before "add a dimension" stops being offered
const MIN_DIMENSIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SuggestionKind {
    ExploreMoreDimensions,
    RefineTopOptions,
    AddDimension(Dimension),
    CollectBestOptions,
    StartBuilding,
    HighConfidence(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub label: String,
}

impl From<SuggestionKind> for Suggestion {
    fn from(kind: SuggestionKind) -> Self {
        let label = match kind {
            SuggestionKind::ExploreMoreDimensions => "Explore more dimensions".to_string(),
            SuggestionKind::RefineTopOptions => "Refine top options".to_string(),
            SuggestionKind::AddDimension(d) => format!("Add {} perspective", d.label()),
            SuggestionKind::CollectBestOptions => "Collect best options".to_string(),
            SuggestionKind::StartBuilding => "Start building".to_string(),
            SuggestionKind::HighConfidence(n) => {
                format!("{n} high-confidence option{}", if n == 1 { "" } else { "s" })
            }
        };
        Self { kind, label }
    }
}

/// Up to four suggestions for the current cards and phase
pub fn suggest(cards: &[Card], phase: Phase) -> Vec<Suggestion> {
    let mut kinds = Vec::new();

    match phase {
        Phase::Exploration => {
            kinds.push(SuggestionKind::ExploreMoreDimensions);
            kinds.push(SuggestionKind::RefineTopOptions);

            let present: Vec<Dimension> = Dimension::ALL
                .into_iter()
                .filter(|d| cards.iter().any(|c| c.dimension() == *d))
                .collect();
            if present.len() < MIN_DIMENSIONS
                && let Some(missing) = Dimension::ALL.into_iter().find(|d| !present.contains(d))
            {
                kinds.push(SuggestionKind::AddDimension(missing));
            }
        }
        Phase::Refinement => {
            kinds.push(SuggestionKind::CollectBestOptions);
            kinds.push(SuggestionKind::StartBuilding);
        }
        _ => {}
    }

    let high = cards
        .iter()
        .filter(|c| c.confidence() > HIGH_CONFIDENCE)
        .count();
    if high > 0 {
        kinds.push(SuggestionKind::HighConfidence(high));
    }

    kinds.truncate(MAX_SUGGESTIONS);
    kinds.into_iter().map(Suggestion::from).collect()
}
