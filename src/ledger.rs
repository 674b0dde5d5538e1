//! Collected-card and decision logs
//!
//! Append-only, in memory. The canvas writes here when a collection or a
//! refinement lands; the presentational layer reads it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Card, CardId};

/// A card as it looked when it was collected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedEntry {
    pub card: Card,
    pub artifact_id: String,
    pub collected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DecisionKind {
    Refined { confidence: f32 },
    Collected { artifact_id: String },
}

/// One user decision on a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub card_id: CardId,
    pub title: String,
    #[serde(flatten)]
    pub kind: DecisionKind,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    collected: Vec<CollectedEntry>,
    decisions: Vec<Decision>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a collected snapshot. A card already in the list is not added
    /// again; returns whether the entry was appended.
    pub fn record_collection(&mut self, card: &Card, at: DateTime<Utc>) -> bool {
        if self.contains(&card.id()) {
            return false;
        }
        let artifact_id = card.artifact_id().unwrap_or_default().to_string();
        self.decisions.push(Decision {
            card_id: card.id(),
            title: card.title().to_string(),
            kind: DecisionKind::Collected {
                artifact_id: artifact_id.clone(),
            },
            at,
        });
        self.collected.push(CollectedEntry {
            card: card.clone(),
            artifact_id,
            collected_at: at,
        });
        log::debug!("Ledger holds {} collected cards", self.collected.len());
        true
    }

    pub fn record_refinement(&mut self, card: &Card, at: DateTime<Utc>) {
        self.decisions.push(Decision {
            card_id: card.id(),
            title: card.title().to_string(),
            kind: DecisionKind::Refined {
                confidence: card.confidence(),
            },
            at,
        });
    }

    /// Collected snapshots in collection order
    pub fn collected(&self) -> &[CollectedEntry] {
        &self.collected
    }

    /// All decisions, oldest first
    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn collected_len(&self) -> usize {
        self.collected.len()
    }

    pub fn contains(&self, id: &CardId) -> bool {
        self.collected.iter().any(|e| e.card.id() == *id)
    }
}
