//! In-memory card repository
//!
//! Cards are kept in insertion order; lookups are linear, which is plenty for
//! the handful of cards a canvas holds.

use std::collections::BTreeMap;

use super::card::{Card, CardId, Dimension, OptionDraft};
use crate::consts::HIGH_CONFIDENCE;

#[derive(Debug, Clone, Default)]
pub struct CardRepository {
    cards: Vec<Card>,
}

impl CardRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn a generated batch into cards, minting a fresh unique id for each
    pub fn insert_drafts(&mut self, drafts: Vec<OptionDraft>) -> Vec<CardId> {
        let mut ids = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let mut id = CardId::new();
            while self.contains(&id) {
                id = CardId::new();
            }
            self.cards.push(Card::from_draft(id, draft));
            ids.push(id);
        }
        ids
    }

    pub fn get(&self, id: &CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id() == *id)
    }

    pub(crate) fn get_mut(&mut self, id: &CardId) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id() == *id)
    }

    pub fn contains(&self, id: &CardId) -> bool {
        self.get(id).is_some()
    }

    pub fn remove(&mut self, id: &CardId) -> Option<Card> {
        let index = self.cards.iter().position(|c| c.id() == *id)?;
        Some(self.cards.remove(index))
    }

    pub fn as_slice(&self) -> &[Card] {
        &self.cards
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards grouped by dimension (canonical dimension order, insertion order within)
    pub fn by_dimension(&self) -> BTreeMap<Dimension, Vec<&Card>> {
        let mut groups: BTreeMap<Dimension, Vec<&Card>> = BTreeMap::new();
        for card in &self.cards {
            groups.entry(card.dimension()).or_default().push(card);
        }
        groups
    }

    /// Dimensions with at least one card, in canonical order
    pub fn dimensions_present(&self) -> Vec<Dimension> {
        Dimension::ALL
            .into_iter()
            .filter(|d| self.cards.iter().any(|c| c.dimension() == *d))
            .collect()
    }

    pub fn collected_count(&self) -> usize {
        self.cards.iter().filter(|c| c.is_collected()).count()
    }

    pub fn high_confidence_count(&self) -> usize {
        self.cards
            .iter()
            .filter(|c| c.confidence() > HIGH_CONFIDENCE)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn draft(dimension: Dimension, confidence: f32) -> OptionDraft {
        OptionDraft {
            dimension,
            title: "t".into(),
            description: "d".into(),
            confidence,
            tags: Vec::new(),
            content: "c".into(),
        }
    }

    #[test]
    fn test_insert_assigns_unique_ids() {
        let mut repo = CardRepository::new();
        let ids = repo.insert_drafts((0..50).map(|_| draft(Dimension::User, 0.7)).collect());
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 50);
        assert_eq!(repo.len(), 50);
        assert!(ids.iter().all(|id| repo.contains(id)));
    }

    #[test]
    fn test_grouping_and_presence() {
        let mut repo = CardRepository::new();
        repo.insert_drafts(vec![
            draft(Dimension::Ethical, 0.9),
            draft(Dimension::Design, 0.6),
            draft(Dimension::Ethical, 0.7),
        ]);
        let groups = repo.by_dimension();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&Dimension::Ethical].len(), 2);
        assert_eq!(
            repo.dimensions_present(),
            vec![Dimension::Design, Dimension::Ethical]
        );
        assert_eq!(repo.high_confidence_count(), 1);
    }

    #[test]
    fn test_remove() {
        let mut repo = CardRepository::new();
        let ids = repo.insert_drafts(vec![draft(Dimension::User, 0.7), draft(Dimension::User, 0.8)]);
        assert!(repo.remove(&ids[0]).is_some());
        assert!(repo.remove(&ids[0]).is_none());
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.as_slice()[0].id(), ids[1]);
    }
}
