//! Option generation
//!
//! The canvas only depends on [`OptionGenerator`]. [`MockGenerator`] is the
//! seeded reference implementation: it produces 2-3 placeholder options per
//! dimension with confidence drawn from a configurable range.

use std::ops::RangeInclusive;
use std::sync::Mutex;

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::card::{Dimension, OptionDraft};
use crate::error::{CanvasError, Result};

/// Produces option drafts for a prompt
#[async_trait]
pub trait OptionGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Vec<OptionDraft>>;
}

/// Confidence range for first-pass exploration batches
pub const EXPLORATION_CONFIDENCE: RangeInclusive<f32> = 0.6..=0.95;
/// Confidence range once the session has refinement context
pub const REFINEMENT_CONFIDENCE: RangeInclusive<f32> = 0.65..=0.95;

const PER_DIMENSION: RangeInclusive<usize> = 2..=3;

/// Seeded placeholder generator
#[derive(Debug)]
pub struct MockGenerator {
    dimensions: Vec<Dimension>,
    confidence: RangeInclusive<f32>,
    rng: Mutex<Pcg32>,
}

impl MockGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            dimensions: Dimension::ALL.to_vec(),
            confidence: EXPLORATION_CONFIDENCE,
            rng: Mutex::new(Pcg32::seed_from_u64(seed)),
        }
    }

    /// Restrict generation to `dimensions` (order kept)
    pub fn with_dimensions(mut self, dimensions: &[Dimension]) -> Self {
        self.dimensions = dimensions.to_vec();
        self
    }

    pub fn with_confidence(mut self, range: RangeInclusive<f32>) -> Self {
        self.confidence = range;
        self
    }

    /// Generator tuned for sessions that already have refinements
    pub fn refinement_aware(seed: u64) -> Self {
        Self::new(seed).with_confidence(REFINEMENT_CONFIDENCE)
    }

    fn draft(&self, rng: &mut Pcg32, prompt: &str, dimension: Dimension, n: usize) -> OptionDraft {
        let confidence = rng.random_range(self.confidence.clone());
        let title = format!("{} option {} for \"{}\"", dimension.label(), n + 1, prompt);
        OptionDraft {
            dimension,
            description: format!(
                "A {} take on {}.",
                dimension.as_str(),
                prompt.to_lowercase()
            ),
            content: format!(
                "{title}\n\nExplores the {} dimension of the request. Refine this card to \
                 develop the idea further.",
                dimension.as_str()
            ),
            title,
            confidence,
            tags: vec![dimension.as_str().to_string(), format!("option-{}", n + 1)],
        }
    }
}

#[async_trait]
impl OptionGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<OptionDraft>> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(CanvasError::EmptyPrompt);
        }
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| CanvasError::Generation("generator state poisoned".to_string()))?;

        let mut drafts = Vec::new();
        for &dimension in &self.dimensions {
            let count = rng.random_range(PER_DIMENSION);
            for n in 0..count {
                drafts.push(self.draft(&mut rng, prompt, dimension, n));
            }
        }
        log::debug!(
            "Mock generator produced {} drafts over {} dimensions",
            drafts.len(),
            self.dimensions.len()
        );
        Ok(drafts)
    }
}
