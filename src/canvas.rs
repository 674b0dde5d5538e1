//! Canvas orchestration
//!
//! [`Canvas`] owns every piece of mutable state: cards, bodies, phase, ledger
//! and focus. It is driven from a single control thread. Network work is
//! split in three so that thread is never blocked:
//!
//! 1. `begin_*` validates, takes the processing permit (generate/refine) or
//!    marks the card in flight (collect), and returns a pending request.
//! 2. The pending request's `run()` future owns everything it needs and
//!    touches no canvas state, so it can be spawned or awaited anywhere.
//! 3. `apply_*` folds the outcome back into the canvas and releases the permit.
//!
//! `generate`, `refine` and `collect` chain the three for callers that are
//! happy to await in place.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use glam::Vec2;
use rand_pcg::Pcg32;
use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::api::{
    ApiError, ArtifactMetadata, ArtifactRef, ArtifactRequest, Backend, CollectionRecord,
    CreateSessionRequest, HttpBackend, RefinementContext, RefinementRequest, accumulate,
};
use crate::error::{CanvasError, Result};
use crate::ledger::Ledger;
use crate::session::{
    Card, CardId, CardRepository, OptionDraft, OptionGenerator, Phase, PhaseEvent, PhaseMachine,
    Session, Suggestion, session_name, suggest,
};
use crate::settings::Settings;
use crate::sim::{Body, Motion, PositionStore, RngState, spawn_ring};

/// Assistant text used when a refinement stream carried no chunks
pub const EMPTY_REFINEMENT_FALLBACK: &str = "No refinement was returned for this option.";

/// Artifact `type` for collected cards
const ARTIFACT_KIND: &str = "option";

async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = std::result::Result<T, ApiError>>,
) -> std::result::Result<T, ApiError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| ApiError::Timeout(limit))?
}

/// A generation request that holds the processing permit
pub struct PendingGeneration {
    permit: OwnedSemaphorePermit,
    prompt: String,
    session_request: Option<CreateSessionRequest>,
    backend: Arc<dyn Backend>,
    generator: Arc<dyn OptionGenerator>,
    timeout: Duration,
}

/// Result of [`PendingGeneration::run`], to be passed to [`Canvas::apply_generation`]
pub struct GenerationOutcome {
    permit: OwnedSemaphorePermit,
    prompt: String,
    session: Option<Session>,
    drafts: Result<Vec<OptionDraft>>,
}

impl PendingGeneration {
    /// Create the backend session if the canvas has none yet, then generate.
    ///
    /// Session creation is best-effort: on failure the batch still lands and
    /// the next prompt tries again.
    pub async fn run(self) -> GenerationOutcome {
        let session = match self.session_request {
            Some(request) => {
                match with_timeout(self.timeout, self.backend.create_session(&request)).await {
                    Ok(info) => {
                        log::info!("Created session {}", info.id);
                        Some(Session {
                            id: info.id,
                            created_prompt: request.initial_prompt,
                        })
                    }
                    Err(e) => {
                        log::warn!("Session creation failed: {}", e);
                        None
                    }
                }
            }
            None => None,
        };

        let drafts = self.generator.generate(&self.prompt).await;
        GenerationOutcome {
            permit: self.permit,
            prompt: self.prompt,
            session,
            drafts,
        }
    }
}

/// A refinement request that holds the processing permit
pub struct PendingRefinement {
    permit: OwnedSemaphorePermit,
    card_id: CardId,
    request: RefinementRequest,
    backend: Arc<dyn Backend>,
    timeout: Duration,
}

/// Result of [`PendingRefinement::run`]
pub struct RefinementOutcome {
    permit: OwnedSemaphorePermit,
    card_id: CardId,
    message: String,
    reply: std::result::Result<String, ApiError>,
}

impl PendingRefinement {
    pub fn card_id(&self) -> CardId {
        self.card_id
    }

    /// Open the stream and drain it; the whole exchange shares one timeout
    pub async fn run(self) -> RefinementOutcome {
        let backend = self.backend;
        let request = self.request;
        let reply = with_timeout(self.timeout, async {
            let bytes = backend.open_refinement(&request).await?;
            accumulate(bytes).await
        })
        .await;
        RefinementOutcome {
            permit: self.permit,
            card_id: self.card_id,
            message: request.message,
            reply,
        }
    }
}

/// What a successful refinement did to its card
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinedContent {
    pub card_id: CardId,
    pub content: String,
    pub confidence: f32,
}

/// A collection request for one card
pub struct PendingCollection {
    card_id: CardId,
    request: ArtifactRequest,
    backend: Arc<dyn Backend>,
    timeout: Duration,
}

/// Result of [`PendingCollection::run`]
pub struct CollectionOutcome {
    card_id: CardId,
    collected_at: DateTime<Utc>,
    artifact: std::result::Result<ArtifactRef, ApiError>,
}

impl PendingCollection {
    pub fn card_id(&self) -> CardId {
        self.card_id
    }

    pub async fn run(self) -> CollectionOutcome {
        let artifact =
            with_timeout(self.timeout, self.backend.create_artifact(&self.request)).await;
        CollectionOutcome {
            card_id: self.card_id,
            collected_at: self.request.metadata.collected_at,
            artifact,
        }
    }
}

/// Best-effort record of a collection against the session
pub struct CollectionNotice {
    session_id: String,
    record: CollectionRecord,
    backend: Arc<dyn Backend>,
    timeout: Duration,
}

impl CollectionNotice {
    /// Send the record. Failures are logged and otherwise ignored.
    pub async fn send(self) {
        let result = with_timeout(
            self.timeout,
            self.backend.record_collection(&self.session_id, &self.record),
        )
        .await;
        match result {
            Ok(()) => log::debug!(
                "Recorded collection of {} in session {}",
                self.record.option_id,
                self.session_id
            ),
            Err(e) => log::warn!(
                "Could not record collection of {} in session {}: {}",
                self.record.option_id,
                self.session_id,
                e
            ),
        }
    }
}

/// A card that just became collected
pub struct Collected {
    pub artifact: ArtifactRef,
    /// Present when the canvas has a session to record against
    pub notice: Option<CollectionNotice>,
}

/// Where [`Canvas::submit_input`] sent the text
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    Generated(Vec<CardId>),
    Refined(RefinedContent),
}

/// A card with its current body, for display
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    #[serde(flatten)]
    pub card: Card,
    pub position: Vec2,
    pub scale: f32,
    pub moving: bool,
}

/// Serializable view of the whole canvas
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSnapshot {
    pub session: Option<Session>,
    pub phase: Phase,
    pub cards: Vec<CardView>,
    pub focused: Option<CardId>,
    pub collected: usize,
    pub processing: bool,
    pub suggestions: Vec<Suggestion>,
}

/// The canvas control core
pub struct Canvas {
    settings: Settings,
    backend: Arc<dyn Backend>,
    generator: Arc<dyn OptionGenerator>,
    permit: Arc<Semaphore>,
    session: Option<Session>,
    phases: PhaseMachine,
    cards: CardRepository,
    positions: PositionStore<CardId>,
    ledger: Ledger,
    focused: Option<CardId>,
    collecting: HashSet<CardId>,
    rng: Pcg32,
}

impl Canvas {
    pub fn new(
        settings: Settings,
        backend: Arc<dyn Backend>,
        generator: Arc<dyn OptionGenerator>,
    ) -> Result<Self> {
        settings.validate()?;
        let positions = PositionStore::new(settings.bounds(), settings.physics);
        let rng = RngState::new(settings.seed).to_rng();
        log::info!(
            "Canvas ready ({}x{}, backend {})",
            settings.viewport.width,
            settings.viewport.height,
            settings.api.base_url
        );
        Ok(Self {
            settings,
            backend,
            generator,
            permit: Arc::new(Semaphore::new(1)),
            session: None,
            phases: PhaseMachine::new(),
            cards: CardRepository::new(),
            positions,
            ledger: Ledger::new(),
            focused: None,
            collecting: HashSet::new(),
            rng,
        })
    }

    /// Canvas talking to the HTTP backend at `settings.api.base_url`
    pub fn with_http(settings: Settings, generator: Arc<dyn OptionGenerator>) -> Result<Self> {
        let backend = HttpBackend::new(&settings.api)?;
        Self::new(settings, Arc::new(backend), generator)
    }

    fn timeout(&self) -> Duration {
        self.settings.api.request_timeout()
    }

    fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        Arc::clone(&self.permit)
            .try_acquire_owned()
            .map_err(|_| CanvasError::Busy)
    }

    // --- accessors ---

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phases.phase()
    }

    pub fn phases(&self) -> &PhaseMachine {
        &self.phases
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn cards(&self) -> &CardRepository {
        &self.cards
    }

    pub fn card(&self, id: &CardId) -> Option<&Card> {
        self.cards.get(id)
    }

    pub fn position(&self, id: &CardId) -> Option<Vec2> {
        self.positions.position(id)
    }

    pub fn body(&self, id: &CardId) -> Option<&Body> {
        self.positions.get(id)
    }

    pub fn motion(&self, id: &CardId) -> Option<Motion> {
        self.positions.motion(id)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// A generate or refine request holds the permit
    pub fn is_processing(&self) -> bool {
        self.permit.available_permits() == 0
    }

    pub fn is_collecting(&self, id: &CardId) -> bool {
        self.collecting.contains(id)
    }

    // --- generation ---

    pub fn begin_generation(&mut self, prompt: &str) -> Result<PendingGeneration> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(CanvasError::EmptyPrompt);
        }
        let permit = self.acquire()?;
        let session_request = self.session.is_none().then(|| CreateSessionRequest {
            name: session_name(prompt),
            project_id: self.settings.api.project_id.clone(),
            initial_prompt: prompt.to_string(),
        });
        log::info!("Generating options for \"{}\"", prompt);
        Ok(PendingGeneration {
            permit,
            prompt: prompt.to_string(),
            session_request,
            backend: Arc::clone(&self.backend),
            generator: Arc::clone(&self.generator),
            timeout: self.timeout(),
        })
    }

    /// Land a generated batch: cards, ring placement, phase advance.
    ///
    /// Returns the new card ids in batch order.
    pub fn apply_generation(&mut self, outcome: GenerationOutcome) -> Result<Vec<CardId>> {
        let GenerationOutcome {
            permit: _permit,
            prompt,
            session,
            drafts,
        } = outcome;

        if self.session.is_none()
            && let Some(session) = session
        {
            self.session = Some(session);
        }

        let drafts = drafts.inspect_err(|e| log::warn!("Generation for \"{}\" failed: {}", prompt, e))?;
        let ids = self.cards.insert_drafts(drafts);
        let bodies = spawn_ring(
            self.positions.bounds(),
            ids.len(),
            &self.settings.placement,
            &mut self.rng,
        );
        for (id, body) in ids.iter().zip(bodies) {
            self.positions.insert(*id, body);
        }
        log::info!("Placed {} new cards ({} total)", ids.len(), self.cards.len());

        self.phases.apply(PhaseEvent::GenerationCompleted)?;
        Ok(ids)
    }

    pub async fn generate(&mut self, prompt: &str) -> Result<Vec<CardId>> {
        let pending = self.begin_generation(prompt)?;
        let outcome = pending.run().await;
        self.apply_generation(outcome)
    }

    // --- refinement ---

    pub fn begin_refinement(&mut self, card_id: CardId, message: &str) -> Result<PendingRefinement> {
        let message = message.trim();
        if message.is_empty() {
            return Err(CanvasError::EmptyPrompt);
        }
        let card = self
            .cards
            .get(&card_id)
            .ok_or(CanvasError::UnknownCard(card_id))?;
        let request = RefinementRequest {
            message: message.to_string(),
            mode: self.settings.api.refinement_mode.clone(),
            session_id: self.session.as_ref().map(|s| s.id.clone()),
            context: RefinementContext {
                route: "refinement".to_string(),
                card_id: card_id.to_string(),
                card_content: card.content().to_string(),
                card_title: card.title().to_string(),
            },
        };
        let permit = self.acquire()?;
        log::info!("Refining card {}", card_id);
        Ok(PendingRefinement {
            permit,
            card_id,
            request,
            backend: Arc::clone(&self.backend),
            timeout: self.timeout(),
        })
    }

    /// Append the exchange to the card and nudge its confidence.
    ///
    /// On a failed stream nothing is appended; either way the permit is
    /// released when this returns.
    pub fn apply_refinement(&mut self, outcome: RefinementOutcome) -> Result<RefinedContent> {
        let RefinementOutcome {
            permit: _permit,
            card_id,
            message,
            reply,
        } = outcome;

        let reply = reply.inspect_err(|e| log::warn!("Refinement of {} failed: {}", card_id, e))?;
        let content = if reply.trim().is_empty() {
            EMPTY_REFINEMENT_FALLBACK.to_string()
        } else {
            reply
        };

        let card = self
            .cards
            .get_mut(&card_id)
            .ok_or(CanvasError::UnknownCard(card_id))?;
        let confidence = card.record_refinement(message, content.clone());
        self.ledger.record_refinement(card, Utc::now());
        log::info!(
            "Card {} refined ({} chars, confidence {:.2})",
            card_id,
            content.len(),
            confidence
        );

        self.phases.apply(PhaseEvent::RefinementReceived)?;
        Ok(RefinedContent {
            card_id,
            content,
            confidence,
        })
    }

    pub async fn refine(&mut self, card_id: CardId, message: &str) -> Result<RefinedContent> {
        let pending = self.begin_refinement(card_id, message)?;
        let outcome = pending.run().await;
        self.apply_refinement(outcome)
    }

    // --- focus and input routing ---

    pub fn focus(&mut self, card_id: CardId) -> Result<()> {
        if !self.cards.contains(&card_id) {
            return Err(CanvasError::UnknownCard(card_id));
        }
        self.focused = Some(card_id);
        Ok(())
    }

    pub fn clear_focus(&mut self) {
        self.focused = None;
    }

    pub fn focused(&self) -> Option<CardId> {
        self.focused
    }

    /// Refine the focused card, or generate from `text` when nothing is focused
    pub async fn submit_input(&mut self, text: &str) -> Result<InputOutcome> {
        match self.focused {
            Some(card_id) => self
                .refine(card_id, text)
                .await
                .map(InputOutcome::Refined),
            None => self.generate(text).await.map(InputOutcome::Generated),
        }
    }

    // --- collection ---

    /// Start collecting a card.
    ///
    /// Returns `None` (and does nothing) when the card does not exist, is
    /// already collected, or already has a collection in flight.
    pub fn begin_collection(&mut self, card_id: CardId) -> Option<PendingCollection> {
        let card = self.cards.get(&card_id)?;
        if card.is_collected() || self.collecting.contains(&card_id) {
            log::debug!("Card {} already collected or in flight", card_id);
            return None;
        }

        let request = ArtifactRequest {
            name: card.title().to_string(),
            kind: ARTIFACT_KIND.to_string(),
            content: card.content().to_string(),
            metadata: ArtifactMetadata {
                dimension: card.dimension(),
                confidence: card.confidence(),
                tags: card.tags().to_vec(),
                refinements: card.refinements().to_vec(),
                session_id: self.session.as_ref().map(|s| s.id.clone()),
                collected_at: Utc::now(),
            },
        };
        self.collecting.insert(card_id);
        log::info!("Collecting card {}", card_id);
        Some(PendingCollection {
            card_id,
            request,
            backend: Arc::clone(&self.backend),
            timeout: self.timeout(),
        })
    }

    /// Mark the card collected and snapshot it into the ledger.
    ///
    /// Returns `Ok(None)` if the card is gone or was collected meanwhile.
    pub fn apply_collection(&mut self, outcome: CollectionOutcome) -> Result<Option<Collected>> {
        let CollectionOutcome {
            card_id,
            collected_at,
            artifact,
        } = outcome;
        self.collecting.remove(&card_id);

        let artifact =
            artifact.inspect_err(|e| log::warn!("Collection of {} failed: {}", card_id, e))?;
        let Some(card) = self.cards.get_mut(&card_id) else {
            log::debug!("Card {} removed before its collection landed", card_id);
            return Ok(None);
        };
        if !card.mark_collected(artifact.id.clone()) {
            return Ok(None);
        }
        self.ledger.record_collection(card, collected_at);
        log::info!("Card {} collected as artifact {}", card_id, artifact.id);

        let notice = self.session.as_ref().map(|session| CollectionNotice {
            session_id: session.id.clone(),
            record: CollectionRecord {
                option_id: card_id.to_string(),
                node_id: artifact.id.clone(),
            },
            backend: Arc::clone(&self.backend),
            timeout: self.timeout(),
        });
        Ok(Some(Collected { artifact, notice }))
    }

    /// Collect a card and record it against the session.
    ///
    /// `Ok(None)` means nothing was done (missing, collected, or in flight).
    pub async fn collect(&mut self, card_id: CardId) -> Result<Option<ArtifactRef>> {
        let Some(pending) = self.begin_collection(card_id) else {
            return Ok(None);
        };
        let outcome = pending.run().await;
        let Some(collected) = self.apply_collection(outcome)? else {
            return Ok(None);
        };
        if let Some(notice) = collected.notice {
            notice.send().await;
        }
        Ok(Some(collected.artifact))
    }

    // --- phases ---

    pub fn can_start_build(&self) -> bool {
        self.phases.can_start_build(self.ledger.collected_len())
    }

    /// Explicit refinement -> build transition
    pub fn start_build(&mut self) -> Result<Phase> {
        self.phases.apply(PhaseEvent::BuildRequested {
            collected: self.ledger.collected_len(),
        })?;
        Ok(self.phases.phase())
    }

    /// Explicit build -> ship transition
    pub fn mark_shipped(&mut self) -> Result<Phase> {
        self.phases.apply(PhaseEvent::Shipped)?;
        Ok(self.phases.phase())
    }

    pub fn suggestions(&self) -> Vec<Suggestion> {
        suggest(self.cards.as_slice(), self.phases.phase())
    }

    // --- motion ---

    pub fn begin_drag(&mut self, card_id: CardId, pointer: Vec2) -> bool {
        self.positions.begin_drag(card_id, pointer)
    }

    pub fn drag_to(&mut self, pointer: Vec2) -> Option<Vec2> {
        self.positions.drag_to(pointer)
    }

    /// Release the dragged card. Returns whether it is now coasting.
    pub fn end_drag(&mut self) -> bool {
        self.positions.end_drag().is_some()
    }

    /// Advance every coasting card one tick; returns how many still move
    pub fn step_frame(&mut self) -> usize {
        self.positions.step()
    }

    pub fn is_animating(&self) -> bool {
        self.positions.is_animating()
    }

    /// Resize the viewport and pull every resting or coasting card inside
    pub fn set_viewport(&mut self, width: f32, height: f32) -> Result<()> {
        let mut settings = self.settings.clone();
        settings.viewport.width = width;
        settings.viewport.height = height;
        settings.validate()?;
        self.positions.set_bounds(settings.bounds());
        self.settings = settings;
        log::debug!("Viewport resized to {}x{}", width, height);
        Ok(())
    }

    /// Drop a card and its body. Focus on it is cleared and its momentum
    /// stops.
    ///
    /// Collected cards, and cards with a collection in flight, are kept so
    /// the collected list always matches the collected cards.
    pub fn remove_card(&mut self, card_id: &CardId) -> Option<Card> {
        let collected = self.cards.get(card_id)?.is_collected();
        if collected || self.collecting.contains(card_id) {
            log::debug!("Card {} is collected or being collected, not removed", card_id);
            return None;
        }
        let card = self.cards.remove(card_id)?;
        self.positions.remove(card_id);
        if self.focused == Some(*card_id) {
            self.focused = None;
        }
        log::debug!("Removed card {}", card_id);
        Some(card)
    }

    pub fn snapshot(&self) -> CanvasSnapshot {
        let fallback = Body::at(self.positions.bounds().center());
        let cards = self
            .cards
            .iter()
            .map(|card| {
                let body = self.positions.get(&card.id()).copied().unwrap_or(fallback);
                CardView {
                    card: card.clone(),
                    position: body.pos,
                    scale: body.scale,
                    moving: self.positions.motion(&card.id()) == Some(Motion::Coasting),
                }
            })
            .collect();
        CanvasSnapshot {
            session: self.session.clone(),
            phase: self.phases.phase(),
            cards,
            focused: self.focused,
            collected: self.ledger.collected_len(),
            processing: self.is_processing(),
            suggestions: self.suggestions(),
        }
    }
}
