//! Session orchestration types
//!
//! Cards and their repository, the phase state machine, pluggable option
//! generation, and the suggestion engine. Nothing here performs I/O.

pub mod card;
pub mod generator;
pub mod phase;
pub mod repository;
pub mod state;
pub mod suggest;

pub use card::{Card, CardId, Dimension, OptionDraft, Refinement, Role, refined_confidence};
pub use generator::{MockGenerator, OptionGenerator};
pub use phase::{Phase, PhaseEvent, PhaseMachine, PhaseTransition};
pub use repository::CardRepository;
pub use state::{Session, session_name};
pub use suggest::{Suggestion, SuggestionKind, suggest};
