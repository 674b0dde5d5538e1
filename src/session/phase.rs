//! Session phase state machine
//!
//! Phases only move forward. The core drives the first two transitions on its
//! own; `build` needs an explicit request once enough cards are collected and
//! `ship` is recorded on behalf of an external caller.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::BUILD_MIN_COLLECTED;
use crate::error::{CanvasError, Result};

/// Session-wide stage
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No options generated yet
    #[default]
    Discovery,
    /// Options on the canvas, none refined
    Exploration,
    /// At least one option refined
    Refinement,
    Build,
    Ship,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Discovery => "discovery",
            Phase::Exploration => "exploration",
            Phase::Refinement => "refinement",
            Phase::Build => "build",
            Phase::Ship => "ship",
        }
    }

    /// The phase after this one, if any
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Discovery => Some(Phase::Exploration),
            Phase::Exploration => Some(Phase::Refinement),
            Phase::Refinement => Some(Phase::Build),
            Phase::Build => Some(Phase::Ship),
            Phase::Ship => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Things that can move the session forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// A generation batch landed on the canvas
    GenerationCompleted,
    /// A card received a refinement reply
    RefinementReceived,
    /// Caller asked to start building with this many collected cards
    BuildRequested { collected: usize },
    /// Caller reports the build shipped
    Shipped,
}

/// A phase change that happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
}

#[derive(Debug, Clone, Default)]
pub struct PhaseMachine {
    phase: Phase,
    history: Vec<PhaseTransition>,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Every transition so far, oldest first
    pub fn history(&self) -> &[PhaseTransition] {
        &self.history
    }

    /// Whether enough cards are collected to start building
    pub fn can_start_build(&self, collected: usize) -> bool {
        self.phase == Phase::Refinement && collected >= BUILD_MIN_COLLECTED
    }

    /// Feed an event.
    ///
    /// Core events (`GenerationCompleted`, `RefinementReceived`) never fail:
    /// they advance the phase when it applies and are ignored otherwise.
    /// Explicit requests fail when their precondition does not hold.
    pub fn apply(&mut self, event: PhaseEvent) -> Result<Option<PhaseTransition>> {
        let target = match (event, self.phase) {
            (PhaseEvent::GenerationCompleted, Phase::Discovery) => Phase::Exploration,
            (PhaseEvent::RefinementReceived, Phase::Exploration) => Phase::Refinement,
            (PhaseEvent::GenerationCompleted | PhaseEvent::RefinementReceived, _) => {
                return Ok(None);
            }
            (PhaseEvent::BuildRequested { collected }, Phase::Refinement) => {
                if collected < BUILD_MIN_COLLECTED {
                    return Err(CanvasError::NotReady {
                        needed: BUILD_MIN_COLLECTED,
                        collected,
                    });
                }
                Phase::Build
            }
            (PhaseEvent::BuildRequested { .. }, from) => {
                return Err(CanvasError::InvalidTransition {
                    from,
                    to: Phase::Build,
                });
            }
            (PhaseEvent::Shipped, Phase::Build) => Phase::Ship,
            (PhaseEvent::Shipped, from) => {
                return Err(CanvasError::InvalidTransition {
                    from,
                    to: Phase::Ship,
                });
            }
        };

        let transition = PhaseTransition {
            from: self.phase,
            to: target,
        };
        self.phase = target;
        self.history.push(transition);
        log::info!("Phase {} -> {}", transition.from, transition.to);
        Ok(Some(transition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_events_drive_first_two_phases() {
        let mut machine = PhaseMachine::new();
        assert_eq!(machine.phase(), Phase::Discovery);

        // Refinement before any generation does nothing
        assert_eq!(machine.apply(PhaseEvent::RefinementReceived).unwrap(), None);

        let t = machine.apply(PhaseEvent::GenerationCompleted).unwrap();
        assert_eq!(
            t,
            Some(PhaseTransition {
                from: Phase::Discovery,
                to: Phase::Exploration
            })
        );
        // Second generation stays put
        assert_eq!(machine.apply(PhaseEvent::GenerationCompleted).unwrap(), None);

        machine.apply(PhaseEvent::RefinementReceived).unwrap();
        assert_eq!(machine.phase(), Phase::Refinement);
        assert_eq!(machine.history().len(), 2);
    }

    #[test]
    fn test_build_requires_collected_cards() {
        let mut machine = PhaseMachine::new();
        machine.apply(PhaseEvent::GenerationCompleted).unwrap();
        machine.apply(PhaseEvent::RefinementReceived).unwrap();

        assert!(!machine.can_start_build(1));
        let err = machine
            .apply(PhaseEvent::BuildRequested { collected: 1 })
            .unwrap_err();
        assert!(matches!(err, CanvasError::NotReady { collected: 1, .. }));
        assert_eq!(machine.phase(), Phase::Refinement);

        assert!(machine.can_start_build(2));
        machine
            .apply(PhaseEvent::BuildRequested { collected: 2 })
            .unwrap();
        assert_eq!(machine.phase(), Phase::Build);

        machine.apply(PhaseEvent::Shipped).unwrap();
        assert_eq!(machine.phase(), Phase::Ship);
    }

    #[test]
    fn test_build_from_exploration_is_rejected() {
        let mut machine = PhaseMachine::new();
        machine.apply(PhaseEvent::GenerationCompleted).unwrap();
        let err = machine
            .apply(PhaseEvent::BuildRequested { collected: 5 })
            .unwrap_err();
        assert!(matches!(
            err,
            CanvasError::InvalidTransition {
                from: Phase::Exploration,
                to: Phase::Build
            }
        ));
        assert!(machine.apply(PhaseEvent::Shipped).is_err());
    }

    #[test]
    fn test_never_moves_backward() {
        let events = [
            PhaseEvent::RefinementReceived,
            PhaseEvent::GenerationCompleted,
            PhaseEvent::BuildRequested { collected: 3 },
            PhaseEvent::RefinementReceived,
            PhaseEvent::GenerationCompleted,
            PhaseEvent::BuildRequested { collected: 3 },
            PhaseEvent::Shipped,
            PhaseEvent::GenerationCompleted,
            PhaseEvent::Shipped,
        ];
        let mut machine = PhaseMachine::new();
        let mut last = machine.phase();
        for event in events {
            let _ = machine.apply(event);
            assert!(machine.phase() >= last);
            last = machine.phase();
        }
        assert_eq!(last, Phase::Ship);
        assert!(machine.history().iter().all(|t| t.from.next() == Some(t.to)));
    }
}
