//! Encounter state machine: Active -> Alerted -> Active | Terminal
//!
//! Lives and vulnerability are only changed here. The caller feeds in the
//! tick's detection and strike signals and applies the returned outcome.

use serde::{Deserialize, Serialize};

use crate::tuning::EncounterTuning;

/// Encounter phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EncounterPhase {
    /// Normal play
    #[default]
    Active,
    /// Just caught or struck; round reset pending
    Alerted { ticks_left: u32 },
    /// Out of lives; session restart pending
    Terminal { ticks_left: u32 },
}

impl EncounterPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, EncounterPhase::Active)
    }
}

/// Lives and post-hit invulnerability of the controlled actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitality {
    pub lives: u8,
    pub vulnerable: bool,
    /// Ticks until vulnerable again
    pub invuln_ticks: u32,
    /// Invulnerability granted per hit
    pub max_invuln_ticks: u32,
}

impl Vitality {
    pub fn new(lives: u8, max_invuln_ticks: u32) -> Self {
        Self {
            lives,
            vulnerable: true,
            invuln_ticks: 0,
            max_invuln_ticks,
        }
    }

    /// True if a hit right now would cost a life
    pub fn can_be_hit(&self) -> bool {
        self.vulnerable && self.lives > 0
    }

    fn take_hit(&mut self) {
        self.lives -= 1;
        self.vulnerable = false;
        self.invuln_ticks = self.max_invuln_ticks;
    }

    fn restore(&mut self) {
        self.vulnerable = true;
        self.invuln_ticks = 0;
    }

    fn tick_invuln(&mut self) {
        if !self.vulnerable {
            self.invuln_ticks = self.invuln_ticks.saturating_sub(1);
            if self.invuln_ticks == 0 {
                self.vulnerable = true;
            }
        }
    }
}

/// What caused a life to be lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitKind {
    /// Seen by a guard
    Detected,
    /// Physically touched by a guard
    Struck,
}

/// Result of one encounter update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncounterOutcome {
    pub phase: EncounterPhase,
    pub vitality: Vitality,
    /// Set on the tick a life was lost
    pub hit: Option<HitKind>,
    /// Alerted just ended with lives left: put the actor back at spawn
    pub reset_requested: bool,
    /// Terminal just ended: the whole session should restart
    pub restart_requested: bool,
}

impl EncounterOutcome {
    pub fn lives(&self) -> u8 {
        self.vitality.lives
    }
}

/// Advance the encounter by one tick.
///
/// The invulnerability countdown runs first in every phase. Signals are only
/// consumed while Active; detection takes precedence over a strike when both
/// arrive in the same tick.
pub fn update_encounter(
    phase: EncounterPhase,
    vitality: Vitality,
    detected: bool,
    struck: bool,
    timing: &EncounterTuning,
) -> EncounterOutcome {
    let mut vitality = vitality;
    let mut hit = None;
    let mut reset_requested = false;
    let mut restart_requested = false;

    vitality.tick_invuln();

    let phase = match phase {
        EncounterPhase::Active => {
            let kind = if detected {
                Some(HitKind::Detected)
            } else if struck {
                Some(HitKind::Struck)
            } else {
                None
            };
            match kind {
                Some(kind) if vitality.can_be_hit() => {
                    vitality.take_hit();
                    hit = Some(kind);
                    log::info!("Player {kind:?}, lives left: {}", vitality.lives);
                    EncounterPhase::Alerted {
                        ticks_left: timing.alerted_ticks,
                    }
                }
                _ => EncounterPhase::Active,
            }
        }
        EncounterPhase::Alerted { ticks_left } => {
            let ticks_left = ticks_left.saturating_sub(1);
            if ticks_left > 0 {
                EncounterPhase::Alerted { ticks_left }
            } else if vitality.lives == 0 {
                log::info!("Out of lives");
                EncounterPhase::Terminal {
                    ticks_left: timing.terminal_ticks,
                }
            } else {
                vitality.restore();
                reset_requested = true;
                EncounterPhase::Active
            }
        }
        EncounterPhase::Terminal { ticks_left } => {
            let ticks_left = ticks_left.saturating_sub(1);
            if ticks_left == 0 {
                restart_requested = true;
            }
            EncounterPhase::Terminal { ticks_left }
        }
    };

    EncounterOutcome {
        phase,
        vitality,
        hit,
        reset_requested,
        restart_requested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing() -> EncounterTuning {
        EncounterTuning {
            alerted_ticks: 3,
            terminal_ticks: 2,
        }
    }

    #[test]
    fn test_last_life_goes_alerted_then_terminal() {
        let v = Vitality::new(1, 120);
        let out = update_encounter(EncounterPhase::Active, v, true, false, &timing());
        assert_eq!(out.phase, EncounterPhase::Alerted { ticks_left: 3 });
        assert_eq!(out.lives(), 0);
        assert_eq!(out.hit, Some(HitKind::Detected));

        let mut phase = out.phase;
        let mut v = out.vitality;
        for _ in 0..3 {
            let out = update_encounter(phase, v, false, false, &timing());
            assert!(!out.reset_requested);
            phase = out.phase;
            v = out.vitality;
        }
        assert_eq!(phase, EncounterPhase::Terminal { ticks_left: 2 });

        let out = update_encounter(phase, v, false, false, &timing());
        assert!(!out.restart_requested);
        let out = update_encounter(out.phase, out.vitality, false, false, &timing());
        assert!(out.restart_requested);
        assert!(matches!(out.phase, EncounterPhase::Terminal { .. }));
    }

    #[test]
    fn test_alerted_with_lives_left_resets_round() {
        let v = Vitality::new(3, 120);
        let out = update_encounter(EncounterPhase::Active, v, false, true, &timing());
        assert_eq!(out.hit, Some(HitKind::Struck));
        assert_eq!(out.lives(), 2);
        assert!(!out.vitality.vulnerable);

        let mut out = out;
        for _ in 0..3 {
            out = update_encounter(out.phase, out.vitality, false, false, &timing());
        }
        assert_eq!(out.phase, EncounterPhase::Active);
        assert!(out.reset_requested);
        assert!(out.vitality.vulnerable);
    }

    #[test]
    fn test_signals_ignored_while_alerted() {
        let v = Vitality::new(3, 120);
        let out = update_encounter(EncounterPhase::Active, v, true, false, &timing());
        let out = update_encounter(out.phase, out.vitality, true, true, &timing());
        assert_eq!(out.lives(), 2);
        assert_eq!(out.hit, None);
    }

    #[test]
    fn test_invulnerable_actor_is_not_hit() {
        let mut v = Vitality::new(3, 120);
        v.vulnerable = false;
        v.invuln_ticks = 10;
        let out = update_encounter(EncounterPhase::Active, v, true, true, &timing());
        assert_eq!(out.phase, EncounterPhase::Active);
        assert_eq!(out.lives(), 3);
        assert_eq!(out.vitality.invuln_ticks, 9);
    }

    #[test]
    fn test_invulnerability_expires() {
        let mut v = Vitality::new(3, 120);
        v.vulnerable = false;
        v.invuln_ticks = 1;
        let out = update_encounter(EncounterPhase::Active, v, true, false, &timing());
        // Countdown runs before the hit check
        assert_eq!(out.hit, Some(HitKind::Detected));
        assert_eq!(out.lives(), 2);
    }

    #[test]
    fn test_no_lives_no_hit() {
        let v = Vitality::new(0, 120);
        let out = update_encounter(EncounterPhase::Active, v, true, true, &timing());
        assert_eq!(out.phase, EncounterPhase::Active);
        assert_eq!(out.hit, None);
    }
}
