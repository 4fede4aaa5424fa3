use crate::exercise::{Phase, PhaseDurations};

/// Result of moving the sequencer out of a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
    /// Number of times inhale was entered during this step
    pub cycles_completed: u32,
}

/// Owns phase ordering and the cycle counter.
#[derive(Debug, Clone)]
pub struct PhaseSequencer {
    phase: Phase,
    cycle_count: u32,
}

impl PhaseSequencer {
    pub fn new() -> Self {
        Self {
            phase: Phase::Inhale,
            cycle_count: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cycle_count(&self) -> u32 {
        self.cycle_count
    }

    pub fn reset(&mut self) {
        self.phase = Phase::Inhale;
        self.cycle_count = 0;
    }

    fn step(&mut self) -> u32 {
        self.phase = self.phase.next();
        if self.phase == Phase::Inhale {
            self.cycle_count += 1;
            1
        } else {
            0
        }
    }

    /// Leave zero-duration phases until one that runs is reached.
    ///
    /// Bounded by one lap so an all-zero pattern leaves the phase unchanged
    /// rather than spinning.
    fn skip_empty(&mut self, durations: &PhaseDurations) -> u32 {
        let mut cycles = 0;
        for _ in 0..Phase::ALL.len() {
            if durations.secs(self.phase) != 0 {
                break;
            }
            cycles += self.step();
        }
        cycles
    }

    /// Move to the next phase that has a duration, counting each entry into
    /// inhale along the way.
    pub fn advance(&mut self, durations: &PhaseDurations) -> Transition {
        let from = self.phase;
        let mut cycles_completed = self.step();
        cycles_completed += self.skip_empty(durations);
        Transition {
            from,
            to: self.phase,
            cycles_completed,
        }
    }

    /// Skip the current phase if it has no duration. Used on session start
    /// where the first phase is entered without a clock completion.
    pub fn settle(&mut self, durations: &PhaseDurations) -> Option<Transition> {
        if durations.secs(self.phase) != 0 {
            return None;
        }
        let from = self.phase;
        let cycles_completed = self.skip_empty(durations);
        Some(Transition {
            from,
            to: self.phase,
            cycles_completed,
        })
    }
}

impl Default for PhaseSequencer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOX: PhaseDurations = PhaseDurations::new(4, 4, 4, 4);
    const FOUR_SEVEN_EIGHT: PhaseDurations = PhaseDurations::new(4, 7, 8, 0);

    #[test]
    fn box_cycle_counts_on_return_to_inhale() {
        let mut seq = PhaseSequencer::new();
        assert_eq!(seq.advance(&BOX).to, Phase::Hold);
        assert_eq!(seq.advance(&BOX).to, Phase::Exhale);
        assert_eq!(seq.advance(&BOX).to, Phase::Pause);
        assert_eq!(seq.cycle_count(), 0);

        let t = seq.advance(&BOX);
        assert_eq!(t.from, Phase::Pause);
        assert_eq!(t.to, Phase::Inhale);
        assert_eq!(t.cycles_completed, 1);
        assert_eq!(seq.cycle_count(), 1);
    }

    #[test]
    fn four_seven_eight_skips_pause() {
        let mut seq = PhaseSequencer::new();
        seq.advance(&FOUR_SEVEN_EIGHT);
        seq.advance(&FOUR_SEVEN_EIGHT);
        assert_eq!(seq.phase(), Phase::Exhale);

        let t = seq.advance(&FOUR_SEVEN_EIGHT);
        assert_eq!(t.from, Phase::Exhale);
        assert_eq!(t.to, Phase::Inhale);
        assert_eq!(t.cycles_completed, 1);
    }

    #[test]
    fn chained_skip_over_several_empty_phases() {
        let durations = PhaseDurations::new(3, 0, 0, 0);
        let mut seq = PhaseSequencer::new();
        let t = seq.advance(&durations);
        assert_eq!(t.to, Phase::Inhale);
        assert_eq!(seq.cycle_count(), 1);
    }

    #[test]
    fn settle_skips_empty_inhale_without_counting() {
        let durations = PhaseDurations::new(0, 2, 2, 0);
        let mut seq = PhaseSequencer::new();
        let t = seq.settle(&durations).unwrap();
        assert_eq!(t.to, Phase::Hold);
        assert_eq!(t.cycles_completed, 0);
        assert!(seq.settle(&durations).is_none());
    }

    #[test]
    fn all_zero_pattern_does_not_spin() {
        let durations = PhaseDurations::new(0, 0, 0, 0);
        let mut seq = PhaseSequencer::new();
        seq.advance(&durations);
        assert!(seq.cycle_count() <= 2);
    }

    #[test]
    fn reset_returns_to_inhale() {
        let mut seq = PhaseSequencer::new();
        for _ in 0..6 {
            seq.advance(&BOX);
        }
        seq.reset();
        assert_eq!(seq.phase(), Phase::Inhale);
        assert_eq!(seq.cycle_count(), 0);
    }
}
