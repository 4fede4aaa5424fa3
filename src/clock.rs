/// Interval between driver ticks
pub const TICK_RATE_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    Running,
    PhaseComplete,
}

/// Progress through the active phase.
///
/// Elapsed time is kept in whole milliseconds and progress is derived from
/// it, so a phase of `d` seconds completes on exactly the `d * 1000 / tick`
/// tick instead of drifting with repeated float addition.
#[derive(Debug, Clone)]
pub struct PhaseClock {
    elapsed_ms: u64,
    tick_ms: u64,
}

impl PhaseClock {
    pub fn new(tick_ms: u64) -> Self {
        Self {
            elapsed_ms: 0,
            tick_ms: tick_ms.max(1),
        }
    }

    /// Advance by one tick within a phase lasting `duration_ms`.
    ///
    /// On completion the clock is already back at zero when this returns.
    /// A zero duration is reported complete without accumulating anything.
    pub fn tick(&mut self, duration_ms: u64) -> ClockTick {
        if duration_ms == 0 {
            self.elapsed_ms = 0;
            return ClockTick::PhaseComplete;
        }

        self.elapsed_ms = (self.elapsed_ms + self.tick_ms).min(duration_ms);
        if self.elapsed_ms >= duration_ms {
            self.elapsed_ms = 0;
            ClockTick::PhaseComplete
        } else {
            ClockTick::Running
        }
    }

    /// Percentage of `duration_ms` elapsed, in `[0, 100]`
    pub fn progress(&self, duration_ms: u64) -> f64 {
        if duration_ms == 0 {
            return 0.0;
        }
        (self.elapsed_ms as f64 * 100.0 / duration_ms as f64).clamp(0.0, 100.0)
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn reset(&mut self) {
        self.elapsed_ms = 0;
    }
}

impl Default for PhaseClock {
    fn default() -> Self {
        Self::new(TICK_RATE_MS)
    }
}
