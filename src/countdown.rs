use crate::clock::TICK_RATE_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    Idle,
    Running,
    Expired,
}

/// Whole-second countdown fed by the same ticks as the phase clock.
/// Sub-second remainders carry over between ticks, including across pauses.
#[derive(Debug, Clone)]
pub struct Countdown {
    total_secs: u32,
    remaining_secs: u32,
    carry_ms: u64,
    tick_ms: u64,
    running: bool,
}

impl Countdown {
    pub fn new(total_secs: u32, tick_ms: u64) -> Self {
        Self {
            total_secs,
            remaining_secs: total_secs,
            carry_ms: 0,
            tick_ms: tick_ms.max(1),
            running: false,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn toggle(&mut self) -> bool {
        self.running = !self.running;
        self.running
    }

    pub fn reset(&mut self) {
        self.remaining_secs = self.total_secs;
        self.carry_ms = 0;
        self.running = false;
    }

    pub fn tick(&mut self) -> CountdownTick {
        if !self.running || self.remaining_secs == 0 {
            return CountdownTick::Idle;
        }

        self.carry_ms += self.tick_ms;
        while self.carry_ms >= 1000 && self.remaining_secs > 0 {
            self.carry_ms -= 1000;
            self.remaining_secs -= 1;
        }

        if self.remaining_secs == 0 {
            self.running = false;
            self.carry_ms = 0;
            CountdownTick::Expired
        } else {
            CountdownTick::Running
        }
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(0, TICK_RATE_MS)
    }
}
