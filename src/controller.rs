//! The breathing session controller.
//!
//! A controller owns at most one [`SessionState`]. It is driven by a single
//! external tick source calling [`SessionController::tick`]; user intents
//! arrive as `start`/`toggle_pause`/`reset`/`complete`/`cancel`. Nothing in
//! here schedules timers of its own, so dropping the controller (or
//! cancelling the session) is all the teardown there is.

use chrono::{DateTime, Local};

use crate::clock::{ClockTick, PhaseClock, TICK_RATE_MS};
use crate::error::SessionError;
use crate::exercise::{ExerciseCatalog, ExerciseDefinition, Phase};
use crate::sequencer::{PhaseSequencer, Transition};

pub const DEFAULT_COMPLETION_CYCLES: u32 = 3;
pub const DEFAULT_REWARD_XP: u32 = 10;

/// Which presentation wrapper produced a reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum RewardSource {
    #[strum(serialize = "popup")]
    Popup,
    #[strum(serialize = "micro")]
    MicroSession,
}

impl RewardSource {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "popup" => Some(RewardSource::Popup),
            "micro" => Some(RewardSource::MicroSession),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reward {
    pub source: RewardSource,
    pub session_id: String,
    pub xp: u32,
    pub cycles: u32,
    pub completed_at: DateTime<Local>,
}

/// Receives completion rewards
pub trait RewardSink {
    fn reward(&mut self, reward: &Reward);
}

impl RewardSink for Vec<Reward> {
    fn reward(&mut self, reward: &Reward) {
        self.push(reward.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    pub completion_cycles: u32,
    pub reward_xp: u32,
    pub tick_ms: u64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            completion_cycles: DEFAULT_COMPLETION_CYCLES,
            reward_xp: DEFAULT_REWARD_XP,
            tick_ms: TICK_RATE_MS,
        }
    }
}

/// Mutable record of an in-progress exercise
#[derive(Debug, Clone)]
pub struct SessionState {
    exercise: ExerciseDefinition,
    sequencer: PhaseSequencer,
    clock: PhaseClock,
    is_running: bool,
}

impl SessionState {
    fn new(exercise: ExerciseDefinition, tick_ms: u64) -> Self {
        let mut state = Self {
            exercise,
            sequencer: PhaseSequencer::new(),
            clock: PhaseClock::new(tick_ms),
            is_running: true,
        };
        state.sequencer.settle(&state.exercise.phase_durations);
        state
    }

    pub fn phase(&self) -> Phase {
        self.sequencer.phase()
    }

    pub fn progress(&self) -> f64 {
        self.clock
            .progress(self.exercise.phase_durations.millis(self.phase()))
    }

    pub fn cycle_count(&self) -> u32 {
        self.sequencer.cycle_count()
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    fn tick(&mut self) -> Option<Transition> {
        if !self.is_running {
            return None;
        }
        let durations = self.exercise.phase_durations;
        match self.clock.tick(durations.millis(self.phase())) {
            ClockTick::Running => None,
            ClockTick::PhaseComplete => Some(self.sequencer.advance(&durations)),
        }
    }

    fn rewind(&mut self) {
        self.sequencer.reset();
        self.clock.reset();
        self.is_running = false;
        self.sequencer.settle(&self.exercise.phase_durations);
    }
}

/// What the presentation layer renders
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub exercise_id: &'static str,
    pub exercise_name: &'static str,
    pub description: &'static str,
    pub phase: Phase,
    pub progress: f64,
    pub cycle_count: u32,
    pub is_running: bool,
    pub completion_cycles: u32,
    pub reward_xp: u32,
}

impl SessionSnapshot {
    pub fn can_complete(&self) -> bool {
        self.cycle_count >= self.completion_cycles
    }
}

#[derive(Debug, Clone)]
pub struct SessionController {
    catalog: ExerciseCatalog,
    settings: ControllerSettings,
    source: RewardSource,
    state: Option<SessionState>,
}

impl SessionController {
    pub fn new(catalog: ExerciseCatalog, settings: ControllerSettings, source: RewardSource) -> Self {
        Self {
            catalog,
            settings,
            source,
            state: None,
        }
    }

    pub fn catalog(&self) -> &ExerciseCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    /// Begin `exercise_id` from inhale, replacing any session in progress.
    pub fn start(&mut self, exercise_id: &str) -> Result<(), SessionError> {
        let Some(exercise) = self.catalog.get(exercise_id).cloned() else {
            tracing::warn!(exercise = exercise_id, "rejected start of unknown exercise");
            return Err(SessionError::UnknownExercise(exercise_id.to_string()));
        };
        tracing::info!(exercise = exercise.id, source = %self.source, "breathing session started");
        self.state = Some(SessionState::new(exercise, self.settings.tick_ms));
        Ok(())
    }

    /// Flip running/paused. Returns the new running flag, or `None` when
    /// there is no session.
    pub fn toggle_pause(&mut self) -> Option<bool> {
        let state = self.state.as_mut()?;
        state.is_running = !state.is_running;
        tracing::debug!(running = state.is_running, "breathing session toggled");
        Some(state.is_running)
    }

    pub fn set_running(&mut self, running: bool) {
        if let Some(state) = self.state.as_mut() {
            state.is_running = running;
        }
    }

    /// Back to inhale with nothing elapsed, stopped. Keeps the exercise.
    pub fn reset(&mut self) {
        if let Some(state) = self.state.as_mut() {
            state.rewind();
            tracing::debug!(exercise = state.exercise.id, "breathing session reset");
        }
    }

    /// Advance the active session by one tick.
    pub fn tick(&mut self) -> Option<Transition> {
        let transition = self.state.as_mut()?.tick()?;
        tracing::trace!(from = %transition.from, to = %transition.to, "phase transition");
        if transition.cycles_completed > 0 {
            let cycles = self.state.as_ref().map_or(0, SessionState::cycle_count);
            tracing::debug!(cycles, "cycle completed");
        }
        Some(transition)
    }

    /// Finish the session once enough cycles are done, handing one reward
    /// to `sink`. Earlier calls are rejected and change nothing.
    pub fn complete(&mut self, sink: &mut dyn RewardSink) -> Result<Reward, SessionError> {
        let state = self.state.as_ref().ok_or(SessionError::NoActiveSession)?;
        let cycles = state.cycle_count();
        let required = self.settings.completion_cycles;
        if cycles < required {
            return Err(SessionError::NotReady { cycles, required });
        }

        let reward = Reward {
            source: self.source,
            session_id: state.exercise.id.to_string(),
            xp: self.settings.reward_xp,
            cycles,
            completed_at: Local::now(),
        };
        self.state = None;
        tracing::info!(session = %reward.session_id, xp = reward.xp, cycles, "breathing session completed");
        sink.reward(&reward);
        Ok(reward)
    }

    /// Close without a reward. Returns whether a session was active.
    pub fn cancel(&mut self) -> bool {
        let cancelled = self.state.take().is_some();
        if cancelled {
            tracing::debug!("breathing session cancelled");
        }
        cancelled
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.state.as_ref().map(|s| SessionSnapshot {
            exercise_id: s.exercise.id,
            exercise_name: s.exercise.name,
            description: s.exercise.description,
            phase: s.phase(),
            progress: s.progress(),
            cycle_count: s.cycle_count(),
            is_running: s.is_running,
            completion_cycles: self.settings.completion_cycles,
            reward_xp: self.settings.reward_xp,
        })
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(
            ExerciseCatalog::builtin(),
            ControllerSettings::default(),
            RewardSource::Popup,
        )
    }
}
