//! Timed micro sessions.
//!
//! A micro session is a fixed-length countdown. The breathing ones also run
//! the shared [`SessionController`] so the phase cue follows the exercise's
//! real durations; pausing or resetting the page applies to both.

use chrono::Local;

use crate::controller::{ControllerSettings, Reward, RewardSink, RewardSource, SessionController, SessionSnapshot};
use crate::countdown::{Countdown, CountdownTick};
use crate::error::SessionError;
use crate::exercise::ExerciseCatalog;
use crate::util::format_time;

#[derive(Debug, Clone, PartialEq)]
pub struct MicroSession {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub duration_secs: u32,
    pub instructions: &'static str,
    /// Breathing exercise paced alongside the countdown
    pub exercise: Option<&'static str>,
}

pub static MICRO_SESSIONS: [MicroSession; 5] = [
    MicroSession {
        id: "breathing-4-7-8",
        title: "4-7-8 Breathing",
        description: "Calming breath technique for relaxation",
        duration_secs: 240,
        instructions: "Inhale for 4, hold for 7, exhale for 8",
        exercise: Some("478"),
    },
    MicroSession {
        id: "box-breathing",
        title: "Box Breathing",
        description: "Equal breathing for focus and balance",
        duration_secs: 300,
        instructions: "Inhale 4, hold 4, exhale 4, hold 4",
        exercise: Some("box"),
    },
    MicroSession {
        id: "quick-meditation",
        title: "Quick Meditation",
        description: "Brief mindfulness practice",
        duration_secs: 180,
        instructions: "Focus on your breath and present moment",
        exercise: None,
    },
    MicroSession {
        id: "grounding-5-4-3-2-1",
        title: "5-4-3-2-1 Grounding",
        description: "Grounding technique for anxiety",
        duration_secs: 300,
        instructions: "5 things you see, 4 you touch, 3 you hear, 2 you smell, 1 you taste",
        exercise: None,
    },
    MicroSession {
        id: "energy-reset",
        title: "Energy Reset",
        description: "Quick energy boost and focus",
        duration_secs: 120,
        instructions: "Energizing breathwork and movement",
        exercise: None,
    },
];

pub fn find_micro_session(id: &str) -> Option<&'static MicroSession> {
    MICRO_SESSIONS.iter().find(|s| s.id == id)
}

#[derive(Debug, Clone)]
struct ActiveMicro {
    session: &'static MicroSession,
    countdown: Countdown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MicroSnapshot {
    pub session: &'static MicroSession,
    pub remaining_secs: u32,
    pub is_running: bool,
    pub breathing: Option<SessionSnapshot>,
}

impl MicroSnapshot {
    pub fn time_left(&self) -> String {
        format_time(self.remaining_secs)
    }
}

/// Page-level wrapper: one active micro session at a time
#[derive(Debug, Clone)]
pub struct MicroSessionPage {
    breathing: SessionController,
    active: Option<ActiveMicro>,
}

impl MicroSessionPage {
    pub fn new(catalog: ExerciseCatalog, settings: ControllerSettings) -> Self {
        Self {
            breathing: SessionController::new(catalog, settings, RewardSource::MicroSession),
            active: None,
        }
    }

    pub fn sessions(&self) -> &'static [MicroSession] {
        &MICRO_SESSIONS
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Start (or switch to) `session_id`, running immediately.
    pub fn start(&mut self, session_id: &str) -> Result<&'static MicroSession, SessionError> {
        let session = find_micro_session(session_id)
            .ok_or_else(|| SessionError::UnknownSession(session_id.to_string()))?;

        match session.exercise {
            Some(exercise_id) => self.breathing.start(exercise_id)?,
            None => {
                self.breathing.cancel();
            }
        }

        let mut countdown = Countdown::new(session.duration_secs, self.breathing.settings().tick_ms);
        countdown.start();
        self.active = Some(ActiveMicro { session, countdown });
        tracing::info!(session = session.id, secs = session.duration_secs, "micro session started");
        Ok(session)
    }

    pub fn toggle_pause(&mut self) -> Option<bool> {
        let active = self.active.as_mut()?;
        let running = active.countdown.toggle();
        self.breathing.set_running(running);
        Some(running)
    }

    /// Full duration again, stopped, breathing back at inhale.
    pub fn reset(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.countdown.reset();
            self.breathing.reset();
            tracing::debug!(session = active.session.id, "micro session reset");
        }
    }

    pub fn cancel(&mut self) -> bool {
        self.breathing.cancel();
        self.active.take().is_some()
    }

    /// Advance breathing and countdown together. When the countdown runs
    /// out the session ends and one reward goes to `sink`.
    pub fn tick(&mut self, sink: &mut dyn RewardSink) -> Option<Reward> {
        let active = self.active.as_mut()?;
        if !active.countdown.is_running() {
            return None;
        }

        self.breathing.tick();
        if active.countdown.tick() != CountdownTick::Expired {
            return None;
        }

        let cycles = self
            .breathing
            .snapshot()
            .map_or(0, |s| s.cycle_count);
        let reward = Reward {
            source: RewardSource::MicroSession,
            session_id: active.session.id.to_string(),
            xp: self.breathing.settings().reward_xp,
            cycles,
            completed_at: Local::now(),
        };
        self.active = None;
        self.breathing.cancel();
        tracing::info!(session = %reward.session_id, xp = reward.xp, "micro session completed");
        sink.reward(&reward);
        Some(reward)
    }

    pub fn snapshot(&self) -> Option<MicroSnapshot> {
        self.active.as_ref().map(|a| MicroSnapshot {
            session: a.session,
            remaining_secs: a.countdown.remaining_secs(),
            is_running: a.countdown.is_running(),
            breathing: self.breathing.snapshot(),
        })
    }
}

impl Default for MicroSessionPage {
    fn default() -> Self {
        Self::new(ExerciseCatalog::builtin(), ControllerSettings::default())
    }
}
