use crate::error::SessionError;

/// One stage of a breathing cycle, in cycle order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Phase {
    Inhale,
    Hold,
    Exhale,
    #[strum(serialize = "Rest")]
    Pause,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Inhale, Phase::Hold, Phase::Exhale, Phase::Pause];

    pub fn index(self) -> usize {
        match self {
            Phase::Inhale => 0,
            Phase::Hold => 1,
            Phase::Exhale => 2,
            Phase::Pause => 3,
        }
    }

    /// The phase that follows this one, wrapping pause back to inhale
    pub fn next(self) -> Phase {
        Phase::ALL[(self.index() + 1) % Phase::ALL.len()]
    }

    /// Short cue shown while the phase is active
    pub fn instruction(self) -> &'static str {
        match self {
            Phase::Inhale => "Breathe In",
            Phase::Hold => "Hold",
            Phase::Exhale => "Breathe Out",
            Phase::Pause => "Rest",
        }
    }
}

/// Whole-second durations indexed by [`Phase`]. Zero skips the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDurations([u32; 4]);

impl PhaseDurations {
    pub const fn new(inhale: u32, hold: u32, exhale: u32, pause: u32) -> Self {
        Self([inhale, hold, exhale, pause])
    }

    pub fn secs(&self, phase: Phase) -> u32 {
        self.0[phase.index()]
    }

    pub fn millis(&self, phase: Phase) -> u64 {
        u64::from(self.secs(phase)) * 1000
    }

    /// Seconds in one full cycle, counting only the phases that run
    pub fn cycle_secs(&self) -> u32 {
        self.0.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&d| d == 0)
    }
}

impl From<[u32; 4]> for PhaseDurations {
    fn from(v: [u32; 4]) -> Self {
        Self(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub phase_durations: PhaseDurations,
}

const BUILTIN_EXERCISES: [ExerciseDefinition; 2] = [
    ExerciseDefinition {
        id: "478",
        name: "4-7-8 Breathing",
        description: "Inhale for 4, hold for 7, exhale for 8",
        phase_durations: PhaseDurations::new(4, 7, 8, 0),
    },
    ExerciseDefinition {
        id: "box",
        name: "Box Breathing",
        description: "Inhale, hold, exhale, pause - each for 4 counts",
        phase_durations: PhaseDurations::new(4, 4, 4, 4),
    },
];

/// Read-only list of breathing exercises, loaded once
#[derive(Debug, Clone)]
pub struct ExerciseCatalog {
    exercises: Vec<ExerciseDefinition>,
}

impl ExerciseCatalog {
    pub fn builtin() -> Self {
        Self {
            exercises: BUILTIN_EXERCISES.to_vec(),
        }
    }

    /// Build a catalog from custom definitions. Patterns with no running
    /// phase are rejected since they could never complete a cycle.
    pub fn with_exercises(exercises: Vec<ExerciseDefinition>) -> Result<Self, SessionError> {
        if let Some(bad) = exercises.iter().find(|e| e.phase_durations.is_empty()) {
            return Err(SessionError::EmptyPattern(bad.id.to_string()));
        }
        Ok(Self { exercises })
    }

    pub fn get(&self, id: &str) -> Option<&ExerciseDefinition> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExerciseDefinition> {
        self.exercises.iter()
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }
}

impl Default for ExerciseCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
