use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::controller::{ControllerSettings, DEFAULT_COMPLETION_CYCLES, DEFAULT_REWARD_XP};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Exercise started straight away when the breathe screen opens
    pub default_exercise: Option<String>,
    pub completion_cycles: u32,
    pub reward_xp: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_exercise: None,
            completion_cycles: DEFAULT_COMPLETION_CYCLES,
            reward_xp: DEFAULT_REWARD_XP,
        }
    }
}

impl Config {
    /// A zero cycle threshold would pay out before any breathing happened
    fn sanitized(mut self, path: &Path) -> Self {
        if self.completion_cycles == 0 {
            tracing::warn!(
                path = %path.display(),
                fallback = DEFAULT_COMPLETION_CYCLES,
                "completion_cycles must be at least 1"
            );
            self.completion_cycles = DEFAULT_COMPLETION_CYCLES;
        }
        self
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            completion_cycles: self.completion_cycles.max(1),
            reward_xp: self.reward_xp,
            ..ControllerSettings::default()
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("pulsehabit_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing or unreadable files give the defaults
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => cfg.sanitized(&self.path),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "ignoring malformed config");
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{Reward, RewardSource, SessionController};
    use crate::error::SessionError;
    use crate::exercise::ExerciseCatalog;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("deeper").join("config.json"));
        let cfg = Config {
            default_exercise: Some("box".into()),
            completion_cycles: 5,
            reward_xp: 20,
        };
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "reward_xp": 15 }"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.reward_xp, 15);
        assert_eq!(cfg.completion_cycles, 3);
        assert_eq!(cfg.default_exercise, None);
    }

    #[test]
    fn zero_completion_cycles_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "completion_cycles": 0, "reward_xp": 10 }"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.completion_cycles, DEFAULT_COMPLETION_CYCLES);
        assert_eq!(cfg.reward_xp, 10);
    }

    #[test]
    fn zero_threshold_never_rewards_an_untouched_session() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "completion_cycles": 0 }"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();

        let mut controller = SessionController::new(
            ExerciseCatalog::builtin(),
            cfg.controller_settings(),
            RewardSource::Popup,
        );
        controller.start("box").unwrap();
        let mut rewards: Vec<Reward> = Vec::new();
        assert_matches!(
            controller.complete(&mut rewards),
            Err(SessionError::NotReady { cycles: 0, required: 3 })
        );
        assert!(rewards.is_empty());
    }

    #[test]
    fn settings_never_use_a_zero_threshold() {
        let cfg = Config {
            default_exercise: None,
            completion_cycles: 0,
            reward_xp: 10,
        };
        assert_eq!(cfg.controller_settings().completion_cycles, 1);
    }

    #[test]
    fn controller_settings_follow_config() {
        let cfg = Config {
            default_exercise: None,
            completion_cycles: 4,
            reward_xp: 12,
        };
        let settings = cfg.controller_settings();
        assert_eq!(settings.completion_cycles, 4);
        assert_eq!(settings.reward_xp, 12);
        assert_eq!(settings.tick_ms, crate::clock::TICK_RATE_MS);
    }
}
