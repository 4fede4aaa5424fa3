use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "pulsehabit";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/pulsehabit`, falling back to the platform's local data dir
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join(APP_NAME))
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("history.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("pulsehabit.log"))
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|pd| pd.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_share_the_state_dir() {
        if let (Some(state), Some(db), Some(log)) =
            (AppDirs::state_dir(), AppDirs::db_path(), AppDirs::log_path())
        {
            assert_eq!(db.parent(), Some(state.as_path()));
            assert_eq!(log.parent(), Some(state.as_path()));
            assert!(db.ends_with("history.db"));
        }
    }
}
