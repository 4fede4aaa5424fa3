use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::celebration::CompletionBurst;
use crate::config::Config;
use crate::controller::{Reward, RewardSink, RewardSource, SessionController};
use crate::error::{HistoryError, SessionError};
use crate::exercise::ExerciseCatalog;
use crate::history::{CompletedSession, HistoryDb, XpLevel};
use crate::micro_session::{MicroSessionPage, MICRO_SESSIONS};

pub const HOME_ITEMS: [&str; 4] = ["Quick breathe", "Micro sessions", "History", "Quit"];
const HISTORY_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Breathe,
    Micro,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Continue,
    Quit,
}

/// Rewards go to the history db when one is open and are tallied for the
/// current run either way.
#[derive(Debug, Default)]
pub struct Ledger {
    pub history: Option<HistoryDb>,
    pub earned_xp: u32,
    pub last: Option<Reward>,
}

impl Ledger {
    pub fn new(history: Option<HistoryDb>) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }
}

impl RewardSink for Ledger {
    fn reward(&mut self, reward: &Reward) {
        self.earned_xp += reward.xp;
        if let Some(history) = self.history.as_mut() {
            history.reward(reward);
        }
        self.last = Some(reward.clone());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryView {
    pub level: XpLevel,
    pub sessions_completed: u64,
    pub recent: Vec<CompletedSession>,
}

fn load_history(db: &HistoryDb) -> Result<HistoryView, HistoryError> {
    Ok(HistoryView {
        level: db.level()?,
        sessions_completed: db.count()?,
        recent: db.recent(HISTORY_ROWS)?,
    })
}

#[derive(Debug)]
pub struct App {
    pub screen: Screen,
    pub home_index: usize,
    pub exercise_index: usize,
    pub micro_index: usize,
    pub breathe: SessionController,
    pub micro: MicroSessionPage,
    pub ledger: Ledger,
    pub burst: CompletionBurst,
    pub status: Option<String>,
    pub history_view: Option<HistoryView>,
    pub size: (u16, u16),
}

impl App {
    pub fn new(config: &Config, history: Option<HistoryDb>) -> Self {
        let catalog = ExerciseCatalog::builtin();
        let settings = config.controller_settings();
        let mut app = Self {
            screen: Screen::Home,
            home_index: 0,
            exercise_index: 0,
            micro_index: 0,
            breathe: SessionController::new(catalog.clone(), settings, RewardSource::Popup),
            micro: MicroSessionPage::new(catalog, settings),
            ledger: Ledger::new(history),
            burst: CompletionBurst::new(),
            status: None,
            history_view: None,
            size: (80, 24),
        };

        if let Some(exercise) = config.default_exercise.as_deref() {
            app.screen = Screen::Breathe;
            app.start_exercise(exercise);
        }
        app
    }

    pub fn start_exercise(&mut self, exercise_id: &str) {
        match self.breathe.start(exercise_id) {
            Ok(()) => {
                if let Some(i) = self.breathe.catalog().iter().position(|e| e.id == exercise_id) {
                    self.exercise_index = i;
                }
                self.status = self
                    .breathe
                    .snapshot()
                    .map(|s| format!("{} started. {}", s.exercise_name, s.description));
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    /// Start a micro session. Any quick-breathe session is closed first,
    /// since it would sit unticked behind the micro screen.
    pub fn start_micro(&mut self, session_id: &str) {
        match self.micro.start(session_id) {
            Ok(session) => {
                if self.breathe.cancel() {
                    tracing::debug!(session = session.id, "closed quick-breathe session for micro session");
                }
                if let Some(i) = MICRO_SESSIONS.iter().position(|s| s.id == session.id) {
                    self.micro_index = i;
                }
                self.status = Some(format!("{} started. {}", session.title, session.instructions));
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    pub fn open(&mut self, screen: Screen) {
        if screen == Screen::History {
            self.refresh_history();
        }
        self.screen = screen;
    }

    pub fn refresh_history(&mut self) {
        let Some(db) = self.ledger.history.as_ref() else {
            self.history_view = None;
            return;
        };
        match load_history(db) {
            Ok(view) => self.history_view = Some(view),
            Err(e) => {
                tracing::error!(error = %e, "failed to load history");
                self.status = Some(format!("history unavailable: {e}"));
                self.history_view = None;
            }
        }
    }

    fn celebrate(&mut self, reward: &Reward) {
        self.status = Some(format!(
            "Session completed! Great job taking time for yourself. You've earned +{} XP!",
            reward.xp
        ));
        self.burst.start(reward.xp, self.size.0, self.size.1);
    }

    /// Complete the quick-breathe session if enough cycles are done
    pub fn complete_breathe(&mut self) {
        match self.breathe.complete(&mut self.ledger) {
            Ok(reward) => self.celebrate(&reward),
            Err(SessionError::NotReady { cycles, required }) => {
                self.status = Some(format!("Finish {required} cycles first ({cycles}/{required})"));
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    /// Only the wrapper on screen advances
    pub fn on_tick(&mut self) {
        match self.screen {
            Screen::Breathe => {
                self.breathe.tick();
            }
            Screen::Micro => {
                if let Some(reward) = self.micro.tick(&mut self.ledger) {
                    self.celebrate(&reward);
                }
            }
            Screen::Home | Screen::History => {}
        }
        self.burst.update();
    }

    pub fn on_key(&mut self, key: KeyEvent) -> AppAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return AppAction::Quit;
        }

        let idle = match self.screen {
            Screen::Breathe => !self.breathe.is_active(),
            Screen::Micro => !self.micro.is_active(),
            Screen::Home | Screen::History => true,
        };
        if idle && key.code == KeyCode::Char('q') {
            return AppAction::Quit;
        }

        match self.screen {
            Screen::Home => return self.on_home_key(key.code),
            Screen::Breathe => self.on_breathe_key(key.code),
            Screen::Micro => self.on_micro_key(key.code),
            Screen::History => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace) {
                    self.screen = Screen::Home;
                }
            }
        }
        AppAction::Continue
    }

    fn on_home_key(&mut self, code: KeyCode) -> AppAction {
        match code {
            KeyCode::Up | KeyCode::Char('k') => self.home_index = self.home_index.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.home_index = (self.home_index + 1).min(HOME_ITEMS.len() - 1)
            }
            KeyCode::Enter => match self.home_index {
                0 => self.open(Screen::Breathe),
                1 => self.open(Screen::Micro),
                2 => self.open(Screen::History),
                _ => return AppAction::Quit,
            },
            KeyCode::Char('1') => self.open(Screen::Breathe),
            KeyCode::Char('2') => self.open(Screen::Micro),
            KeyCode::Char('3') => self.open(Screen::History),
            KeyCode::Esc => return AppAction::Quit,
            _ => {}
        }
        AppAction::Continue
    }

    fn on_breathe_key(&mut self, code: KeyCode) {
        if !self.breathe.is_active() {
            let count = self.breathe.catalog().len();
            match code {
                KeyCode::Up | KeyCode::Char('k') => {
                    self.exercise_index = self.exercise_index.saturating_sub(1)
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.exercise_index = (self.exercise_index + 1).min(count.saturating_sub(1))
                }
                KeyCode::Enter => {
                    let id = self.breathe.catalog().iter().nth(self.exercise_index).map(|e| e.id);
                    if let Some(id) = id {
                        self.start_exercise(id);
                    }
                }
                KeyCode::Esc | KeyCode::Char('b') => self.screen = Screen::Home,
                _ => {}
            }
            return;
        }

        match code {
            KeyCode::Char(' ') | KeyCode::Char('p') => {
                self.breathe.toggle_pause();
            }
            KeyCode::Char('r') => self.breathe.reset(),
            KeyCode::Char('c') | KeyCode::Enter => self.complete_breathe(),
            KeyCode::Esc => {
                self.breathe.cancel();
                self.status = None;
            }
            _ => {}
        }
    }

    fn on_micro_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up | KeyCode::Char('k') => self.micro_index = self.micro_index.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.micro_index = (self.micro_index + 1).min(MICRO_SESSIONS.len() - 1)
            }
            KeyCode::Enter => self.start_micro(MICRO_SESSIONS[self.micro_index].id),
            KeyCode::Char(' ') | KeyCode::Char('p') => {
                self.micro.toggle_pause();
            }
            KeyCode::Char('r') => self.micro.reset(),
            KeyCode::Esc | KeyCode::Char('b') => {
                if self.micro.is_active() {
                    self.micro.cancel();
                    self.status = None;
                } else {
                    self.screen = Screen::Home;
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::Phase;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        App::new(&Config::default(), None)
    }

    #[test]
    fn home_navigation() {
        let mut app = app();
        assert_eq!(app.screen, Screen::Home);
        app.on_key(key(KeyCode::Down));
        assert_eq!(app.on_key(key(KeyCode::Enter)), AppAction::Continue);
        assert_eq!(app.screen, Screen::Micro);

        app.on_key(key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::Home);

        for _ in 0..10 {
            app.on_key(key(KeyCode::Down));
        }
        assert_eq!(app.home_index, HOME_ITEMS.len() - 1);
        assert_eq!(app.on_key(key(KeyCode::Enter)), AppAction::Quit);
    }

    #[test]
    fn ctrl_c_quits_anywhere() {
        let mut app = app();
        app.open(Screen::Breathe);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(app.on_key(ctrl_c), AppAction::Quit);
    }

    #[test]
    fn default_exercise_opens_breathe_screen() {
        let cfg = Config {
            default_exercise: Some("box".into()),
            ..Config::default()
        };
        let app = App::new(&cfg, None);
        assert_eq!(app.screen, Screen::Breathe);
        assert_eq!(app.breathe.snapshot().unwrap().exercise_id, "box");
        assert_eq!(app.exercise_index, 1);
    }

    #[test]
    fn unknown_default_exercise_reports_status() {
        let cfg = Config {
            default_exercise: Some("lion".into()),
            ..Config::default()
        };
        let app = App::new(&cfg, None);
        assert!(!app.breathe.is_active());
        assert_eq!(app.status.as_deref(), Some("unknown exercise `lion`"));
    }

    #[test]
    fn breathe_flow_through_keys() {
        let mut app = app();
        app.open(Screen::Breathe);
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.breathe.snapshot().unwrap().exercise_id, "478");

        app.on_key(key(KeyCode::Char('c')));
        assert!(app.status.as_deref().unwrap().contains("0/3"));
        assert!(app.breathe.is_active());

        for _ in 0..(190 * 3) {
            app.on_tick();
        }
        app.on_key(key(KeyCode::Char('c')));
        assert!(!app.breathe.is_active());
        assert_eq!(app.ledger.earned_xp, 10);
        assert!(app.burst.is_active());
    }

    #[test]
    fn breathe_pause_and_reset_keys() {
        let mut app = app();
        app.open(Screen::Breathe);
        app.start_exercise("box");
        for _ in 0..50 {
            app.on_tick();
        }
        app.on_key(key(KeyCode::Char(' ')));
        for _ in 0..50 {
            app.on_tick();
        }
        let s = app.breathe.snapshot().unwrap();
        assert_eq!(s.phase, Phase::Hold);
        assert!(!s.is_running);

        app.on_key(key(KeyCode::Char('r')));
        let s = app.breathe.snapshot().unwrap();
        assert_eq!(s.phase, Phase::Inhale);
        assert_eq!(s.progress, 0.0);
    }

    #[test]
    fn q_quits_only_when_idle() {
        let mut app = app();
        app.open(Screen::Breathe);
        app.start_exercise("box");
        assert_eq!(app.on_key(key(KeyCode::Char('q'))), AppAction::Continue);
        app.breathe.cancel();
        assert_eq!(app.on_key(key(KeyCode::Char('q'))), AppAction::Quit);
    }

    #[test]
    fn off_screen_wrappers_do_not_advance() {
        let mut app = app();
        app.open(Screen::Breathe);
        app.start_exercise("box");
        app.screen = Screen::Home;
        for _ in 0..100 {
            app.on_tick();
        }
        assert_eq!(app.breathe.snapshot().unwrap().progress, 0.0);
    }

    #[test]
    fn escape_cancels_before_leaving() {
        let mut app = app();
        app.open(Screen::Breathe);
        app.start_exercise("box");
        app.on_key(key(KeyCode::Esc));
        assert!(!app.breathe.is_active());
        assert_eq!(app.screen, Screen::Breathe);
        app.on_key(key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::Home);
    }

    #[test]
    fn micro_session_replaces_default_breathe_session() {
        let cfg = Config {
            default_exercise: Some("box".into()),
            ..Config::default()
        };
        let mut app = App::new(&cfg, None);
        assert!(app.breathe.is_active());

        app.open(Screen::Micro);
        app.start_micro("energy-reset");
        assert!(!app.breathe.is_active());
        assert!(app.micro.is_active());
    }

    #[test]
    fn unknown_micro_session_keeps_breathe_session() {
        let mut app = app();
        app.open(Screen::Breathe);
        app.start_exercise("box");
        app.start_micro("nap");
        assert!(app.breathe.is_active());
        assert_eq!(app.status.as_deref(), Some("unknown micro session `nap`"));
    }

    #[test]
    fn micro_session_expiry_celebrates() {
        let mut app = app();
        app.open(Screen::Micro);
        for _ in 0..4 {
            app.on_key(key(KeyCode::Down));
        }
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.micro.snapshot().unwrap().session.id, "energy-reset");

        for _ in 0..1200 {
            app.on_tick();
        }
        assert!(!app.micro.is_active());
        assert_eq!(app.ledger.earned_xp, 10);
        assert_eq!(app.ledger.last.as_ref().unwrap().session_id, "energy-reset");
    }

    #[test]
    fn history_screen_reads_db() {
        let db = HistoryDb::in_memory().unwrap();
        let mut app = App::new(&Config::default(), Some(db));
        app.open(Screen::Breathe);
        app.start_exercise("box");
        for _ in 0..480 {
            app.on_tick();
        }
        app.complete_breathe();
        app.open(Screen::History);

        let view = app.history_view.as_ref().unwrap();
        assert_eq!(view.sessions_completed, 1);
        assert_eq!(view.level.total_xp, 10);
        assert_eq!(view.recent[0].session_id, "box");
    }
}
