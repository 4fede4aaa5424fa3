use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use pulsehabit::{
    app::{App, AppAction, Screen},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    exercise::ExerciseCatalog,
    history::HistoryDb,
    micro_session::{find_micro_session, MICRO_SESSIONS},
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner, TickPacer, Ticker},
    util::format_time,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, File},
    io::{self, stdin, Write},
    path::PathBuf,
    sync::Mutex,
    time::Instant,
};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// paced breathing and micro sessions in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Guided breathing (4-7-8 and box) and short timed micro sessions in the terminal. Finished sessions earn XP that is kept in a local history."
)]
pub struct Cli {
    /// breathing exercise to start right away (478 or box)
    #[clap(short = 'e', long, conflicts_with = "session")]
    exercise: Option<String>,

    /// micro session to start right away (see --list)
    #[clap(short = 's', long)]
    session: Option<String>,

    /// cycles needed before a breathing session can be completed
    #[clap(long, value_parser = clap::value_parser!(u32).range(1..))]
    cycles: Option<u32>,

    /// XP awarded per completed session
    #[clap(long)]
    xp: Option<u32>,

    /// list exercises and micro sessions, then exit
    #[clap(long)]
    list: bool,

    /// print XP level and recent sessions, then exit
    #[clap(long)]
    history: bool,

    /// write session history as CSV to PATH, then exit
    #[clap(long, value_name = "PATH")]
    export_history: Option<PathBuf>,

    /// delete every recorded session, then exit
    #[clap(long)]
    clear_history: bool,

    /// persist --exercise, --cycles and --xp as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Modes that print and exit without a terminal UI
    fn is_non_interactive(&self) -> bool {
        self.list || self.history || self.clear_history || self.export_history.is_some()
    }

    /// Overlay command line flags on top of the stored config
    fn apply(&self, config: &mut Config) {
        if let Some(exercise) = &self.exercise {
            config.default_exercise = Some(exercise.clone());
        }
        if let Some(cycles) = self.cycles {
            config.completion_cycles = cycles;
        }
        if let Some(xp) = self.xp {
            config.reward_xp = xp;
        }
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(exercise) = &self.exercise {
            if ExerciseCatalog::builtin().get(exercise).is_none() {
                return Err(format!("unknown exercise `{exercise}` (expected 478 or box)"));
            }
        }
        if let Some(session) = &self.session {
            if find_micro_session(session).is_none() {
                return Err(format!("unknown micro session `{session}` (see --list)"));
            }
        }
        Ok(())
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = File::options().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Err(msg) = cli.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::InvalidValue, msg).exit();
    }

    init_logging();

    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply(&mut config);
    if cli.save_config {
        store.save(&config)?;
        println!("saved config to {}", store.path().display());
    }

    if cli.is_non_interactive() {
        let mut out = io::stdout().lock();
        if cli.list {
            print_catalog(&mut out)?;
        }
        if cli.history || cli.clear_history || cli.export_history.is_some() {
            let db = HistoryDb::open_default()?;
            if cli.clear_history {
                let removed = db.count()?;
                db.clear()?;
                tracing::info!(removed, "session history cleared");
                writeln!(out, "cleared {removed} sessions")?;
            }
            if cli.history {
                print_history(&db, &mut out)?;
            }
            if let Some(path) = &cli.export_history {
                let rows = db.export_csv(File::create(path)?)?;
                writeln!(out, "exported {rows} sessions to {}", path.display())?;
            }
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let history = match HistoryDb::open_default() {
        Ok(db) => Some(db),
        Err(e) => {
            tracing::warn!(error = %e, "history unavailable, rewards will not be saved");
            None
        }
    };

    let mut app = App::new(&config, history);
    if let Some(session) = &cli.session {
        app.open(Screen::Micro);
        app.start_micro(session);
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if app.ledger.earned_xp > 0 {
        println!("+{} XP earned. See you next time.", app.ledger.earned_xp);
    }

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let ticker = FixedTicker::default();
    let runner = Runner::new(CrosstermEventSource::new(), ticker);
    let mut pacer = TickPacer::new(ticker.interval(), Instant::now());

    loop {
        let size = terminal.size()?;
        app.size = (size.width, size.height);
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let event = runner.step();

        // Key presses wake the runner early; wall clock decides how many ticks are owed
        for _ in 0..pacer.due(Instant::now()) {
            app.on_tick();
        }

        match event {
            AppEvent::Key(key) => {
                if app.on_key(key) == AppAction::Quit {
                    break;
                }
            }
            AppEvent::Resize | AppEvent::Tick => {}
        }
    }

    tracing::info!(earned_xp = app.ledger.earned_xp, "exiting");
    Ok(())
}

fn print_catalog(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Breathing exercises:")?;
    for exercise in ExerciseCatalog::builtin().iter() {
        writeln!(
            out,
            "  {:<6} {} ({}s cycle)",
            exercise.id,
            exercise.name,
            exercise.phase_durations.cycle_secs()
        )?;
    }
    writeln!(out)?;
    writeln!(out, "Micro sessions:")?;
    for session in MICRO_SESSIONS.iter() {
        writeln!(
            out,
            "  {:<20} {} ({})",
            session.id,
            session.title,
            format_time(session.duration_secs)
        )?;
    }
    Ok(())
}

fn print_history(db: &HistoryDb, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    let level = db.level()?;
    writeln!(
        out,
        "Level {} · {} XP ({} to next level)",
        level.level,
        level.total_xp,
        level.next_level_xp - level.total_xp
    )?;
    writeln!(out, "{} sessions completed", db.count()?)?;
    for s in db.recent(10)? {
        writeln!(
            out,
            "  {}  {:<6} {:<20} {} cycles  +{} XP",
            s.completed_at.format("%Y-%m-%d %H:%M"),
            s.source.to_string(),
            s.session_id,
            s.cycles,
            s.xp
        )?;
    }
    Ok(())
}
