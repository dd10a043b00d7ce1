pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, size, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use flinch::{
    app_dirs::AppDirs,
    clock::TICK_RATE_MS,
    config::{Config, ConfigStore, FileConfigStore},
    engine::{Notification, SessionEngine, SystemEngine},
    error::{ExportError, SessionError},
    geometry::Point,
    runtime::{
        CrosstermEventSource, FixedTicker, FlinchEvent, FlinchEventSource, PointerAction,
        PointerEvent, Runner, Ticker,
    },
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

/// reflex training in the terminal: click, double-click, hold, or keep your hands off
#[derive(Parser, Debug, Clone, Default)]
#[clap(version, about)]
pub struct Cli {
    /// seed for a repeatable sequence of challenges
    #[clap(long)]
    seed: Option<u64>,

    /// directory exported result files are written to
    #[clap(short = 'o', long)]
    export_dir: Option<PathBuf>,

    /// target width in terminal cells
    #[clap(long)]
    target_width: Option<u16>,

    /// target height in terminal cells
    #[clap(long)]
    target_height: Option<u16>,

    /// store the given options as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Overlay command line options on the stored config
    fn apply(&self, mut config: Config) -> Config {
        if let Some(dir) = &self.export_dir {
            config.export_dir = Some(dir.clone());
        }
        if let Some(w) = self.target_width {
            config.target_width = w.max(3);
        }
        if let Some(h) = self.target_height {
            config.target_height = h.max(3);
        }
        config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Playing,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub engine: SystemEngine,
    pub config: Config,
    pub state: AppState,
    /// Last known pointer cell, fed to the engine on every tick
    pub pointer: Point,
    pub status: Option<String>,
    pub results_scroll: usize,
}

impl App {
    pub fn new(config: Config, seed: Option<u64>, (width, height): (u16, u16)) -> Self {
        Self {
            engine: SessionEngine::system(config.engine_settings(width, height), seed),
            config,
            state: AppState::Playing,
            pointer: Point::default(),
            status: None,
            results_scroll: 0,
        }
    }

    fn handle_event(&mut self, event: FlinchEvent) -> Flow {
        match event {
            FlinchEvent::Key(key) => return self.on_key(key),
            FlinchEvent::Pointer(pointer) => self.on_pointer(pointer),
            FlinchEvent::Resize(w, h) => self.engine.set_playfield(self.config.playfield(w, h)),
            FlinchEvent::Tick(delta) => self.on_tick(delta),
        }
        Flow::Continue
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Flow::Quit;
        }

        match (self.state, key.code) {
            (_, KeyCode::Char('e')) => self.export(),
            (AppState::Playing, KeyCode::Char(' ')) => self.toggle_session(),
            (AppState::Playing, KeyCode::Char('r')) => {
                if !self.engine.is_running() {
                    self.results_scroll = 0;
                    self.state = AppState::Results;
                }
            }
            (AppState::Results, KeyCode::Char('r') | KeyCode::Backspace) => {
                self.state = AppState::Playing;
            }
            (AppState::Results, KeyCode::Char(' ')) => {
                self.state = AppState::Playing;
                self.toggle_session();
            }
            (AppState::Results, KeyCode::Up) => {
                self.results_scroll = self.results_scroll.saturating_sub(1);
            }
            (AppState::Results, KeyCode::Down) => {
                // Clamped when rendered
                self.results_scroll += 1;
            }
            (AppState::Results, KeyCode::Home) => self.results_scroll = 0,
            _ => {}
        }
        Flow::Continue
    }

    fn toggle_session(&mut self) {
        if self.engine.is_running() {
            let outcome = self.engine.stop();
            self.after_engine_call(outcome);
        } else {
            self.status = None;
            self.engine.start();
            self.pump_notifications();
        }
    }

    fn on_pointer(&mut self, pointer: PointerEvent) {
        self.pointer = pointer.at;
        if self.state != AppState::Playing {
            return;
        }
        let outcome = match pointer.action {
            PointerAction::Down(button) => self.engine.pointer_down(pointer.at, button),
            PointerAction::Up(button) => self.engine.pointer_up(pointer.at, button),
            PointerAction::Moved => return,
        };
        self.after_engine_call(outcome);
    }

    fn on_tick(&mut self, delta: Duration) {
        if self.engine.is_running() {
            let outcome = self.engine.tick(delta, self.pointer);
            self.after_engine_call(outcome);
        }
    }

    fn after_engine_call(&mut self, outcome: Result<(), SessionError>) {
        if let Err(err) = outcome {
            log::debug!("ignored input: {err}");
        }
        self.pump_notifications();
    }

    fn pump_notifications(&mut self) {
        for note in self.engine.drain_notifications() {
            log::trace!("{note:?}");
            if let Notification::GameOver(summary) = note {
                self.status = Some(format!("final score {}", summary.final_score));
            }
        }
    }

    fn export(&mut self) {
        let dir = self.config.export_dir();
        self.status = Some(match self.engine.export_results(&dir) {
            Ok(path) => format!("saved {}", path.display()),
            Err(SessionError::Export(ExportError::Empty)) => "nothing to export yet".to_string(),
            Err(err) => {
                log::warn!("export to {} failed: {err}", dir.display());
                format!("export failed: {err}")
            }
        });
    }
}

/// Route `log` output to the state dir; the terminal belongs to the TUI.
fn init_logging() {
    if std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    if let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) {
        let _ = env_logger::Builder::from_default_env()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .try_init();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    if cli.save_config {
        store.save(&config)?;
        log::info!("saved config to {}", store.path().display());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, cli.seed, size()?);
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = start_tui(&mut terminal, &mut app, runner);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: FlinchEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut runner: Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui(app, f))?;
    loop {
        if app.handle_event(runner.step()) == Flow::Quit {
            break;
        }
        terminal.draw(|f| ui(app, f))?;
    }
    Ok(())
}

fn ui(app: &mut App, f: &mut Frame) {
    let screen = ui::screen::current_screen(&app.state);
    screen.render(app, f);
}
