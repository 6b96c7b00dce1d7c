use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    cursor::Show,
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use rand::rngs::StdRng;
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin},
    path::{Path, PathBuf},
};
use taphappy::{
    config::{Config, ConfigStore, FileConfigStore},
    error::Result as TapResult,
    placement::RngSource,
    runtime::{CrosstermEventSource, Runner, SystemClock, TapEvent, TapEventSource, TickSchedule},
    session::{GameSession, SessionSettings},
    ui::{self, GameScreen},
};

/// tap the happy face ten times as fast as you can
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A reaction-time mini-game: a happy face appears somewhere in the terminal and you click it ten times while the stopwatch runs. The best time is kept for as long as the game is open."
)]
pub struct Cli {
    /// width of the happy face in terminal cells
    #[clap(long)]
    target_width: Option<u32>,

    /// height of the happy face in terminal cells
    #[clap(long)]
    target_height: Option<u32>,

    /// stopwatch refresh interval in milliseconds
    #[clap(long)]
    tick_ms: Option<u64>,

    /// seed for target placement, for reproducible rounds
    #[clap(long)]
    seed: Option<u64>,

    /// write logs to this file (filtered with RUST_LOG, default info)
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// store the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Command line values win over stored ones
    fn merge_into(&self, mut cfg: Config) -> Config {
        if let Some(w) = self.target_width {
            cfg.target_width = w;
        }
        if let Some(h) = self.target_height {
            cfg.target_height = h;
        }
        if let Some(ms) = self.tick_ms {
            cfg.tick_ms = ms;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        cfg
    }
}

type Session = GameSession<TickSchedule, RngSource<StdRng>, SystemClock>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub session: Session,
    pub playfield: Rect,
}

impl App {
    pub fn new(cfg: &Config, schedule: TickSchedule, area: Rect) -> Self {
        let rng = match cfg.seed {
            Some(seed) => RngSource::from_seed(seed),
            None => RngSource::from_entropy(),
        };
        let (_, playfield) = ui::split(area);
        let session = GameSession::new(
            schedule,
            rng,
            SystemClock::new(),
            ui::viewport_of(playfield),
            SessionSettings::from(cfg),
        );

        Self { session, playfield }
    }

    fn handle_event(&mut self, event: TapEvent) -> Flow {
        match event {
            TapEvent::Tick => self.session.on_clock_tick(),
            TapEvent::Resize(width, height) => {
                let (_, playfield) = ui::split(Rect::new(0, 0, width, height));
                self.playfield = playfield;
                self.session.on_viewport_change(ui::viewport_of(playfield));
            }
            TapEvent::Mouse(mouse) => self.on_mouse(mouse),
            TapEvent::Key(key) => return self.on_key(key),
        }
        Flow::Continue
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.kind == KeyEventKind::Release {
            return Flow::Continue;
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Flow::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Flow::Quit,
            KeyCode::Char(' ') | KeyCode::Enter => {
                self.session.toggle();
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        if let Some(point) = ui::tap_point(self.playfield, mouse.column, mouse.row) {
            self.session.tap(point);
        }
    }
}

fn init_logging(path: &Path) -> TapResult<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(())
}

/// Puts the terminal back when dropped, on every exit path after raw mode is on
struct TerminalGuard {
    restore: fn() -> io::Result<()>,
}

impl TerminalGuard {
    fn new(restore: fn() -> io::Result<()>) -> Self {
        Self { restore }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(err) = (self.restore)() {
            log::warn!("failed to restore terminal: {err}");
        }
    }
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture, Show)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let store = FileConfigStore::new();
    let cfg = cli.merge_into(store.load());
    if cli.save_config {
        store.save(&cfg)?;
        log::info!("saved settings to {}", store.path().display());
    }

    enable_raw_mode()?;
    let _guard = TerminalGuard::new(restore_terminal);

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let schedule = TickSchedule::new();
    let size = terminal.size()?;
    let mut app = App::new(&cfg, schedule.clone(), Rect::new(0, 0, size.width, size.height));
    let runner = Runner::new(CrosstermEventSource::new(), schedule);

    start_tui(&mut terminal, &mut app, &runner)
}

fn start_tui<B: Backend, E: TapEventSource>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, TickSchedule>,
) -> Result<(), Box<dyn Error>> {
    log::info!("taphappy started");
    loop {
        let view = app.session.view();
        terminal.draw(|f| f.render_widget(GameScreen::new(&view), f.area()))?;

        if app.handle_event(runner.step()) == Flow::Quit {
            break;
        }
    }
    log::info!(
        "taphappy exiting, best score {:?}",
        app.session.best_label()
    );
    Ok(())
}
