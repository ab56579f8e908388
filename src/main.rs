pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use quizr::{
    app_dirs::AppDirs,
    cache::QuestionCache,
    clock::{describe_age, Clock},
    config::{Config, ConfigStore, Difficulty, FileConfigStore},
    export::{self, ResultSummary},
    logging,
    question_source::{LoadOrigin, QuestionSource},
    runtime::{CrosstermEventSource, FixedTicker, QuizEvent, QuizEventSource, Runner, Ticker},
    store::{SessionStore, SqliteSessionStore},
    trivia_api::{Fetcher, ReqwestTransport, ThreadSleeper, TriviaRequest},
    FetchError, QuestionSet, QuizInput, QuizSession, QuizState,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::{mpsc::Sender, Arc},
    time::Duration,
};

const TICK_RATE_MS: u64 = 100;

/// terminal trivia quiz with cached questions and exportable results
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal trivia quiz: fetches a batch of multiple-choice questions, caches them for an hour, shuffles the answers on every visit and keeps score."
)]
pub struct Cli {
    /// number of questions to fetch
    #[clap(short = 'n', long)]
    amount: Option<usize>,

    /// trivia category id (18 is Science: Computers)
    #[clap(short = 'c', long)]
    category: Option<u32>,

    /// question difficulty
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// ignore cached questions and fetch a new batch
    #[clap(short = 'r', long)]
    refresh: bool,

    /// directory that selectedAnswers.json is written to
    #[clap(short = 'o', long)]
    export_dir: Option<PathBuf>,

    /// base url of the trivia api
    #[clap(long)]
    api_url: Option<String>,

    /// store the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Layer command line overrides on top of the stored config
    fn apply(&self, mut config: Config) -> Config {
        if let Some(amount) = self.amount {
            config.amount = amount;
        }
        if let Some(category) = self.category {
            config.category = category;
        }
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(dir) = &self.export_dir {
            config.export_dir = Some(dir.clone());
        }
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        config
    }

    /// The cache holds a single batch, so asking for a different one means refetching
    fn bypass_cache(&self) -> bool {
        self.refresh
            || self.amount.is_some()
            || self.category.is_some()
            || self.difficulty.is_some()
            || self.api_url.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Quiz,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFlow {
    Continue,
    Quit,
}

pub struct App {
    pub config: Config,
    pub state: AppState,
    pub session: QuizSession,
    pub origin: Option<LoadOrigin>,
    pub status: Option<String>,
    pub results: Option<ResultSummary>,
    pub spinner_frame: usize,
    store: Box<dyn SessionStore>,
    source: QuestionSource,
    events: Sender<QuizEvent>,
    bypass_cache: bool,
    fetch_in_flight: bool,
}

impl App {
    pub fn new(
        config: Config,
        store: Box<dyn SessionStore>,
        source: QuestionSource,
        events: Sender<QuizEvent>,
        bypass_cache: bool,
    ) -> Self {
        Self {
            config,
            state: AppState::Quiz,
            session: QuizSession::new(),
            origin: None,
            status: None,
            results: None,
            spinner_frame: 0,
            store,
            source,
            events,
            bypass_cache,
            fetch_in_flight: false,
        }
    }

    /// Loads questions from the cache, or starts a background fetch
    pub fn start(&mut self) {
        if self.fetch_in_flight || !self.session.is_loading() {
            return;
        }
        let bypass = std::mem::take(&mut self.bypass_cache);
        if !bypass {
            if let Some(hit) = self.source.cached(self.store.as_ref()) {
                self.origin = Some(hit.origin);
                self.session.handle(QuizInput::QuestionsLoaded(hit.questions));
                return;
            }
        }
        self.fetch_in_flight = true;
        self.source.spawn_fetch(self.events.clone());
    }

    /// Throws away the current session and loads a new one
    pub fn restart(&mut self, bypass_cache: bool) {
        if self.fetch_in_flight {
            return;
        }
        self.session = QuizSession::new();
        self.state = AppState::Quiz;
        self.origin = None;
        self.results = None;
        self.bypass_cache = bypass_cache;
        self.start();
    }

    pub fn on_loaded(&mut self, result: Result<QuestionSet, FetchError>) {
        self.fetch_in_flight = false;
        if !self.session.is_loading() {
            tracing::debug!("ignoring fetch result for a session that is no longer loading");
            return;
        }
        match result {
            Ok(questions) => {
                self.source.remember(self.store.as_mut(), &questions);
                self.origin = Some(LoadOrigin::Network);
                self.session.handle(QuizInput::QuestionsLoaded(questions));
            }
            Err(e) => {
                tracing::warn!(error = %e, "no questions available");
                self.session.handle(QuizInput::LoadFailed);
            }
        }
    }

    pub fn on_tick(&mut self) {
        if self.session.is_loading() {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> KeyFlow {
        // ctrl+c to quit
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyFlow::Quit;
        }
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
            return KeyFlow::Quit;
        }

        self.status = None;
        match self.state {
            AppState::Quiz => self.on_quiz_key(key.code),
            AppState::Results => match key.code {
                KeyCode::Char('n') => self.restart(true),
                KeyCode::Char('s') => self.save_answers(),
                _ => {}
            },
        }
        KeyFlow::Continue
    }

    fn on_quiz_key(&mut self, code: KeyCode) {
        match (self.session.state(), code) {
            (QuizState::Empty, KeyCode::Char('r')) => self.restart(true),
            (QuizState::Ready(_), KeyCode::Char(c)) if c.is_ascii_digit() && c != '0' => {
                let slot = c.to_digit(10).map_or(0, |d| d as usize - 1);
                self.session.select_slot(slot);
            }
            (QuizState::Answered(_), KeyCode::Char(c)) if c.is_ascii_digit() => {
                self.status = Some("Already answered".to_string());
            }
            (QuizState::Ready(_) | QuizState::Answered(_), code) => match code {
                KeyCode::Left | KeyCode::Char('h') => {
                    self.session.handle(QuizInput::Back);
                }
                KeyCode::Right | KeyCode::Char('l') => {
                    self.session.handle(QuizInput::Next);
                }
                KeyCode::Char('s') => self.save_answers(),
                KeyCode::Enter => self.submit(),
                _ => {}
            },
            _ => {}
        }
    }

    fn export_dir(&self) -> PathBuf {
        self.config
            .export_dir
            .clone()
            .unwrap_or_else(AppDirs::export_dir)
    }

    fn save_answers(&mut self) {
        let dir = self.export_dir();
        self.status = Some(
            match export::save_to_file(&dir, self.session.ledger().selections()) {
                Ok(path) => format!("Saved {}", path.display()),
                Err(e) => {
                    tracing::error!(error = %e, dir = %dir.display(), "failed to export answers");
                    "Could not save answers".to_string()
                }
            },
        );
    }

    fn submit(&mut self) {
        let submitted = export::submit(self.store.as_mut(), self.session.ledger())
            .and_then(|_| ResultSummary::load(self.store.as_ref()));
        match submitted {
            Ok(results) => {
                let skipped = self.session.ledger().unanswered();
                if !skipped.is_empty() {
                    self.status = Some(format!(
                        "Skipped: {}",
                        skipped.iter().map(|i| i + 1).join(", ")
                    ));
                }
                self.results = results;
                self.state = AppState::Results;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to submit answers");
                self.status = Some("Could not submit answers".to_string());
            }
        }
    }

    /// Where the current questions came from, for the status line
    pub fn cache_status(&self) -> Option<String> {
        match self.origin? {
            LoadOrigin::Cache {
                fetched_at_epoch_millis,
            } => {
                let age = self
                    .source
                    .cache()
                    .clock
                    .now_millis()
                    .saturating_sub(fetched_at_epoch_millis);
                Some(format!("cached questions, fetched {}", describe_age(age)))
            }
            LoadOrigin::Network => Some("fresh questions".to_string()),
        }
    }
}

fn build_source(config: &Config) -> Result<QuestionSource, FetchError> {
    let fetcher = Fetcher::new(
        Arc::new(ReqwestTransport::new()?),
        Arc::new(ThreadSleeper),
        config.retry_policy(),
        TriviaRequest::from(config),
    );
    Ok(QuestionSource::new(
        fetcher,
        QuestionCache::new(config.cache_ttl_millis(), Clock::System),
    ))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let _log_guard = AppDirs::log_dir().and_then(|dir| logging::init(&dir).ok());

    let config_store = FileConfigStore::new();
    let config = cli.apply(config_store.load());
    if cli.save_config {
        config_store.save(&config)?;
        tracing::info!(path = %config_store.path().display(), "saved config");
    }

    let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("quizr_session.db"));
    let store = SqliteSessionStore::open(&db_path)?;
    let source = build_source(&config)?;
    tracing::info!(url = %TriviaRequest::from(&config).url(), "starting quiz");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = CrosstermEventSource::new();
    let mut app = App::new(
        config,
        Box::new(store),
        source,
        events.sender(),
        cli.bypass_cache(),
    );
    let runner = Runner::new(events, FixedTicker::new(Duration::from_millis(TICK_RATE_MS)));
    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: QuizEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    app.start();

    loop {
        terminal.draw(|f| ui(app, f))?;

        match runner.step() {
            QuizEvent::Tick => app.on_tick(),
            QuizEvent::Resize => {}
            QuizEvent::Loaded(result) => app.on_loaded(result),
            QuizEvent::Key(key) => {
                if app.on_key(key) == KeyFlow::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    ui::screen::current_screen(app).render(app, f);
}
