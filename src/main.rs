pub mod app_dirs;
pub mod assistant;
pub mod catalog;
pub mod celebration;
pub mod config;
pub mod generation;
pub mod keyboard;
pub mod navigation;
pub mod progress;
pub mod runtime;
pub mod ui;

use crate::{
    assistant::{AssistantReply, AssistantSession, QuestionRequest},
    catalog::Catalog,
    celebration::Celebration,
    config::{Config, ConfigStore, FileConfigStore},
    generation::{Generate, GenerationClient, GenerationConfig},
    keyboard::{KeyboardDiagram, PALETTE},
    navigation::{Direction, NavState, ScreenView},
    progress::Progress,
    runtime::{CrosstermEventSource, FixedTicker, HubEvent, Runner},
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    sync::{mpsc, Arc, Mutex},
    thread,
    time::Duration,
};
use webbrowser::Browser;

const TICK_RATE_MS: u64 = 100;

/// friendly classroom curriculum tui
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    version,
    about,
    long_about = "A friendly classroom hub for young learners: browse sprints and lessons, color the keyboard map, track your progress, and ask Codie questions about the lesson you are on."
)]
pub struct Cli {
    /// sprint to open at startup
    #[clap(short = 's', long)]
    sprint: Option<String>,

    /// lesson to open at startup
    #[clap(short = 'l', long, requires = "sprint")]
    lesson: Option<String>,

    /// model used by the lesson helper
    #[clap(short = 'm', long)]
    model: Option<String>,

    /// base url of the text generation service
    #[clap(long)]
    base_url: Option<String>,

    /// disable the lesson helper entirely
    #[clap(long)]
    no_assistant: bool,
}

/// Which pane owns key input inside the lesson screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LessonFocus {
    Content,
    Coloring,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScreenKind {
    Home,
    Sprint,
    Lesson,
}

#[derive(Debug, Default)]
pub struct HomeState {
    pub cursor: usize,
}

#[derive(Debug, Default)]
pub struct SprintViewState {
    pub cursor: usize,
}

/// Per-lesson view state, rebuilt from scratch every time a lesson is
/// entered. Dropping it discards the coloring and any assistant transcript.
#[derive(Debug)]
pub struct LessonViewState {
    pub scroll: u16,
    pub focus: LessonFocus,
    pub diagram: Option<KeyboardDiagram>,
    pub assistant: Option<AssistantSession>,
    pub input: String,
}

impl LessonViewState {
    fn new(has_diagram: bool) -> Self {
        Self {
            scroll: 0,
            focus: LessonFocus::Content,
            diagram: has_diagram.then(KeyboardDiagram::new),
            assistant: None,
            input: String::new(),
        }
    }

    fn empty() -> Self {
        Self::new(false)
    }
}

/// What the event loop should do after a key was handled
#[derive(Debug)]
pub enum Action {
    None,
    Quit,
    Ask(QuestionRequest),
    Celebrate,
}

pub struct App {
    pub catalog: Catalog,
    pub nav: NavState,
    pub progress: Progress,
    pub celebration: Celebration,
    pub home_state: HomeState,
    pub sprint_state: SprintViewState,
    pub lesson_state: LessonViewState,
    pub generator: Arc<GenerationClient>,
    pub assistant_enabled: bool,
    pub status: Option<String>,
    pub tick: u64,
}

impl App {
    pub fn new(cli: Cli) -> Result<Self, Box<dyn Error>> {
        let catalog = Catalog::load()?;
        let config = FileConfigStore::new().load();
        Self::with_config(cli, catalog, config)
    }

    pub fn with_config(cli: Cli, catalog: Catalog, config: Config) -> Result<Self, Box<dyn Error>> {
        let assistant_enabled = config.assistant_enabled && !cli.no_assistant;
        let gen_config = if assistant_enabled {
            resolve_generation_config(&cli, &config)
        } else {
            None
        };
        let generator = Arc::new(GenerationClient::new(gen_config));

        let mut app = Self {
            catalog,
            nav: NavState::new(),
            progress: Progress::new(),
            celebration: Celebration::new(),
            home_state: HomeState::default(),
            sprint_state: SprintViewState::default(),
            lesson_state: LessonViewState::empty(),
            generator,
            assistant_enabled,
            status: None,
            tick: 0,
        };

        if let Some(sprint_id) = &cli.sprint {
            app.nav.select_sprint(&app.catalog, sprint_id)?;
            if let Some(lesson_id) = &cli.lesson {
                app.nav.select_lesson(&app.catalog, lesson_id)?;
                app.remount_lesson();
            }
        }

        Ok(app)
    }

    pub fn screen_kind(&self) -> ScreenKind {
        match self.nav.screen(&self.catalog) {
            ScreenView::Home => ScreenKind::Home,
            ScreenView::SprintView(_) => ScreenKind::Sprint,
            ScreenView::LessonView(..) => ScreenKind::Lesson,
        }
    }

    pub fn assistant_pending(&self) -> bool {
        self.lesson_state
            .assistant
            .as_ref()
            .is_some_and(|s| s.is_pending())
    }

    pub fn on_tick(&mut self) {
        self.celebration.update();
        self.tick = self.tick.wrapping_add(1);
    }

    /// Route a worker reply to the live session, if any. A reply arriving
    /// after the lesson (and its session) was left is simply dropped.
    pub fn apply_assistant_reply(&mut self, reply: AssistantReply) {
        match self.lesson_state.assistant.as_mut() {
            Some(session) => session.resolve(reply),
            None => {
                tracing::debug!(token = reply.token, "assistant reply arrived with no open session")
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        self.status = None;

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }

        match self.screen_kind() {
            ScreenKind::Home => self.handle_home_key(key),
            ScreenKind::Sprint => self.handle_sprint_key(key),
            ScreenKind::Lesson => self.handle_lesson_key(key),
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') => return Action::Quit,
            KeyCode::Up => {
                self.home_state.cursor = self.home_state.cursor.saturating_sub(1);
            }
            KeyCode::Down => {
                let last = self.catalog.sprints.len().saturating_sub(1);
                self.home_state.cursor = (self.home_state.cursor + 1).min(last);
            }
            KeyCode::Enter => {
                let id = self
                    .catalog
                    .sprints
                    .get(self.home_state.cursor)
                    .map(|s| s.id.clone());
                if let Some(id) = id {
                    match self.nav.select_sprint(&self.catalog, &id) {
                        Ok(()) => self.sprint_state = SprintViewState::default(),
                        Err(err) => self.status = Some(err.to_string()),
                    }
                }
            }
            // Back from home is a no-op
            KeyCode::Esc | KeyCode::Backspace => {}
            _ => {}
        }
        Action::None
    }

    fn handle_sprint_key(&mut self, key: KeyEvent) -> Action {
        let lesson_count = self
            .selected_sprint_lessons()
            .map(|l| l.len())
            .unwrap_or(0);

        match key.code {
            KeyCode::Char('q') => return Action::Quit,
            KeyCode::Esc | KeyCode::Backspace => {
                self.nav.go_back();
            }
            KeyCode::Up => {
                self.sprint_state.cursor = self.sprint_state.cursor.saturating_sub(1);
            }
            KeyCode::Down => {
                let last = lesson_count.saturating_sub(1);
                self.sprint_state.cursor = (self.sprint_state.cursor + 1).min(last);
            }
            KeyCode::Enter => {
                let id = self
                    .selected_sprint_lessons()
                    .and_then(|lessons| lessons.get(self.sprint_state.cursor))
                    .map(|l| l.id.clone());
                if let Some(id) = id {
                    match self.nav.select_lesson(&self.catalog, &id) {
                        Ok(()) => self.remount_lesson(),
                        Err(err) => self.status = Some(err.to_string()),
                    }
                }
            }
            _ => {}
        }
        Action::None
    }

    fn handle_lesson_key(&mut self, key: KeyEvent) -> Action {
        match self.lesson_state.focus {
            LessonFocus::Assistant => self.handle_assistant_key(key),
            LessonFocus::Coloring => {
                self.handle_coloring_key(key);
                Action::None
            }
            LessonFocus::Content => self.handle_content_key(key),
        }
    }

    fn handle_content_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') => return Action::Quit,
            KeyCode::Esc | KeyCode::Backspace => {
                // Leaving the lesson tears the view state down, transcript included
                self.nav.go_back();
                self.lesson_state = LessonViewState::empty();
            }
            KeyCode::Up => {
                self.lesson_state.scroll = self.lesson_state.scroll.saturating_sub(1);
            }
            KeyCode::Down => {
                self.lesson_state.scroll = self.lesson_state.scroll.saturating_add(1);
            }
            KeyCode::Left => {
                if self
                    .nav
                    .navigate(&self.catalog, &mut self.progress, Direction::Prev)
                {
                    self.remount_lesson();
                }
            }
            KeyCode::Right => {
                if self
                    .nav
                    .navigate(&self.catalog, &mut self.progress, Direction::Next)
                {
                    self.remount_lesson();
                    return Action::Celebrate;
                }
            }
            KeyCode::Char('a') => {
                if self.assistant_enabled {
                    if let Some(title) = self.current_lesson_title() {
                        self.lesson_state.assistant = Some(AssistantSession::open(title));
                        self.lesson_state.focus = LessonFocus::Assistant;
                    }
                }
            }
            KeyCode::Char('c') => {
                if self.lesson_state.diagram.is_some() {
                    self.lesson_state.focus = LessonFocus::Coloring;
                }
            }
            KeyCode::Char(c @ '1'..='9') => {
                let idx = c as usize - '1' as usize;
                self.open_link(idx);
            }
            _ => {}
        }
        Action::None
    }

    fn handle_coloring_key(&mut self, key: KeyEvent) {
        let Some(diagram) = self.lesson_state.diagram.as_mut() else {
            self.lesson_state.focus = LessonFocus::Content;
            return;
        };
        match key.code {
            KeyCode::Esc => self.lesson_state.focus = LessonFocus::Content,
            KeyCode::Left => diagram.move_left(),
            KeyCode::Right => diagram.move_right(),
            KeyCode::Up => diagram.move_up(),
            KeyCode::Down => diagram.move_down(),
            KeyCode::Enter | KeyCode::Char(' ') => diagram.paint_at_cursor(),
            KeyCode::Tab => diagram.cycle_color(),
            KeyCode::Char(c @ '1'..='7') => {
                let idx = c as usize - '1' as usize;
                diagram.select_color(PALETTE[idx]);
            }
            _ => {}
        }
    }

    fn handle_assistant_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => {
                // Closing the panel discards the whole transcript
                self.lesson_state.assistant = None;
                self.lesson_state.focus = LessonFocus::Content;
            }
            KeyCode::Enter => {
                let question = self.lesson_state.input.clone();
                if let Some(session) = self.lesson_state.assistant.as_mut() {
                    if let Some(request) = session.submit_question(&question) {
                        self.lesson_state.input.clear();
                        return Action::Ask(request);
                    }
                }
            }
            KeyCode::Backspace => {
                self.lesson_state.input.pop();
            }
            KeyCode::Char(c) => {
                self.lesson_state.input.push(c);
            }
            _ => {}
        }
        Action::None
    }

    fn remount_lesson(&mut self) {
        let has_diagram = match self.nav.screen(&self.catalog) {
            ScreenView::LessonView(_, lesson) => lesson.has_keyboard_map(),
            _ => false,
        };
        self.lesson_state = LessonViewState::new(has_diagram);
    }

    fn selected_sprint_lessons(&self) -> Option<&[catalog::Lesson]> {
        self.nav
            .selected_sprint_id()
            .and_then(|id| self.catalog.sprint(id))
            .map(|s| s.lessons.as_slice())
    }

    fn current_lesson_title(&self) -> Option<String> {
        match self.nav.screen(&self.catalog) {
            ScreenView::LessonView(_, lesson) => Some(lesson.title.clone()),
            _ => None,
        }
    }

    fn open_link(&mut self, idx: usize) {
        let url = match self.nav.screen(&self.catalog) {
            ScreenView::LessonView(_, lesson) => {
                lesson.links().get(idx).map(|(_, url)| url.to_string())
            }
            _ => None,
        };
        if let Some(url) = url {
            if Browser::is_available() {
                webbrowser::open(&url).unwrap_or_default();
            }
        }
    }
}

fn resolve_generation_config(cli: &Cli, config: &Config) -> Option<GenerationConfig> {
    let api_key = std::env::var("HUB_AI_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())?;
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| std::env::var("HUB_AI_BASE_URL").ok())
        .unwrap_or_else(|| config.assistant_base_url.clone());
    let model = cli
        .model
        .clone()
        .or_else(|| std::env::var("HUB_AI_MODEL").ok())
        .unwrap_or_else(|| config.assistant_model.clone());
    Some(GenerationConfig {
        base_url,
        api_key,
        model,
    })
}

fn init_tracing() {
    let Some(path) = app_dirs::AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    }
}

fn spawn_helper_request(
    request: QuestionRequest,
    generator: Arc<GenerationClient>,
    tx: mpsc::Sender<HubEvent>,
) {
    thread::spawn(move || {
        let result = generator.generate(&request.system, &request.prompt);
        let _ = tx.send(HubEvent::Assistant(AssistantReply {
            token: request.token,
            result,
        }));
    });
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(cli)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    res
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let event_source = CrosstermEventSource::new();
    let reply_tx = event_source.sender();
    let ticker = FixedTicker::new(Duration::from_millis(TICK_RATE_MS));
    let runner = Runner::new(event_source, ticker);

    terminal.draw(|f| ui::render(app, f))?;

    loop {
        match runner.step() {
            HubEvent::Tick => {
                app.on_tick();

                // Redraw on ticks only while something animates
                if app.celebration.is_active || app.assistant_pending() {
                    terminal.draw(|f| ui::render(app, f))?;
                }
            }
            HubEvent::Resize => {
                terminal.draw(|f| ui::render(app, f))?;
            }
            HubEvent::Assistant(reply) => {
                app.apply_assistant_reply(reply);
                terminal.draw(|f| ui::render(app, f))?;
            }
            HubEvent::Key(key) => {
                match app.handle_key(key) {
                    Action::Quit => break,
                    Action::Ask(request) => {
                        spawn_helper_request(request, Arc::clone(&app.generator), reply_tx.clone());
                    }
                    Action::Celebrate => {
                        let size = terminal.size().unwrap_or_default();
                        app.celebration.start(size.width, size.height);
                    }
                    Action::None => {}
                }
                terminal.draw(|f| ui::render(app, f))?;
            }
        }
    }

    Ok(())
}
