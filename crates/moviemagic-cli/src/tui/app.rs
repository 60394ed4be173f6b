use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use moviemagic_core::config::SearchConfig;
use moviemagic_core::grid::ResultGrid;
use moviemagic_core::model::{SearchMode, DEFAULT_YEARS, YEAR_CEILING, YEAR_FLOOR};
use moviemagic_core::prompts::{self, EXAMPLES};
use moviemagic_core::session::{ChatSession, ResultsOutcome, SearchForm};
use moviemagic_core::typewriter::Typewriter;

use super::event::{AsyncAction, AsyncResult};

/// How long an error toast stays on screen.
const ERROR_TOAST: Duration = Duration::from_secs(5);

/// Where the current interaction cycle stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingInput,
    Searching,
    Generating,
    Animating,
}

/// Which control receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Query,
    Occasion,
    Mode,
    YearFrom,
    YearTo,
    Examples,
}

const FOCUS_ORDER: [Focus; 6] = [
    Focus::Query,
    Focus::Occasion,
    Focus::Mode,
    Focus::YearFrom,
    Focus::YearTo,
    Focus::Examples,
];

impl Focus {
    fn position(self) -> usize {
        FOCUS_ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        FOCUS_ORDER[(self.position() + 1) % FOCUS_ORDER.len()]
    }

    pub fn prev(self) -> Self {
        FOCUS_ORDER[(self.position() + FOCUS_ORDER.len() - 1) % FOCUS_ORDER.len()]
    }
}

/// Single-line text input. `cursor` counts chars, not bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputField {
    pub text: String,
    pub cursor: usize,
}

impl InputField {
    fn byte_index(&self) -> usize {
        self.text
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    pub fn set(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.chars().count();
    }

    pub fn insert(&mut self, c: char) {
        let idx = self.byte_index();
        self.text.insert(idx, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let idx = self.byte_index();
            self.text.remove(idx);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let idx = self.byte_index();
            self.text.remove(idx);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }
}

/// Word-by-word reveal of the summary turn at index `turn`.
pub struct Animation {
    pub turn: usize,
    pub frame: String,
    writer: Typewriter,
    next_at: Instant,
}

/// Central application state.
pub struct App {
    pub session: ChatSession,
    pub settings: SearchConfig,
    pub frame_delay: Duration,
    pub phase: Phase,
    pub focus: Focus,
    pub should_quit: bool,

    // -- Form state --
    pub query: InputField,
    pub occasion: InputField,
    pub mode: SearchMode,
    pub year_from: u16,
    pub year_to: u16,
    pub selected_example: usize,

    // -- Chat display --
    /// Display-only progress lines; never part of the conversation.
    pub notices: Vec<String>,
    /// Result layout for each results turn, keyed by turn index.
    pub grids: HashMap<usize, ResultGrid>,
    pub animation: Option<Animation>,
    /// Lines scrolled up from the bottom of the chat.
    pub scroll_back: u16,

    // -- Error toast --
    pub error_message: Option<String>,
    /// When the toast disappears.
    pub error_until: Option<Instant>,
}

impl App {
    pub fn new(settings: SearchConfig, frame_delay: Duration) -> Self {
        let mut session = ChatSession::new();
        session.greet();
        Self {
            session,
            settings,
            frame_delay,
            phase: Phase::AwaitingInput,
            focus: Focus::Query,
            should_quit: false,

            query: InputField::default(),
            occasion: InputField::default(),
            mode: SearchMode::default(),
            year_from: DEFAULT_YEARS.0,
            year_to: DEFAULT_YEARS.1,
            selected_example: 0,

            notices: Vec::new(),
            grids: HashMap::new(),
            animation: None,
            scroll_back: 0,

            error_message: None,
            error_until: None,
        }
    }

    pub fn form(&self) -> SearchForm {
        SearchForm {
            query: self.query.text.clone(),
            occasion: self.occasion.text.clone(),
            mode: self.mode,
            year_from: self.year_from,
            year_to: self.year_to,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.phase != Phase::AwaitingInput
    }

    /// Process an async result from the worker. A finished search with rows
    /// chains straight into generation.
    pub fn handle_result(&mut self, result: AsyncResult) -> Option<AsyncAction> {
        match result {
            AsyncResult::SearchResults { prepared, rows } => {
                match self
                    .session
                    .record_results(&prepared, &rows, self.settings.row_width)
                {
                    ResultsOutcome::NoMatches { notice } => {
                        self.notices = vec![notice];
                        self.phase = Phase::AwaitingInput;
                        None
                    }
                    ResultsOutcome::Found { grid } => {
                        let turn = self.session.conversation().len().saturating_sub(1);
                        self.grids.insert(turn, grid);
                        self.notices = vec![
                            prompts::FOUND_NOTICE.to_string(),
                            prompts::GENERATING_NOTICE.to_string(),
                        ];
                        self.phase = Phase::Generating;
                        Some(AsyncAction::Generate { prepared })
                    }
                }
            }
            AsyncResult::Summary { passage } => {
                let turn = self.session.record_summary(&passage);
                self.notices.clear();
                self.animation = Some(Animation {
                    turn,
                    frame: String::new(),
                    writer: Typewriter::new(&passage),
                    next_at: Instant::now(),
                });
                self.phase = Phase::Animating;
                self.scroll_back = 0;
                None
            }
            AsyncResult::Error(msg) => {
                self.show_error(msg);
                self.notices.clear();
                self.phase = Phase::AwaitingInput;
                None
            }
        }
    }

    /// Handle a key event. Returns an optional async action to dispatch.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<AsyncAction> {
        // Ctrl+C always quits
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }

        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                None
            }
            KeyCode::Tab => {
                self.focus = self.focus.next();
                None
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
                None
            }
            KeyCode::F(n) if (1..=EXAMPLES.len() as u8).contains(&n) => {
                self.run_example(usize::from(n - 1))
            }
            KeyCode::Enter => match self.focus {
                Focus::Examples => self.run_example(self.selected_example),
                _ => self.submit(),
            },
            KeyCode::Up => {
                self.scroll_back = self.scroll_back.saturating_add(1);
                None
            }
            KeyCode::Down => {
                self.scroll_back = self.scroll_back.saturating_sub(1);
                None
            }
            KeyCode::PageUp if !self.year_focused() => {
                self.scroll_back = self.scroll_back.saturating_add(10);
                None
            }
            KeyCode::PageDown if !self.year_focused() => {
                self.scroll_back = self.scroll_back.saturating_sub(10);
                None
            }
            _ => {
                self.handle_focused(key);
                None
            }
        }
    }

    fn year_focused(&self) -> bool {
        matches!(self.focus, Focus::YearFrom | Focus::YearTo)
    }

    fn handle_focused(&mut self, key: KeyEvent) {
        match self.focus {
            Focus::Query | Focus::Occasion => {
                let field = if self.focus == Focus::Query {
                    &mut self.query
                } else {
                    &mut self.occasion
                };
                match key.code {
                    KeyCode::Char(c)
                        if !key
                            .modifiers
                            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
                    {
                        field.insert(c)
                    }
                    KeyCode::Backspace => field.backspace(),
                    KeyCode::Delete => field.delete(),
                    KeyCode::Left => field.left(),
                    KeyCode::Right => field.right(),
                    KeyCode::Home => field.home(),
                    KeyCode::End => field.end(),
                    _ => {}
                }
            }
            Focus::Mode => match key.code {
                KeyCode::Left => self.mode = self.mode.prev(),
                KeyCode::Right | KeyCode::Char(' ') => self.mode = self.mode.next(),
                _ => {}
            },
            Focus::YearFrom | Focus::YearTo => {
                let delta: i32 = match key.code {
                    KeyCode::Left => -1,
                    KeyCode::Right => 1,
                    KeyCode::PageDown => -10,
                    KeyCode::PageUp => 10,
                    _ => return,
                };
                let year = if self.focus == Focus::YearFrom {
                    &mut self.year_from
                } else {
                    &mut self.year_to
                };
                *year = step_year(*year, delta);
            }
            Focus::Examples => match key.code {
                KeyCode::Left => {
                    self.selected_example =
                        (self.selected_example + EXAMPLES.len() - 1) % EXAMPLES.len();
                }
                KeyCode::Right => {
                    self.selected_example = (self.selected_example + 1) % EXAMPLES.len();
                }
                _ => {}
            },
        }
    }

    /// Fill the inputs from an example and search right away.
    fn run_example(&mut self, index: usize) -> Option<AsyncAction> {
        if self.is_busy() {
            return None;
        }
        match self.session.select_example(index) {
            Ok(example) => {
                self.query.set(example.movie_type);
                self.occasion.set(example.occasion);
                self.selected_example = index;
                self.submit()
            }
            Err(e) => {
                self.show_error(e.to_string());
                None
            }
        }
    }

    /// Record the user turn and hand the search to the worker. Ignored while
    /// a cycle is still running.
    fn submit(&mut self) -> Option<AsyncAction> {
        if self.is_busy() {
            return None;
        }
        match self.session.begin_search(&self.form(), &self.settings) {
            Ok(prepared) => {
                self.phase = Phase::Searching;
                self.notices.clear();
                self.scroll_back = 0;
                Some(AsyncAction::Search { prepared })
            }
            Err(e) => {
                self.show_error(e.to_string());
                None
            }
        }
    }

    fn show_error(&mut self, msg: String) {
        self.show_error_at(msg, Instant::now());
    }

    fn show_error_at(&mut self, msg: String, now: Instant) {
        self.error_message = Some(msg);
        self.error_until = Some(now + ERROR_TOAST);
    }

    /// How long the event loop may block waiting for input.
    pub fn poll_timeout(&self) -> Duration {
        let idle = Duration::from_millis(50);
        if self.animation.is_some() && !self.frame_delay.is_zero() {
            self.frame_delay.min(idle)
        } else {
            idle
        }
    }

    /// Advance timers: the error toast and any running animation.
    pub fn tick(&mut self, now: Instant) {
        self.tick_error(now);
        self.tick_animation(now);
    }

    fn tick_animation(&mut self, now: Instant) {
        let delay = self.frame_delay;
        let Some(anim) = self.animation.as_mut() else {
            return;
        };
        while now >= anim.next_at {
            match anim.writer.next() {
                Some(frame) => {
                    anim.frame = frame;
                    anim.next_at += delay;
                }
                None => {
                    self.animation = None;
                    self.phase = Phase::AwaitingInput;
                    return;
                }
            }
        }
    }

    /// Clear the error toast once its deadline has passed.
    pub fn tick_error(&mut self, now: Instant) {
        if self.error_until.is_some_and(|until| now >= until) {
            self.error_message = None;
            self.error_until = None;
        }
    }
}

fn step_year(year: u16, delta: i32) -> u16 {
    let stepped = (i32::from(year) + delta).clamp(i32::from(YEAR_FLOOR), i32::from(YEAR_CEILING));
    u16::try_from(stepped).unwrap_or(year)
}
