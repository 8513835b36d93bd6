pub mod ui;

use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    rc::Rc,
    time::Duration,
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use keysprint::{
    app_dirs::AppDirs,
    arcade::{ArcadeSession, ArcadeState, SubmitOutcome},
    clock::{Clock, SystemClock},
    config::{Config, ConfigStore, FileConfigStore},
    logging,
    runtime::{AppEvent, ChannelEvents, Runner},
    samples::{Difficulty, TextSampleProvider},
    sound::{BellSink, CueSink, SwitchProfile},
    theme::{Palette, PRESET_NAMES},
    typing::{TypingSession, TypingState},
    word_bank::WordBank,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use strum::IntoEnumIterator;

const TICK_RATE_MS: u64 = 50;
const DURATION_STEP_SECS: u32 = 15;

/// terminal typing trainer with live wpm/accuracy and a falling-word arcade
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing trainer: timed tests scored live for words per minute and accuracy, plus an arcade mode where falling words must be typed before they hit the floor."
)]
pub struct Cli {
    /// number of seconds per typing test
    #[clap(short = 's', long)]
    secs: Option<u32>,

    /// difficulty of the sample text
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// custom text to type instead of a sample
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// open straight into arcade mode
    #[clap(long)]
    arcade: bool,

    /// color preset
    #[clap(long, value_parser = clap::builder::PossibleValuesParser::new(PRESET_NAMES))]
    theme: Option<String>,

    /// keyboard switch whose feedback the sound cues imitate
    #[clap(long, value_enum)]
    sound_profile: Option<SwitchProfile>,

    /// cue volume between 0 and 1
    #[clap(long)]
    volume: Option<f32>,

    /// disable sound cues
    #[clap(long)]
    mute: bool,

    /// store the effective settings as the new defaults
    #[clap(long)]
    save: bool,

    /// more log output (repeatable)
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// where to write logs (defaults to the state directory)
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Layers the flags given on the command line over stored preferences.
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(secs) = self.secs {
            config.duration_secs = secs;
        }
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(theme) = &self.theme {
            config.palette = Palette::preset(theme);
        }
        if let Some(profile) = self.sound_profile {
            config.sound.profile = profile;
        }
        if let Some(volume) = self.volume {
            config.sound.volume = volume;
        }
        if self.mute {
            config.sound.enabled = false;
        }
        config.sanitized()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Typing,
    Arcade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App<C: Clock> {
    pub mode: Mode,
    pub typing: TypingSession<C>,
    pub arcade: ArcadeSession<C>,
    pub arcade_input: String,
    pub last_submit: Option<SubmitOutcome>,
    pub palette: Palette,
}

impl<C: Clock + Clone> App<C> {
    pub fn new(
        config: &Config,
        prompt: Option<String>,
        clock: C,
        mut sink: impl FnMut() -> Box<dyn CueSink>,
    ) -> keysprint::Result<Self> {
        let provider = Rc::new(TextSampleProvider::embedded()?);
        let bank = Rc::new(WordBank::embedded()?);

        let mut typing = TypingSession::new(provider, clock.clone(), sink());
        typing.configure(config.duration_secs);
        typing.set_difficulty(config.difficulty);
        typing.set_custom_text(prompt);

        Ok(Self {
            mode: Mode::Typing,
            typing,
            arcade: ArcadeSession::new(bank, clock, sink()),
            arcade_input: String::new(),
            last_submit: None,
            palette: config.palette.clone(),
        })
    }
}

impl<C: Clock> App<C> {
    /// Fires whatever timers the clock has caught up with.
    pub fn run_due(&mut self) {
        self.typing.run_due();
        self.arcade.run_due();
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('c') if ctrl => return Flow::Quit,
            KeyCode::Char('r') if ctrl => self.reset_mode(),
            KeyCode::Char('p') if ctrl => {
                if self.mode == Mode::Arcade {
                    self.arcade.toggle_pause();
                }
            }
            KeyCode::Tab => self.switch_mode(),
            _ => match self.mode {
                Mode::Typing => self.typing_key(key.code),
                Mode::Arcade => self.arcade_key(key.code),
            },
        }
        Flow::Continue
    }

    fn switch_mode(&mut self) {
        self.mode = match self.mode {
            Mode::Typing => Mode::Arcade,
            Mode::Arcade => {
                self.arcade.pause();
                Mode::Typing
            }
        };
        tracing::info!(mode = ?self.mode, "switched mode");
    }

    fn reset_mode(&mut self) {
        match self.mode {
            Mode::Typing => self.typing.reset(),
            Mode::Arcade => {
                self.arcade.reset();
                self.arcade_input.clear();
                self.last_submit = None;
            }
        }
    }

    fn typing_key(&mut self, code: KeyCode) {
        match (self.typing.state(), code) {
            (TypingState::Idle, KeyCode::Enter) => self.typing.start(),
            (TypingState::Idle, KeyCode::Left) => self.cycle_difficulty(false),
            (TypingState::Idle, KeyCode::Right) => self.cycle_difficulty(true),
            (TypingState::Idle, KeyCode::Up) => {
                let secs = self.typing.duration_secs().saturating_add(DURATION_STEP_SECS);
                self.typing.configure(secs);
            }
            (TypingState::Idle, KeyCode::Down) => {
                let secs = self
                    .typing
                    .duration_secs()
                    .saturating_sub(DURATION_STEP_SECS)
                    .max(DURATION_STEP_SECS);
                self.typing.configure(secs);
            }
            (TypingState::Running, KeyCode::Char(c)) => {
                let mut typed = self.typing.typed_text();
                typed.push(c);
                self.typing.apply_input(&typed);
            }
            (TypingState::Running, KeyCode::Backspace) => {
                let mut typed = self.typing.typed_text();
                if typed.pop().is_some() {
                    self.typing.apply_input(&typed);
                }
            }
            (TypingState::Finished, KeyCode::Enter) => self.typing.reset(),
            _ => {}
        }
    }

    fn cycle_difficulty(&mut self, forward: bool) {
        let tiers: Vec<Difficulty> = Difficulty::iter().collect();
        let current = tiers
            .iter()
            .position(|d| *d == self.typing.difficulty())
            .unwrap_or_default();
        let next = if forward {
            (current + 1) % tiers.len()
        } else {
            (current + tiers.len() - 1) % tiers.len()
        };
        self.typing.set_difficulty(tiers[next]);
    }

    fn arcade_key(&mut self, code: KeyCode) {
        match (self.arcade.state(), code) {
            (ArcadeState::Idle | ArcadeState::Over, KeyCode::Enter | KeyCode::Char(' ')) => {
                self.arcade.reset();
                self.arcade_input.clear();
                self.last_submit = None;
                self.arcade.start();
            }
            (ArcadeState::Running, KeyCode::Enter | KeyCode::Char(' ')) => {
                let outcome = self.arcade.submit(&self.arcade_input);
                self.arcade_input.clear();
                self.last_submit = Some(outcome);
            }
            (ArcadeState::Running, KeyCode::Char(c)) => {
                self.arcade_input.push(c);
                let outcome = self.arcade.try_match(&self.arcade_input);
                if matches!(outcome, SubmitOutcome::Matched { .. }) {
                    self.arcade_input.clear();
                    self.last_submit = Some(outcome);
                }
            }
            (ArcadeState::Running, KeyCode::Backspace) => {
                self.arcade_input.pop();
            }
            _ => {}
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let log_file = cli.log_file.clone().or_else(AppDirs::log_path);
    logging::init_logging(cli.verbose, log_file.as_deref())?;

    let store = FileConfigStore::new();
    let config = cli.apply_to(store.load());
    if cli.save {
        store.save(&config)?;
        tracing::info!(path = %store.path().display(), "preferences saved");
    }

    let sound = config.sound;
    let mut app = App::new(&config, cli.prompt.clone(), SystemClock::new(), || {
        Box::new(BellSink::new(io::stdout(), sound))
    })?;
    if cli.arcade {
        app.mode = Mode::Arcade;
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

    result
}

fn start_tui<B: Backend, C: Clock>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        ChannelEvents::crossterm(),
        Duration::from_millis(TICK_RATE_MS),
    );

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        if dispatch(app, runner.step()) == Flow::Quit {
            break;
        }
    }

    Ok(())
}

/// Timers that fell due while waiting fire before the event is handled.
fn dispatch<C: Clock>(app: &mut App<C>, event: AppEvent) -> Flow {
    app.run_due();
    let flow = match event {
        AppEvent::Key(key) => app.handle_key(key),
        AppEvent::Resize | AppEvent::Tick => Flow::Continue,
    };
    app.run_due();
    flow
}
