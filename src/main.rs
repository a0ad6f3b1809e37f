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
    path::PathBuf,
    time::{Duration, Instant},
};

use klava::config::{Config, ConfigStore, FileConfigStore};
use klava::corpus::Corpus;
use klava::engine::{Action, SessionState, Trainer, TrainerConfig};
use klava::runtime::{CrosstermEventSource, FixedTicker, Runner, TrainerEvent};
use klava::store::ResultStore;

const TICK_RATE_MS: u64 = 100;

/// terminal typing-speed trainer
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing-speed trainer: 60 seconds on the clock, randomly sampled words, live accuracy, and a persisted best result to beat."
)]
pub struct Cli {
    /// number of seconds per session
    #[clap(short = 's', long)]
    number_of_secs: Option<u64>,

    /// number of words sampled per session
    #[clap(short = 'w', long)]
    number_of_words: Option<usize>,

    /// word corpus to pull from (JSON mapping of word to character length)
    #[clap(short = 'c', long)]
    corpus: Option<PathBuf>,

    /// seed for reproducible word sampling
    #[clap(long)]
    seed: Option<u64>,
}

impl Cli {
    /// Flags win over the persisted config, which wins over defaults.
    fn resolve(&self, defaults: Config) -> Config {
        Config {
            number_of_secs: self.number_of_secs.unwrap_or(defaults.number_of_secs),
            number_of_words: self.number_of_words.unwrap_or(defaults.number_of_words),
            corpus_path: self.corpus.clone().or(defaults.corpus_path),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = FileConfigStore::new();
    let config = cli.resolve(config_store.load());

    // A bad corpus is fatal and must surface before the terminal is
    // switched to the alternate screen.
    let corpus = match &config.corpus_path {
        Some(path) => Corpus::from_path(path)?,
        None => Corpus::embedded(),
    };

    if let Err(err) = config_store.save(&config) {
        log::warn!("could not persist config: {err}");
    }

    let trainer_config = TrainerConfig {
        duration: Duration::from_secs(config.number_of_secs),
        sample_size: config.number_of_words,
        seed: cli.seed,
        ..TrainerConfig::default()
    };
    let mut trainer = Trainer::new(corpus, ResultStore::new(), trainer_config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run(&mut terminal, &mut trainer);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    trainer: &mut Trainer,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| f.render_widget(&*trainer, f.area()))?;

        match runner.step() {
            TrainerEvent::Tick => trainer.on_tick(Instant::now()),
            TrainerEvent::Resize => {}
            TrainerEvent::Key(key) => {
                if is_quit(trainer, &key) {
                    break;
                }
                dispatch_key(trainer, &key);
            }
        }
    }

    Ok(())
}

// Esc from the menu or ctrl-c anywhere leaves the app.
fn is_quit(trainer: &Trainer, key: &KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }
    trainer.state() == SessionState::Menu && key.code == KeyCode::Esc
}

fn dispatch_key(trainer: &mut Trainer, key: &KeyEvent) {
    let now = Instant::now();

    match (trainer.state(), key.code) {
        (SessionState::Menu, KeyCode::Enter) => trainer.handle_action(Action::StartTyping, now),
        (SessionState::AwaitingStart, KeyCode::Enter) => {
            trainer.handle_action(Action::ConfirmStart, now)
        }
        (SessionState::AwaitingStart, KeyCode::Esc) => trainer.handle_action(Action::Cancel, now),
        (SessionState::Active, KeyCode::Esc) => trainer.handle_action(Action::Cancel, now),
        (SessionState::Active, KeyCode::Char(c)) => trainer.on_input(&c.to_string()),
        (SessionState::Finished, KeyCode::Enter) => {
            trainer.handle_action(Action::ReturnToMenu, now)
        }
        _ => {}
    }
}
