use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::accuracy::AccuracyCounter;
use crate::chunker::chunk_lines;
use crate::clock::SessionClock;
use crate::corpus::{Corpus, DEFAULT_SAMPLE_SIZE};
use crate::store::{Record, ResultStore};

/// Screens of the trainer; exactly one is current at any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum SessionState {
    Menu,
    AwaitingStart,
    Active,
    Finished,
}

/// Discrete UI actions forwarded by the shell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    StartTyping,
    ConfirmStart,
    Cancel,
    ReturnToMenu,
}

#[derive(Clone, Debug)]
pub struct TrainerConfig {
    pub duration: Duration,
    pub sample_size: usize,
    pub visible_lines: usize,
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(60),
            sample_size: DEFAULT_SAMPLE_SIZE,
            visible_lines: 3,
            seed: None,
        }
    }
}

/// The typing-session state machine.
///
/// Owns the countdown clock, the keystroke tally, the chunked target
/// lines and the cursor for the lifetime of a session, and exposes
/// read-only snapshots for the rendering shell. All cursor arithmetic is
/// at Unicode-codepoint granularity so Cyrillic text behaves like ASCII.
#[derive(Debug)]
pub struct Trainer {
    state: SessionState,
    corpus: Corpus,
    store: ResultStore,
    config: TrainerConfig,
    rng: StdRng,

    lines: Vec<String>,
    line_offset: usize,
    cursor: usize,
    typed: String,
    correct_prefix: String,
    counter: AccuracyCounter,
    clock: SessionClock,
    result: Option<Record>,
    best: Option<Record>,
}

impl Trainer {
    pub fn new(corpus: Corpus, store: ResultStore, config: TrainerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let best = match store.load_best() {
            Ok(record) if !record.is_absent() => Some(record),
            Ok(_) => None,
            Err(err) => {
                log::warn!("could not load best result: {err}");
                None
            }
        };

        let clock = SessionClock::new(config.duration);
        Self {
            state: SessionState::Menu,
            corpus,
            store,
            config,
            rng,
            lines: Vec::new(),
            line_offset: 0,
            cursor: 0,
            typed: String::new(),
            correct_prefix: String::new(),
            counter: AccuracyCounter::default(),
            clock,
            result: None,
            best,
        }
    }

    pub fn handle_action(&mut self, action: Action, now: Instant) {
        match (self.state, action) {
            (SessionState::Menu, Action::StartTyping) => {
                self.typed.clear();
                self.state = SessionState::AwaitingStart;
            }
            (SessionState::AwaitingStart, Action::ConfirmStart) => self.start_session(now),
            (SessionState::AwaitingStart, Action::Cancel) => self.state = SessionState::Menu,
            (SessionState::Active, Action::Cancel) => self.abandon(),
            (SessionState::Finished, Action::ReturnToMenu) => self.state = SessionState::Menu,
            _ => log::debug!("ignoring {action:?} in state {}", self.state),
        }
    }

    /// Feeds one input event while Active. Only the first codepoint of
    /// the batch is matched against the target; the remainder is dropped,
    /// though the whole batch is echoed to the typed-text snapshot.
    pub fn on_input(&mut self, batch: &str) {
        if self.state != SessionState::Active {
            return;
        }
        let Some(c) = batch.chars().next() else {
            return;
        };

        let Some(line) = self.lines.get(self.line_offset).cloned() else {
            // target text exhausted, nothing left to match
            self.finish();
            return;
        };

        self.typed = batch.to_string();

        if let Some(expected) = line.chars().nth(self.cursor) {
            if c == expected {
                self.counter.record(true);
                self.correct_prefix.push(expected);
                self.cursor += 1;
            } else {
                self.counter.record(false);
            }
        }

        if self.cursor >= line.chars().count() {
            self.correct_prefix.clear();
            self.line_offset += 1;
            self.cursor = 0;

            if self.line_offset >= self.lines.len() {
                self.finish();
            }
        }
    }

    /// Advances the session clock; on expiry the session finishes
    /// immediately, whatever input is still queued this frame.
    pub fn on_tick(&mut self, now: Instant) {
        if self.state != SessionState::Active {
            return;
        }

        self.clock.tick(now);
        if self.clock.is_finished() {
            self.finish();
        }
    }

    fn start_session(&mut self, now: Instant) {
        let pool = self.corpus.sample(self.config.sample_size, &mut self.rng);
        self.lines = chunk_lines(&pool);
        self.line_offset = 0;
        self.cursor = 0;
        self.typed.clear();
        self.correct_prefix.clear();
        self.counter = AccuracyCounter::default();
        self.result = None;
        self.clock = SessionClock::new(self.config.duration);
        self.clock.start(now);
        self.state = SessionState::Active;
    }

    // Abandoned sessions are discarded: no record, no persistence.
    fn abandon(&mut self) {
        self.clock.stop();
        self.state = SessionState::Menu;
    }

    fn finish(&mut self) {
        if self.state == SessionState::Finished {
            return;
        }

        self.clock.stop();
        let record = Record::new(self.counter.correct(), self.counter.percent());

        match self.store.save_if_better(&record) {
            Ok(true) => log::info!("new best result: {:.2} points", record.score()),
            Ok(false) => {}
            Err(err) => log::warn!("could not persist best result: {err}"),
        }
        if let Err(err) = self.store.append_history(&record) {
            log::warn!("could not append session history: {err}");
        }

        self.best = match self.store.load_best() {
            Ok(best) if !best.is_absent() => Some(best),
            _ => None,
        };
        self.result = Some(record);
        self.state = SessionState::Finished;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The next up-to-`visible_lines` target lines, current line first.
    pub fn visible_lines(&self) -> &[String] {
        let start = self.line_offset.min(self.lines.len());
        let end = (self.line_offset + self.config.visible_lines).min(self.lines.len());
        &self.lines[start..end]
    }

    pub fn current_line(&self) -> Option<&str> {
        self.lines.get(self.line_offset).map(String::as_str)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    pub fn correct_prefix(&self) -> &str {
        &self.correct_prefix
    }

    pub fn counter(&self) -> &AccuracyCounter {
        &self.counter
    }

    pub fn remaining_formatted(&self) -> String {
        self.clock.remaining_formatted()
    }

    pub fn duration(&self) -> Duration {
        self.config.duration
    }

    pub fn result(&self) -> Option<&Record> {
        self.result.as_ref()
    }

    pub fn best(&self) -> Option<&Record> {
        self.best.as_ref()
    }
}
