// End-to-end drives of the typing-session engine over the library
// surface: corpus -> sampling -> chunking -> state machine -> store.

use std::time::{Duration, Instant};

use klava::chunker::chunk_lines;
use klava::corpus::Corpus;
use klava::engine::{Action, SessionState, Trainer, TrainerConfig};
use klava::store::{Record, ResultStore};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

const FIVE_WORDS: &str = r#"{"привет":6,"мир":3,"кот":3,"дом":3,"сон":3}"#;

fn start(trainer: &mut Trainer, now: Instant) {
    trainer.handle_action(Action::StartTyping, now);
    trainer.handle_action(Action::ConfirmStart, now);
}

fn type_current_line(trainer: &mut Trainer) {
    let line = trainer.current_line().unwrap().to_string();
    for c in line.chars() {
        trainer.on_input(&c.to_string());
    }
}

#[test]
fn undersized_corpus_yields_one_chunk_of_all_five_words() {
    // The default 200-word sample is clamped to the corpus size.
    let corpus = Corpus::from_json(FIVE_WORDS).unwrap();
    let mut rng = StdRng::seed_from_u64(3);

    let pool = corpus.sample(200, &mut rng);
    let lines = chunk_lines(&pool);

    assert_eq!(pool.len(), 5);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with(' '));

    let mut words: Vec<&str> = lines[0].split(' ').filter(|w| !w.is_empty()).collect();
    words.sort_unstable();
    assert_eq!(words, vec!["дом", "кот", "мир", "привет", "сон"]);
}

#[test]
fn full_session_types_through_and_persists() {
    let dir = tempdir().unwrap();
    let best_path = dir.path().join("best_result.json");
    let store = ResultStore::with_path(&best_path);
    let corpus = Corpus::from_json(FIVE_WORDS).unwrap();
    let config = TrainerConfig {
        sample_size: 5,
        seed: Some(9),
        ..TrainerConfig::default()
    };
    let mut trainer = Trainer::new(corpus, store, config);

    start(&mut trainer, Instant::now());
    assert_eq!(trainer.state(), SessionState::Active);

    while trainer.state() == SessionState::Active {
        type_current_line(&mut trainer);
    }

    assert_eq!(trainer.state(), SessionState::Finished);
    let result = trainer.result().unwrap();
    assert_eq!(result.accuracy, 100.0);
    // "привет мир кот дом сон " in some order: 23 keystrokes, all correct
    assert_eq!(result.typing_speed, 23);
    assert!(best_path.exists());
    assert_eq!(trainer.best().unwrap(), result);
}

#[test]
fn mismatch_then_repeat_advances_cursor_by_two() {
    let dir = tempdir().unwrap();
    let store = ResultStore::with_path(dir.path().join("best_result.json"));
    let corpus = Corpus::from_json(FIVE_WORDS).unwrap();
    let config = TrainerConfig {
        sample_size: 5,
        seed: Some(9),
        ..TrainerConfig::default()
    };
    let mut trainer = Trainer::new(corpus, store, config);
    start(&mut trainer, Instant::now());

    let line: Vec<char> = trainer.current_line().unwrap().chars().collect();

    trainer.on_input(&line[0].to_string());
    trainer.on_input("ъ"); // not in the corpus
    trainer.on_input(&line[1].to_string());

    assert_eq!(trainer.counter().attempted(), 3);
    assert_eq!(trainer.counter().correct(), 2);
    assert_eq!(trainer.cursor(), 2);
}

#[test]
fn sixty_second_budget_expires_at_sixty_one() {
    let dir = tempdir().unwrap();
    let store = ResultStore::with_path(dir.path().join("best_result.json"));
    let corpus = Corpus::from_json(FIVE_WORDS).unwrap();
    let config = TrainerConfig {
        sample_size: 5,
        seed: Some(9),
        ..TrainerConfig::default()
    };
    let mut trainer = Trainer::new(corpus, store, config);
    let t0 = Instant::now();
    start(&mut trainer, t0);

    trainer.on_tick(t0 + Duration::from_secs(61));

    assert_eq!(trainer.state(), SessionState::Finished);
    assert_eq!(trainer.remaining_formatted(), "00:00");
}

#[test]
fn best_result_policy_fifty_ninety_beats_forty_ninety_five() {
    let dir = tempdir().unwrap();
    let store = ResultStore::with_path(dir.path().join("best_result.json"));

    let first = Record {
        typing_speed: 50,
        accuracy: 90.0,
        timestamp: "2026-08-05 10:00:00".into(),
    };
    let second = Record {
        typing_speed: 40,
        accuracy: 95.0,
        timestamp: "2026-08-05 11:00:00".into(),
    };

    assert!(store.save_if_better(&first).unwrap());
    // score 38 < 45: the stored record survives
    assert!(!store.save_if_better(&second).unwrap());
    assert_eq!(store.load_best().unwrap(), first);
}

#[test]
fn abandoned_session_persists_nothing() {
    let dir = tempdir().unwrap();
    let best_path = dir.path().join("best_result.json");
    let store = ResultStore::with_path(&best_path);
    let corpus = Corpus::from_json(FIVE_WORDS).unwrap();
    let config = TrainerConfig {
        sample_size: 5,
        seed: Some(9),
        ..TrainerConfig::default()
    };
    let mut trainer = Trainer::new(corpus, store, config);
    start(&mut trainer, Instant::now());
    type_current_line(&mut trainer);

    trainer.handle_action(Action::Cancel, Instant::now());

    assert_eq!(trainer.state(), SessionState::Menu);
    assert!(trainer.result().is_none());
    assert!(!best_path.exists());
}

#[test]
fn history_log_accumulates_one_row_per_session() {
    let dir = tempdir().unwrap();
    let history_path = dir.path().join("history.csv");
    let store = ResultStore::with_path(dir.path().join("best_result.json"))
        .history(&history_path);
    let corpus = Corpus::from_json(r#"{"аб":2}"#).unwrap();
    let config = TrainerConfig {
        sample_size: 1,
        seed: Some(1),
        ..TrainerConfig::default()
    };
    let mut trainer = Trainer::new(corpus, store, config);

    for _ in 0..2 {
        start(&mut trainer, Instant::now());
        type_current_line(&mut trainer);
        assert_eq!(trainer.state(), SessionState::Finished);
        trainer.handle_action(Action::ReturnToMenu, Instant::now());
    }

    let raw = std::fs::read_to_string(&history_path).unwrap();
    let lines: Vec<&str> = raw.lines().collect();
    assert_eq!(lines.len(), 3); // header + two sessions
    assert_eq!(lines[0], "date,typing_speed,accuracy,score");
}
