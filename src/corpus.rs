use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

static ASSETS: Dir = include_dir!("$CARGO_MANIFEST_DIR/assets");

const DEFAULT_CORPUS: &str = "words.json";

/// Default number of words sampled per session.
pub const DEFAULT_SAMPLE_SIZE: usize = 200;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read corpus {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corpus is not a word-to-length mapping: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("corpus contains no words")]
    Empty,
}

/// Pool of candidate words for typing sessions.
///
/// The on-disk shape is a mapping from word to its character length; only
/// the keys matter here. Keys are held sorted so a seeded sampler
/// reproduces the same pool run after run.
#[derive(Clone, Debug)]
pub struct Corpus {
    words: Vec<String>,
}

impl Corpus {
    /// The corpus bundled into the binary.
    pub fn embedded() -> Self {
        let file = ASSETS
            .get_file(DEFAULT_CORPUS)
            .expect("bundled corpus missing");
        let raw = file.contents_utf8().expect("bundled corpus is not utf-8");

        Self::from_json(raw).expect("bundled corpus is malformed")
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let raw = fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, LoadError> {
        let mapping: HashMap<String, u32> = serde_json::from_str(raw)?;
        if mapping.is_empty() {
            return Err(LoadError::Empty);
        }

        let mut words: Vec<String> = mapping.into_keys().collect();
        words.sort();

        Ok(Self { words })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Uniformly shuffled sample without replacement. A request larger
    /// than the corpus is clamped to the corpus size rather than failing.
    pub fn sample<R: Rng>(&self, n: usize, rng: &mut R) -> Vec<String> {
        let mut words = self.words.clone();
        words.shuffle(rng);
        words.truncate(n.min(words.len()));
        words
    }
}
