//! Best-score persistence.
//!
//! One integer per game key. The engine only sees the [`BestScoreStore`]
//! trait; the binary picks the JSON file store or keeps scores in memory.

mod json;

use std::collections::HashMap;

pub use json::JsonFileStore;

/// Persistent best score per game key.
///
/// Implementations never fail from the caller's point of view: a missing
/// entry reads as 0 and a failed write is reported through logging only.
pub trait BestScoreStore: Send {
    /// Stored best for `key`, 0 when absent
    fn best_score(&self, key: &str) -> u32;

    fn set_best_score(&mut self, key: &str, score: u32);
}

impl<S: BestScoreStore + ?Sized> BestScoreStore for Box<S> {
    fn best_score(&self, key: &str) -> u32 {
        (**self).best_score(key)
    }

    fn set_best_score(&mut self, key: &str, score: u32) {
        (**self).set_best_score(key, score)
    }
}

/// Scores kept for the lifetime of the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    scores: HashMap<String, u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BestScoreStore for MemoryStore {
    fn best_score(&self, key: &str) -> u32 {
        self.scores.get(key).copied().unwrap_or(0)
    }

    fn set_best_score(&mut self, key: &str, score: u32) {
        self.scores.insert(key.to_string(), score);
    }
}

/// Remembers nothing; every read is 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

impl BestScoreStore for NoopStore {
    fn best_score(&self, _key: &str) -> u32 {
        0
    }

    fn set_best_score(&mut self, _key: &str, _score: u32) {}
}
