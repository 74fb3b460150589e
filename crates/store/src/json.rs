//! JSON file store: `{"tetris": 1200, ...}`

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::BestScoreStore;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct BestScores(BTreeMap<String, u32>);

/// Best scores cached in memory and written through to a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    scores: BestScores,
}

impl JsonFileStore {
    /// Load scores from `path`.
    ///
    /// A missing file is an empty store; an unreadable or malformed one is an
    /// error so the caller can decide whether to fall back.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let scores = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)
                .with_context(|| format!("parse best scores from {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BestScores::default(),
            Err(e) => {
                return Err(e).with_context(|| format!("read best scores from {}", path.display()))
            }
        };
        debug!(path = %path.display(), entries = scores.0.len(), "best scores loaded");
        Ok(Self { path, scores })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("create {}", dir.display()))?;
            }
        }
        let text = serde_json::to_string_pretty(&self.scores)?;
        // Write a sibling file, then rename it over the target.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace {}", self.path.display()))?;
        Ok(())
    }
}

impl BestScoreStore for JsonFileStore {
    fn best_score(&self, key: &str) -> u32 {
        self.scores.0.get(key).copied().unwrap_or(0)
    }

    fn set_best_score(&mut self, key: &str, score: u32) {
        self.scores.0.insert(key.to_string(), score);
        if let Err(e) = self.persist() {
            warn!(error = ?e, key, score, "failed to save best score");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir()
            .join(format!("arcade-tetris-{}-{nanos}", std::process::id()))
            .join(format!("{name}.json"))
    }

    #[test]
    fn test_missing_file_is_empty() {
        let store = JsonFileStore::open(scratch_path("missing")).unwrap();
        assert_eq!(store.best_score("tetris"), 0);
    }

    #[test]
    fn test_scores_survive_reopen() {
        let path = scratch_path("reopen");
        let mut store = JsonFileStore::open(&path).unwrap();
        store.set_best_score("tetris", 3400);
        store.set_best_score("fruit", 12);

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.best_score("tetris"), 3400);
        assert_eq!(reopened.best_score("fruit"), 12);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["tetris"], 3400);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let path = scratch_path("malformed");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();
        assert!(JsonFileStore::open(&path).is_err());
    }

    #[test]
    fn test_write_failure_keeps_cached_value() {
        // A directory where the file should be makes every write fail.
        let path = scratch_path("blocked");
        fs::create_dir_all(&path).unwrap();
        let mut store = JsonFileStore {
            path: path.clone(),
            scores: BestScores::default(),
        };
        store.set_best_score("tetris", 900);
        assert_eq!(store.best_score("tetris"), 900);
    }
}
