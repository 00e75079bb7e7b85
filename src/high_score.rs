use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub const HIGH_SCORE_FILE: &str = ".snekpilot_high_score.txt";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("high score store i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("high score file holds {0:?}, not a number")]
    Corrupt(String),
    #[error("high score store lock poisoned")]
    Poisoned,
}

/// Where the best score lives between runs.
pub trait HighScoreStore: Send {
    fn load(&mut self) -> Result<u32, StoreError>;
    fn save(&mut self, score: u32) -> Result<(), StoreError>;
}

/// Keeps the score as plain text in a single file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileStore {
    fn default() -> Self {
        FileStore::new(HIGH_SCORE_FILE)
    }
}

impl HighScoreStore for FileStore {
    fn load(&mut self) -> Result<u32, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let text = text.trim();
        if text.is_empty() {
            return Ok(0);
        }
        text.parse().map_err(|_| StoreError::Corrupt(text.to_string()))
    }

    fn save(&mut self, score: u32) -> Result<(), StoreError> {
        fs::write(&self.path, score.to_string())?;
        Ok(())
    }
}

/// An in-process store. Records every save so callers can see how often the
/// score was written.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    score: u32,
    saves: Vec<u32>,
}

impl MemoryStore {
    pub fn with_score(score: u32) -> Self {
        MemoryStore {
            score,
            saves: Vec::new(),
        }
    }

    pub fn saves(&self) -> &[u32] {
        &self.saves
    }
}

impl HighScoreStore for MemoryStore {
    fn load(&mut self) -> Result<u32, StoreError> {
        Ok(self.score)
    }

    fn save(&mut self, score: u32) -> Result<(), StoreError> {
        self.score = score;
        self.saves.push(score);
        Ok(())
    }
}

/// Lets the host keep a handle on a store the engine owns.
impl<S: HighScoreStore> HighScoreStore for Arc<Mutex<S>> {
    fn load(&mut self) -> Result<u32, StoreError> {
        self.lock().map_err(|_| StoreError::Poisoned)?.load()
    }

    fn save(&mut self, score: u32) -> Result<(), StoreError> {
        self.lock().map_err(|_| StoreError::Poisoned)?.save(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::process;

    fn scratch_path(tag: &str) -> PathBuf {
        env::temp_dir().join(format!("snekpilot-{}-{}.txt", tag, process::id()))
    }

    #[test]
    fn test_missing_file_reads_zero() {
        let path = scratch_path("missing");
        let _ = fs::remove_file(&path);
        assert_eq!(FileStore::new(&path).load().unwrap(), 0);
    }

    #[test]
    fn test_file_roundtrip() {
        let path = scratch_path("roundtrip");
        let mut store = FileStore::new(&path);
        store.save(42).unwrap();
        assert_eq!(store.load().unwrap(), 42);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_file() {
        let path = scratch_path("corrupt");
        fs::write(&path, "lots\n").unwrap();
        let err = FileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(ref s) if s == "lots"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_memory_store_counts_saves() {
        let mut store = MemoryStore::with_score(3);
        assert_eq!(store.load().unwrap(), 3);
        store.save(4).unwrap();
        store.save(5).unwrap();
        assert_eq!(store.saves(), &[4, 5]);
        assert_eq!(store.load().unwrap(), 5);
    }
}
