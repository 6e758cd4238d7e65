//! Recent lookups, newest first

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifier::Identifier;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid history file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub doi: Identifier,
    pub title: String,
    pub date: NaiveDate,
}

/// Bounded list of recent lookups, deduplicated by identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    max_entries: usize,
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            entries: Vec::new(),
        }
    }

    /// Put a lookup at the top, replacing any earlier entry for the same
    /// identifier and dropping the oldest past the limit.
    pub fn record(&mut self, doi: Identifier, title: impl Into<String>, date: NaiveDate) {
        self.entries.retain(|entry| entry.doi != doi);
        self.entries.insert(
            0,
            HistoryEntry {
                doi,
                title: title.into(),
                date,
            },
        );
        self.entries.truncate(self.max_entries);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Read a history file; a missing file is an empty history.
    pub fn load(path: &Path, max_entries: usize) -> Result<Self, HistoryError> {
        let mut history = Self::new(max_entries);
        if !path.exists() {
            return Ok(history);
        }
        let contents = std::fs::read_to_string(path)?;
        let mut entries: Vec<HistoryEntry> = serde_json::from_str(&contents)?;
        entries.truncate(history.max_entries);
        history.entries = entries;
        Ok(history)
    }

    pub fn save(&self, path: &Path) -> Result<(), HistoryError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doi(raw: &str) -> Identifier {
        Identifier::doi(raw).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_newest_first_and_bounded() {
        let mut history = History::new(3);
        for i in 1..=4 {
            history.record(doi(&format!("10.1/{}", i)), format!("Paper {}", i), day(i));
        }
        let dois: Vec<&str> = history.entries().iter().map(|e| e.doi.as_str()).collect();
        assert_eq!(dois, vec!["10.1/4", "10.1/3", "10.1/2"]);
    }

    #[test]
    fn test_duplicate_moves_to_top() {
        let mut history = History::new(10);
        history.record(doi("10.1/a"), "A", day(1));
        history.record(doi("10.1/b"), "B", day(2));
        history.record(doi("10.1/a"), "A again", day(3));
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[0].title, "A again");
        assert_eq!(history.entries()[1].doi.as_str(), "10.1/b");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");
        let mut history = History::new(10);
        history.record(doi("10.1/a"), "A", day(1));
        history.save(&path).unwrap();

        let loaded = History::load(&path, 10).unwrap();
        assert_eq!(loaded, history);
    }

    #[test]
    fn test_load_missing_and_truncates() {
        let dir = tempfile::tempdir().unwrap();
        assert!(History::load(&dir.path().join("none.json"), 10)
            .unwrap()
            .is_empty());

        let path = dir.path().join("history.json");
        let mut history = History::new(10);
        history.record(doi("10.1/a"), "A", day(1));
        history.record(doi("10.1/b"), "B", day(2));
        history.save(&path).unwrap();
        assert_eq!(History::load(&path, 1).unwrap().len(), 1);
    }
}
