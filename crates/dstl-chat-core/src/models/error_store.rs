use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorLevel {
    Warning,
    Error,
}

#[derive(Clone, Debug)]
pub struct ErrorEntry {
    pub timestamp: DateTime<Local>,
    pub level: ErrorLevel,
    pub message: String,
    pub target: String,
    pub fields: BTreeMap<String, String>,
}

/// Bounded log of warnings and errors shown in the error overlay.
///
/// Cloning yields a handle to the same log, so the tracing layer and the UI
/// can share one instance.
#[derive(Clone)]
pub struct ErrorStore {
    entries: Arc<Mutex<VecDeque<ErrorEntry>>>,
    max_entries: usize,
}

impl ErrorStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(max_entries))),
            max_entries: max_entries.max(1),
        }
    }

    pub fn add_entry(&self, entry: ErrorEntry) {
        let mut entries = self.entries.lock();
        entries.push_back(entry);

        // FIFO eviction when exceeding max
        while entries.len() > self.max_entries {
            entries.pop_front();
        }
    }

    pub fn get_all_entries(&self) -> Vec<ErrorEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn error_count(&self) -> usize {
        self.count_level(ErrorLevel::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count_level(ErrorLevel::Warning)
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn count_level(&self, level: ErrorLevel) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.level == level)
            .count()
    }
}

impl Default for ErrorStore {
    fn default() -> Self {
        Self::new(200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: ErrorLevel, message: &str) -> ErrorEntry {
        ErrorEntry {
            timestamp: Local::now(),
            level,
            message: message.to_string(),
            target: "test".to_string(),
            fields: BTreeMap::new(),
        }
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let store = ErrorStore::new(2);
        store.add_entry(entry(ErrorLevel::Error, "one"));
        store.add_entry(entry(ErrorLevel::Warning, "two"));
        store.add_entry(entry(ErrorLevel::Error, "three"));

        let messages: Vec<_> = store
            .get_all_entries()
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(messages, vec!["two", "three"]);
        assert_eq!(store.error_count(), 1);
        assert_eq!(store.warning_count(), 1);
    }

    #[test]
    fn test_clones_share_entries() {
        let store = ErrorStore::new(10);
        let handle = store.clone();
        handle.add_entry(entry(ErrorLevel::Error, "shared"));
        assert_eq!(store.error_count(), 1);

        store.clear();
        assert!(handle.get_all_entries().is_empty());
    }
}
