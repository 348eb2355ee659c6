use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::persistence::{read_optional, write_pretty_json, SaveOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Local wall-clock time of the search, `HH:MM`.
    pub timestamp: String,
    /// Label of the destination the query was sent to.
    pub engine: String,
    pub query: String,
}

impl HistoryEntry {
    pub fn new(timestamp: &str, engine: &str, query: &str) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            engine: engine.to_string(),
            query: query.to_string(),
        }
    }

    pub fn display_line(&self) -> String {
        format!("[{}] {}: {}", self.timestamp, self.engine, self.query)
    }
}

/// Older history files stored each entry as a `[timestamp, engine, query]`
/// triple.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Record(HistoryEntry),
    Triple(String, String, String),
}

impl From<StoredEntry> for HistoryEntry {
    fn from(value: StoredEntry) -> Self {
        match value {
            StoredEntry::Record(entry) => entry,
            StoredEntry::Triple(timestamp, engine, query) => Self {
                timestamp,
                engine,
                query,
            },
        }
    }
}

/// Append-ordered search log, oldest first, bounded by `limit`.
pub struct HistoryStore {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
    limit: usize,
}

impl HistoryStore {
    /// Loads the log at `path`. Missing or unparsable files give an empty
    /// log; individual malformed entries are skipped.
    pub fn load(path: impl Into<PathBuf>, limit: usize) -> Self {
        let path = path.into();
        let mut entries = load_entries(&path);
        truncate_oldest(&mut entries, limit);
        Self {
            path,
            entries,
            limit,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first, as stored.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }

    /// 1-based position in the newest-first view.
    pub fn nth_newest(&self, position: usize) -> Option<&HistoryEntry> {
        if position == 0 {
            return None;
        }
        self.newest_first().nth(position - 1)
    }

    pub fn append(&mut self, entry: HistoryEntry) -> SaveOutcome {
        self.entries.push(entry);
        truncate_oldest(&mut self.entries, self.limit);
        self.persist()
    }

    pub fn clear(&mut self) -> SaveOutcome {
        self.entries.clear();
        self.persist()
    }

    /// Applies a new cap right away, dropping the oldest entries if needed.
    pub fn set_limit(&mut self, limit: usize) -> SaveOutcome {
        self.limit = limit;
        if self.entries.len() <= limit {
            return SaveOutcome::Saved;
        }
        truncate_oldest(&mut self.entries, limit);
        self.persist()
    }

    fn persist(&self) -> SaveOutcome {
        write_pretty_json(&self.path, "history", &self.entries).into()
    }
}

fn truncate_oldest(entries: &mut Vec<HistoryEntry>, limit: usize) {
    if entries.len() > limit {
        let excess = entries.len() - limit;
        entries.drain(..excess);
    }
}

fn load_entries(path: &Path) -> Vec<HistoryEntry> {
    let Some(raw) = read_optional(path) else {
        return Vec::new();
    };

    let items = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            tracing::warn!(path = %path.display(), "history file is not a list; starting empty");
            return Vec::new();
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "history file is corrupt; starting empty");
            return Vec::new();
        }
    };

    let total = items.len();
    let entries: Vec<HistoryEntry> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<StoredEntry>(item).ok())
        .map(HistoryEntry::from)
        .collect();
    if entries.len() < total {
        tracing::warn!(
            skipped = total - entries.len(),
            "dropped malformed history entries"
        );
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::{truncate_oldest, HistoryEntry};

    fn entry(query: &str) -> HistoryEntry {
        HistoryEntry::new("10:00", "Google", query)
    }

    #[test]
    fn truncation_drops_from_the_oldest_end() {
        let mut entries = vec![entry("a"), entry("b"), entry("c"), entry("d")];
        truncate_oldest(&mut entries, 2);
        let queries: Vec<&str> = entries.iter().map(|e| e.query.as_str()).collect();
        assert_eq!(queries, vec!["c", "d"]);
    }

    #[test]
    fn zero_limit_keeps_nothing() {
        let mut entries = vec![entry("a")];
        truncate_oldest(&mut entries, 0);
        assert!(entries.is_empty());
    }

    #[test]
    fn display_line_matches_history_view() {
        assert_eq!(
            HistoryEntry::new("09:41", "YouTube", "lofi").display_line(),
            "[09:41] YouTube: lofi"
        );
    }
}
