use chrono::{DateTime, Utc};
use serde::Serialize;

/// HistoryEntry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub full_path: String,
    pub name: Option<String>,
    pub visited_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(full_path: &str, name: Option<&str>) -> Self {
        Self {
            full_path: full_path.to_string(),
            name: name.map(str::to_string),
            visited_at: Utc::now(),
        }
    }
}

/// History
///
/// In-memory session history with a cursor, behaving like the browser's: a push
/// after going back discards the forward entries.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
    cursor: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
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

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.cursor.map(|cursor| &self.entries[cursor])
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        let keep = self.cursor.map_or(0, |cursor| cursor + 1);
        self.entries.truncate(keep);
        self.entries.push(entry);
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Overwrites the current entry, or pushes when the history is empty.
    pub fn replace(&mut self, entry: HistoryEntry) {
        match self.cursor {
            Some(cursor) => self.entries[cursor] = entry,
            None => self.push(entry),
        }
    }

    /// The entry `delta` steps away from the cursor, if any.
    pub fn peek(&self, delta: isize) -> Option<&HistoryEntry> {
        let target = self.cursor?.checked_add_signed(delta)?;
        self.entries.get(target)
    }

    /// Moves the cursor by `delta`. Returns false, without moving, when out of range.
    pub fn go(&mut self, delta: isize) -> bool {
        if self.peek(delta).is_none() {
            return false;
        }
        self.cursor = self.cursor.and_then(|cursor| cursor.checked_add_signed(delta));
        true
    }
}
