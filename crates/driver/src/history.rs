//! Append-only record of routing decisions for one session.

use crate::Status;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One routing decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Position in the session history, starting at 0.
    pub sequence: usize,
    pub status_text: String,
    /// Route id the request asked for.
    pub requested_id: Option<String>,
    /// Resource of the requested id, if the id is known.
    pub requested_resource: Option<String>,
    /// Resource actually served.
    pub resolved_path: String,
    /// Script or module that issued the request.
    pub request_source: String,
    pub requires_auth: bool,
    pub is_authenticated: bool,
    pub status_code: u8,
    pub time_seconds: i64,
    pub time_text: String,
}

impl HistoryEntry {
    pub fn status(&self) -> Option<Status> {
        Status::from_code(self.status_code)
    }
}

/// Ordered session history.
///
/// Entries are only ever appended; the whole history is dropped on logout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, assigning the next sequence number.
    ///
    /// Returns the stored entry.
    pub fn append(&mut self, mut entry: HistoryEntry) -> &HistoryEntry {
        entry.sequence = self.entries.len();
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// The most recent entry.
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries per status.
    pub fn tally(&self) -> BTreeMap<Status, usize> {
        let mut tally = BTreeMap::new();
        for status in self.entries.iter().filter_map(HistoryEntry::status) {
            *tally.entry(status).or_insert(0) += 1;
        }
        tally
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a HistoryEntry;
    type IntoIter = std::slice::Iter<'a, HistoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
