use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::persistence::{load_json_or_default, save_json_with_backup};

pub const INDEX_LABEL: &str = "quiz-index";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedQuestion {
    pub fingerprint: String,
    pub id: u64,
}

/// What the index remembers about one content file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Modification time in nanoseconds since the Unix epoch.
    pub mtime: i64,
    pub questions: Vec<IndexedQuestion>,
}

impl FileRecord {
    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.questions.iter().map(|entry| entry.id)
    }
}

/// Persistent mapping from content fingerprints to stable question ids.
///
/// `next_id` only ever grows, and an id handed to a fingerprint is never
/// handed to another one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentIndex {
    pub next_id: u64,
    pub files: BTreeMap<String, FileRecord>,
    pub fingerprint_to_id: BTreeMap<String, u64>,
    pub archived: BTreeSet<u64>,
}

impl Default for ContentIndex {
    fn default() -> Self {
        Self {
            next_id: 1,
            files: BTreeMap::new(),
            fingerprint_to_id: BTreeMap::new(),
            archived: BTreeSet::new(),
        }
    }
}

impl ContentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the index, raising `next_id` past every id it already holds.
    pub fn load(path: &Path) -> Self {
        let mut index: Self = load_json_or_default(path, INDEX_LABEL);
        index.repair_next_id();
        index
    }

    fn repair_next_id(&mut self) {
        let highest = self
            .fingerprint_to_id
            .values()
            .copied()
            .chain(self.live_ids())
            .chain(self.archived.iter().copied())
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(highest.saturating_add(1));
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json_with_backup(path, self, INDEX_LABEL)
    }

    /// Id for a fingerprint, allocating the next one if it has never been seen.
    pub fn resolve_id(&mut self, fingerprint: &str) -> u64 {
        if let Some(id) = self.fingerprint_to_id.get(fingerprint) {
            return *id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.fingerprint_to_id.insert(fingerprint.to_string(), id);
        id
    }

    pub fn archive<I: IntoIterator<Item = u64>>(&mut self, ids: I) -> Vec<u64> {
        ids.into_iter().filter(|id| self.archived.insert(*id)).collect()
    }

    pub fn is_archived(&self, id: u64) -> bool {
        self.archived.contains(&id)
    }

    /// Ids recorded for any file currently in the index.
    pub fn live_ids(&self) -> BTreeSet<u64> {
        self.files.values().flat_map(|record| record.ids()).collect()
    }
}
