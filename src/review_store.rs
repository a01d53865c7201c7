use anyhow::Result;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::log_store_operation;
use crate::models::ReviewState;
use crate::persistence::{load_json_or_default, save_json_with_backup};

pub const PERFORMANCE_LABEL: &str = "performance";

/// Review state for every question id that has been presented, backed by a
/// JSON file keyed by id.
#[derive(Debug, Clone)]
pub struct ReviewStore {
    path: PathBuf,
    states: BTreeMap<u64, ReviewState>,
}

impl ReviewStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let states = load_json_or_default(&path, PERFORMANCE_LABEL);
        Self { path, states }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, id: u64) -> Option<&ReviewState> {
        self.states.get(&id)
    }

    /// Existing state, or a fresh one due today. Does not insert.
    pub fn state_or_init(&self, id: u64, today: NaiveDate) -> ReviewState {
        self.states
            .get(&id)
            .cloned()
            .unwrap_or_else(|| ReviewState::new(today))
    }

    pub fn record(&mut self, id: u64, state: ReviewState) {
        self.states.insert(id, state);
    }

    pub fn save(&self) -> Result<()> {
        save_json_with_backup(&self.path, &self.states, PERFORMANCE_LABEL)
    }

    /// Forget every review state and persist the empty store.
    pub fn reset(&mut self) -> Result<()> {
        let cleared = self.states.len();
        self.states.clear();
        self.save()?;
        log_store_operation!(
            info,
            "reset",
            store = PERFORMANCE_LABEL,
            format!("cleared {} review states", cleared)
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &BTreeMap<u64, ReviewState> {
        &self.states
    }
}
