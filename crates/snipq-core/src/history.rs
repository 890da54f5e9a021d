use crate::config::Settings;
use crate::models::Snippet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, TryLockError};
use tracing::{debug, warn};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub snippet_id: String,
    pub timestamp: DateTime<Utc>,
    pub output_len: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
}

/// Fixed slots with a rotating write cursor; the oldest entry is overwritten.
#[derive(Debug, Default)]
struct Ring {
    slots: Vec<Option<HistoryEntry>>,
    next: usize,
    len: usize,
}

impl Ring {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            next: 0,
            len: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn push(&mut self, entry: HistoryEntry) {
        let capacity = self.capacity();
        if capacity == 0 {
            return;
        }
        self.slots[self.next] = Some(entry);
        self.next = (self.next + 1) % capacity;
        self.len = (self.len + 1).min(capacity);
    }

    /// Oldest first
    fn entries(&self) -> Vec<HistoryEntry> {
        let capacity = self.capacity();
        if capacity == 0 {
            return Vec::new();
        }
        let start = (self.next + capacity - self.len) % capacity;
        (0..self.len)
            .filter_map(|i| self.slots[(start + i) % capacity].clone())
            .collect()
    }

    /// Change capacity, keeping the newest entries
    fn resize(&mut self, capacity: usize) {
        let entries = self.entries();
        let keep = entries.len().saturating_sub(capacity);
        *self = Ring::with_capacity(capacity);
        for entry in entries.into_iter().skip(keep) {
            self.push(entry);
        }
    }
}

/// Best-effort record of successful expansions.
///
/// Recording never blocks: if another writer holds the ring the entry is
/// dropped.
#[derive(Debug, Default)]
pub struct HistoryRecorder {
    ring: Mutex<Ring>,
}

impl HistoryRecorder {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Mutex::new(Ring::with_capacity(capacity)),
        }
    }

    /// Record an expansion if settings and snippet tags allow it.
    /// Returns whether the entry was stored.
    pub fn record(
        &self,
        snippet: &Snippet,
        output: &str,
        app_id: Option<&str>,
        timestamp: DateTime<Utc>,
        settings: &Settings,
    ) -> bool {
        if !settings.history_enabled || settings.history_limit == 0 {
            return false;
        }
        if settings.pin_for_sensitive && snippet.is_sensitive() {
            debug!(snippet = %snippet.id, "Skipping history for sensitive snippet");
            return false;
        }

        let mut ring = match self.ring.try_lock() {
            Ok(ring) => ring,
            Err(TryLockError::WouldBlock) => {
                debug!(snippet = %snippet.id, "History busy, dropping entry");
                return false;
            }
            Err(TryLockError::Poisoned(_)) => {
                warn!(snippet = %snippet.id, "History lock poisoned, dropping entry");
                return false;
            }
        };

        if ring.capacity() != settings.history_limit {
            ring.resize(settings.history_limit);
        }
        ring.push(HistoryEntry {
            snippet_id: snippet.id.clone(),
            timestamp,
            output_len: output.chars().count(),
            app_id: app_id.map(str::to_string),
        });
        true
    }

    /// Recorded entries, oldest first
    pub fn entries(&self) -> Vec<HistoryEntry> {
        match self.ring.lock() {
            Ok(ring) => ring.entries(),
            Err(poisoned) => poisoned.into_inner().entries(),
        }
    }

    pub fn len(&self) -> usize {
        match self.ring.lock() {
            Ok(ring) => ring.len,
            Err(poisoned) => poisoned.into_inner().len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut ring = match self.ring.lock() {
            Ok(ring) => ring,
            Err(poisoned) => poisoned.into_inner(),
        };
        let capacity = ring.capacity();
        *ring = Ring::with_capacity(capacity);
    }
}
