//! Append-only mission event log consumed by presentation layers.

use crate::MissionPhase;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    Phase,
    Hazard,
    Travel,
    Extraction,
    Delay,
    Sale,
    Repair,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub day: u32,
    pub phase: MissionPhase,
    pub category: EventCategory,
    pub description: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {:>4} [{}] {}", self.day, self.phase, self.description)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Entries are never removed or reordered.
    pub fn push(
        &mut self,
        day: u32,
        phase: MissionPhase,
        category: EventCategory,
        description: impl Into<String>,
    ) {
        let description = description.into();
        debug!(day, %phase, ?category, "{description}");
        self.entries.push(LogEntry {
            day,
            phase,
            category,
            description,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn count(&self, category: EventCategory) -> usize {
        self.entries.iter().filter(|e| e.category == category).count()
    }
}
