//! Workspace record: the single persisted row that owns a document and a timer.
//!
//! Column names follow the backend table (`id`, `user_id`, `name`, `data`,
//! `timer_duration`, `timer_value`, `timer_running`).

use serde::{Deserialize, Serialize};

use super::ids::{UserId, WorkspaceId};
use super::timer::TimerFields;

/// Default timer length when the row has never stored one (25 minutes).
pub const DEFAULT_TIMER_SECS: u32 = 25 * 60;

/// A workspace row as stored by the backend.
///
/// Timer columns are nullable: rows created before the timer existed, or by
/// clients that never touched it, leave them empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceRecord {
    pub id: WorkspaceId,
    pub user_id: UserId,
    pub name: String,

    /// Hex-encoded document snapshot (`\x...`), empty for a fresh workspace.
    #[serde(default)]
    pub data: String,

    #[serde(default)]
    pub timer_duration: Option<u32>,

    #[serde(default)]
    pub timer_value: Option<u32>,

    #[serde(default)]
    pub timer_running: Option<bool>,
}

impl WorkspaceRecord {
    /// A brand-new row: empty document, timer columns unset.
    pub fn new(id: WorkspaceId, user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            user_id,
            name: name.into(),
            data: String::new(),
            timer_duration: None,
            timer_value: None,
            timer_running: None,
        }
    }

    /// Timer fields with null columns replaced by defaults.
    ///
    /// `remaining` falls back to the duration, the duration to `default_secs`.
    pub fn timer_fields(&self, default_secs: u32) -> TimerFields {
        let duration = self.timer_duration.unwrap_or(default_secs);
        TimerFields {
            duration,
            remaining: self.timer_value.unwrap_or(duration),
            running: self.timer_running.unwrap_or(false),
        }
    }

    /// Apply a partial update in place. Unset patch fields leave columns alone.
    pub fn apply(&mut self, patch: &WorkspacePatch) {
        if let Some(data) = &patch.data {
            self.data = data.clone();
        }
        if let Some(duration) = patch.timer_duration {
            self.timer_duration = Some(duration);
        }
        if let Some(value) = patch.timer_value {
            self.timer_value = Some(value);
        }
        if let Some(running) = patch.timer_running {
            self.timer_running = Some(running);
        }
    }
}

/// Result of looking up a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceLookup {
    Found(WorkspaceRecord),
    NotFound,
}

impl WorkspaceLookup {
    pub fn into_record(self) -> Option<WorkspaceRecord> {
        match self {
            WorkspaceLookup::Found(record) => Some(record),
            WorkspaceLookup::NotFound => None,
        }
    }
}

impl From<Option<WorkspaceRecord>> for WorkspaceLookup {
    fn from(record: Option<WorkspaceRecord>) -> Self {
        match record {
            Some(record) => WorkspaceLookup::Found(record),
            None => WorkspaceLookup::NotFound,
        }
    }
}

/// Partial update of a workspace row.
///
/// Only the `Some` fields are sent; this is how a tick can persist
/// `timer_value` alone while `start` writes all three timer columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspacePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_duration: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_value: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_running: Option<bool>,
}

impl WorkspacePatch {
    pub fn data(encoded: impl Into<String>) -> Self {
        Self {
            data: Some(encoded.into()),
            ..Self::default()
        }
    }

    /// All three timer columns.
    pub fn timer(fields: TimerFields) -> Self {
        Self {
            timer_duration: Some(fields.duration),
            timer_value: Some(fields.remaining),
            timer_running: Some(fields.running),
            ..Self::default()
        }
    }

    pub fn timer_value(remaining: u32) -> Self {
        Self {
            timer_value: Some(remaining),
            ..Self::default()
        }
    }

    pub fn timer_length(duration: u32, remaining: u32) -> Self {
        Self {
            timer_duration: Some(duration),
            timer_value: Some(remaining),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
