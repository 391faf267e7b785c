//! History records and the platform history stack.
//!
//! Only the `{url, targetId, action}` projection of a [`NavState`] is ever
//! written to the stack. Bodies stay in the response cache: per-entry
//! history storage is small and a large body would make the push fail.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use pushnav_types::error::{NavError, Result};

use crate::state::NavState;

/// The persisted projection of a [`NavState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub url: String,
    pub target_id: Option<String>,
    pub action: Option<String>,
}

impl HistoryRecord {
    /// Project the persisted fields of `state`. The URL must already be
    /// normalized.
    pub fn encode(state: &NavState) -> Self {
        Self {
            url: state.url.clone(),
            target_id: state.target.clone(),
            action: state.action.clone(),
        }
    }

    /// Rebuild a body-less state. The caller re-resolves the body from the
    /// cache or a fetch before instating it.
    pub fn decode(self) -> NavState {
        NavState::new(self.url)
            .with_target(self.target_id)
            .with_action(self.action)
    }

    /// Serialize into the per-entry state slot layout.
    pub fn to_state(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Whatever the platform handed back on a pop. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MinimalRecord {
    pub url: Option<String>,
    pub target_id: Option<String>,
    pub action: Option<String>,
}

impl MinimalRecord {
    /// Decode a state slot field by field. A field that is missing or not
    /// a string is dropped on its own; a slot that is absent or not an
    /// object yields an empty record.
    pub fn from_state(state: Option<&Value>) -> Self {
        let map = match state {
            Some(Value::Object(map)) => map,
            Some(other) => {
                log::debug!("degraded history state: {other}");
                return Self::default();
            },
            None => return Self::default(),
        };
        let field = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            url: field("url"),
            target_id: field("targetId"),
            action: field("action"),
        }
    }

    /// Whether the record names a target or an action.
    pub fn has_metadata(&self) -> bool {
        self.target_id.is_some() || self.action.is_some()
    }
}

impl From<HistoryRecord> for MinimalRecord {
    fn from(record: HistoryRecord) -> Self {
        Self {
            url: Some(record.url),
            target_id: record.target_id,
            action: record.action,
        }
    }
}

// -------------------------------------------------------------------
// HistoryStack
// -------------------------------------------------------------------

/// The platform's session history, seen as an append-only log with a
/// cursor.
pub trait HistoryStack {
    /// Append a record after the current entry, discarding forward entries.
    fn push(&mut self, record: &HistoryRecord) -> Result<()>;

    /// Overwrite the current entry.
    fn replace(&mut self, record: &HistoryRecord) -> Result<()>;

    /// Index of the current entry.
    fn current_index(&self) -> usize;

    /// The URL currently shown in the address bar.
    fn location(&self) -> &str;
}

/// A single entry of a [`MemoryHistory`].
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub url: String,
    /// The per-entry state slot; `None` for entries created by full
    /// page loads.
    pub state: Option<Value>,
}

/// In-memory session history with back/forward stacks.
#[derive(Debug)]
pub struct MemoryHistory {
    back_stack: Vec<HistoryEntry>,
    forward_stack: Vec<HistoryEntry>,
    current: HistoryEntry,
    /// Largest serialized state accepted per entry, in bytes.
    max_state_bytes: usize,
}

/// Per-entry state limit used by [`MemoryHistory::new`].
pub const DEFAULT_MAX_STATE_BYTES: usize = 16 * 1024;

impl MemoryHistory {
    /// A history holding one stateless entry for `start_url`.
    pub fn new(start_url: &str) -> Self {
        Self {
            back_stack: Vec::new(),
            forward_stack: Vec::new(),
            current: HistoryEntry {
                url: start_url.to_string(),
                state: None,
            },
            max_state_bytes: DEFAULT_MAX_STATE_BYTES,
        }
    }

    /// Override the per-entry state limit.
    pub fn with_max_state_bytes(mut self, bytes: usize) -> Self {
        self.max_state_bytes = bytes;
        self
    }

    /// Move back one entry, returning the entry now current.
    pub fn back(&mut self) -> Option<&HistoryEntry> {
        let prev = self.back_stack.pop()?;
        let current = std::mem::replace(&mut self.current, prev);
        self.forward_stack.push(current);
        Some(&self.current)
    }

    /// Move forward one entry, returning the entry now current.
    pub fn forward(&mut self) -> Option<&HistoryEntry> {
        let next = self.forward_stack.pop()?;
        let current = std::mem::replace(&mut self.current, next);
        self.back_stack.push(current);
        Some(&self.current)
    }

    pub fn can_go_back(&self) -> bool {
        !self.back_stack.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward_stack.is_empty()
    }

    pub fn current(&self) -> &HistoryEntry {
        &self.current
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.back_stack.len() + 1 + self.forward_stack.len()
    }

    /// Always `false`: there is at least the current entry.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<&HistoryEntry> {
        self.back_stack
            .iter()
            .chain(std::iter::once(&self.current))
            .chain(self.forward_stack.iter().rev())
            .collect()
    }

    fn entry_for(&self, record: &HistoryRecord) -> Result<HistoryEntry> {
        let state = record.to_state()?;
        let size = state.to_string().len();
        if size > self.max_state_bytes {
            return Err(NavError::History(format!(
                "history state of {size} bytes exceeds {} byte limit",
                self.max_state_bytes
            )));
        }
        Ok(HistoryEntry {
            url: record.url.clone(),
            state: Some(state),
        })
    }
}

impl HistoryStack for MemoryHistory {
    fn push(&mut self, record: &HistoryRecord) -> Result<()> {
        let entry = self.entry_for(record)?;
        let current = std::mem::replace(&mut self.current, entry);
        self.back_stack.push(current);
        self.forward_stack.clear();
        Ok(())
    }

    fn replace(&mut self, record: &HistoryRecord) -> Result<()> {
        self.current = self.entry_for(record)?;
        Ok(())
    }

    fn current_index(&self) -> usize {
        self.back_stack.len()
    }

    fn location(&self) -> &str {
        &self.current.url
    }
}
