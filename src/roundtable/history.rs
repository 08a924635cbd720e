//! Thread-safe ordered message log.
//!
//! The store is exclusively owned by the orchestrator; every other component
//! reads and writes it through the orchestrator's accessors. All access takes
//! one exclusive critical section, so a snapshot is always atomic and
//! consistent even while an exchange is appending concurrently.

use crate::roundtable::message::ChatMessage;
use std::sync::Mutex;

/// Ordered, append-mostly log of [`ChatMessage`]s.
///
/// Insertion order is conversational order. The only removals in normal
/// operation are the explicit accessor-level removes and the pre-task purge
/// of control-tagged entries.
pub struct HistoryStore {
    messages: Mutex<Vec<ChatMessage>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        HistoryStore {
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn append(&self, message: ChatMessage) {
        self.messages.lock().unwrap().push(message);
    }

    /// Remove the entry at `index`; out-of-range indices are ignored.
    pub fn remove(&self, index: usize) {
        let mut messages = self.messages.lock().unwrap();
        if index < messages.len() {
            messages.remove(index);
        }
    }

    /// Atomic, consistent copy of the whole log.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().unwrap().is_empty()
    }

    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
    }

    /// Replace the entire log in one critical section.
    pub fn replace(&self, messages: Vec<ChatMessage>) {
        *self.messages.lock().unwrap() = messages;
    }

    /// Remove exactly the control-tagged entries, keeping everything else in
    /// order. Returns how many entries were purged.
    pub fn purge_control_tagged(&self) -> usize {
        let mut messages = self.messages.lock().unwrap();
        let before = messages.len();
        messages.retain(|m| !m.is_control_tagged());
        before - messages.len()
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}
