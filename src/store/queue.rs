//! Loading queue
//!
//! Multiset of call ids currently pending, driving the shared busy indicator:
//! the first push shows it, draining hides it, and a masked add while the
//! indicator is visible upgrades it to masked. Mask visibility never
//! downgrades while entries remain.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::notify::Notifier;

/// Shared entry id for adds that carry no call id; multiple anonymous
/// entries may coexist.
const ANONYMOUS: &str = "*";

#[derive(Debug, Default)]
struct QueueState {
    entries: Vec<String>,
    masked: bool,
}

/// Count of in-flight calls plus the indicator it drives.
pub struct LoadingQueue {
    notifier: Arc<dyn Notifier>,
    loading_text: String,
    state: Mutex<QueueState>,
}

impl LoadingQueue {
    pub fn new(notifier: Arc<dyn Notifier>, loading_text: String) -> Self {
        Self {
            notifier,
            loading_text,
            state: Mutex::new(QueueState::default()),
        }
    }

    /// Push a pending call. Shows the indicator on the empty→non-empty
    /// transition; upgrades to masked when `wants_mask` and no mask is
    /// currently shown. Duplicate adds of the same non-anonymous call id
    /// are ignored.
    pub fn add(&self, call_id: Option<&str>, wants_mask: bool) {
        let mut state = self.state.lock();

        if let Some(id) = call_id {
            if state.entries.iter().any(|entry| entry == id) {
                return;
            }
        }

        if state.entries.is_empty() {
            self.notifier.notify(&self.loading_text, wants_mask);
            state.masked = wants_mask;
        } else if wants_mask && !state.masked {
            self.notifier.set_mask();
            state.masked = true;
        }

        state.entries.push(call_id.unwrap_or(ANONYMOUS).to_string());
    }

    /// Remove one occurrence of a pending call; hides the indicator and any
    /// mask when the queue drains.
    pub fn reduce(&self, call_id: Option<&str>) {
        let mut state = self.state.lock();
        let id = call_id.unwrap_or(ANONYMOUS);

        if let Some(pos) = state.entries.iter().position(|entry| entry == id) {
            state.entries.remove(pos);
        }

        if state.entries.is_empty() {
            state.masked = false;
            self.notifier.hide();
        }
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }
}
