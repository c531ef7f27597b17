//! Duplicate-submission guard
//!
//! Set of request keys currently in flight. A second identical request while
//! one is outstanding is refused before reaching the transport (double-click
//! protection). The token store solves a different problem: it lets multiple
//! identical requests go out and discards all but the newest response.

use dashmap::DashMap;

/// In-flight request key set.
#[derive(Debug, Default)]
pub struct RepeatGuard {
    held: DashMap<String, ()>,
}

impl RepeatGuard {
    pub fn new() -> Self {
        Self {
            held: DashMap::new(),
        }
    }

    /// Record a key as held. Returns false when the key is already held, in
    /// which case the caller must abort without issuing the request.
    pub fn try_acquire(&self, key: &str) -> bool {
        match self.held.entry(key.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                log::debug!("Duplicate request refused for key: {key}");
                false
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(());
                true
            }
        }
    }

    /// Release a held key. Releasing an unheld key is a no-op.
    pub fn release(&self, key: &str) {
        self.held.remove(key);
    }
}
