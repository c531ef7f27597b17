//! Per-endpoint token store
//!
//! Monotonic counters keyed by endpoint id. Each issued request takes the
//! next token; at completion time, a response whose token no longer matches
//! the counter is stale and must be dropped silently. This is the "only the
//! latest request's result wins" guarantee for repeated calls to one
//! endpoint; the underlying network operation is not cancelled.

use dashmap::DashMap;

/// Token value meaning "token feature unused"; always considered current.
pub const TOKEN_UNUSED: u64 = 0;

/// Per-endpoint monotonic token counters.
#[derive(Debug, Default)]
pub struct TokenStore {
    counters: DashMap<String, u64>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self {
            counters: DashMap::new(),
        }
    }

    /// Increment and return the counter for an endpoint id.
    ///
    /// The counter initializes at 0, so the first issued token is 1 and
    /// never collides with [`TOKEN_UNUSED`].
    pub fn issue(&self, url_id: &str) -> u64 {
        let mut counter = self.counters.entry(url_id.to_string()).or_insert(0);
        *counter += 1;
        log::debug!("Issued token {} for {url_id}", *counter);
        *counter
    }

    /// Whether a response carrying `token` is still the latest for its
    /// endpoint. A [`TOKEN_UNUSED`] token is always current.
    pub fn is_current(&self, token: u64, url_id: &str) -> bool {
        if token == TOKEN_UNUSED {
            return true;
        }
        self.counters
            .get(url_id)
            .map(|current| *current == token)
            .unwrap_or(false)
    }
}
