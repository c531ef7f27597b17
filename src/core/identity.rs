//! Request identity utilities
//!
//! Builds the stable cache/dedupe key for a request, mints per-call ids for
//! loading-queue correlation, and derives the per-endpoint id used by the
//! token store. One key algorithm serves both the cache and the dedupe guard;
//! the stores themselves stay independent.

use std::time::{SystemTime, UNIX_EPOCH};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use uuid::Uuid;

use super::error::{FlowError, FlowResult};

// Matches component-style encoding: unreserved marks stay literal.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Append a params string to a URL, choosing `?` or `&` by whether the URL
/// already carries a query component.
pub fn add_params_to_url(url: &str, params: &str) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}{params}")
}

/// Percent-encode a string as one URI component.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Derive the canonical identity key for a request.
///
/// Deterministic for identical `(url, params)` pairs; distinct pairs are not
/// cryptographically guarded against collision, which is accepted for a
/// cache/dedupe key.
pub fn derive_key(url: &str, params: &str) -> String {
    let joined = add_params_to_url(url, params);
    utf8_percent_encode(&joined, COMPONENT).to_string()
}

/// Mint an opaque unique id for one outgoing call.
///
/// Used only to correlate loading-queue entries; no ordering semantics.
pub fn mint_call_id() -> String {
    Uuid::new_v4().to_string()
}

/// The token store's id space: the URL stripped of query and fragment.
///
/// Computed before any cache-buster is appended so repeated calls to one
/// endpoint share a counter.
pub fn url_id(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Serialize a flat JSON object into a canonical urlencoded query string.
///
/// Keys are sorted for determinism. Scalar values are rendered verbatim,
/// nested values as JSON text.
pub fn json_to_query(params: &Value) -> FlowResult<String> {
    let map = params
        .as_object()
        .ok_or_else(|| FlowError::InvalidInput("query params must be a JSON object".to_string()))?;

    let mut pairs: Vec<(String, String)> = Vec::with_capacity(map.len());
    for (key, value) in map {
        let rendered = match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            Value::Number(_) | Value::Bool(_) => value.to_string(),
            _ => serde_json::to_string(value)?,
        };
        pairs.push((key.clone(), rendered));
    }
    pairs.sort();

    serde_urlencoded::to_string(&pairs).map_err(|e| FlowError::Encoding(e.to_string()))
}

/// Milliseconds since the epoch, for cache-buster params.
pub fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
