//! Standard response envelope decoding
//!
//! Every server reply is expected to carry the `{status, statusInfo, data}`
//! wrapper. A falsy `status` (0 or absent) means success and `data` holds the
//! payload; any other value is an application error code with detail in
//! `statusInfo`. Decoding produces exactly one of success or failure, never
//! both and never neither.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status of a successful envelope.
pub const STATUS_OK: u32 = 0;

/// Sentinel status for payloads that failed to parse or were not objects.
/// Distinct from any server-defined code.
pub const STATUS_MALFORMED: u32 = 1;

/// Fallback status when the transport failed without a usable status code.
pub const STATUS_TRANSPORT_UNKNOWN: u32 = 99999;

/// The standard response wrapper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    /// Application status code; 0 or absent means success.
    #[serde(default)]
    pub status: u32,

    /// Human-readable or structured detail accompanying a failure status.
    #[serde(default, rename = "statusInfo", skip_serializing_if = "Value::is_null")]
    pub status_info: Value,

    /// The payload carried on success.
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Build a synthetic envelope for a transport-level failure.
    ///
    /// `status_code` is the transport status (HTTP status or 0 when the
    /// failure produced none), normalized to [`STATUS_TRANSPORT_UNKNOWN`]
    /// when absent so the failure path always carries a non-zero code.
    pub fn from_transport(status_code: u16, status_text: &str, body: &str) -> Self {
        let status = if status_code == 0 {
            STATUS_TRANSPORT_UNKNOWN
        } else {
            u32::from(status_code)
        };
        Envelope {
            status,
            status_info: Value::String(status_text.to_string()),
            data: Value::String(body.to_string()),
        }
    }

    fn malformed(raw: &str) -> Self {
        Envelope {
            status: STATUS_MALFORMED,
            status_info: Value::String("malformed payload".to_string()),
            data: Value::String(raw.to_string()),
        }
    }

    /// Best-effort textual rendering of `statusInfo` for user-facing messages.
    pub fn status_info_text(&self) -> Option<&str> {
        self.status_info.as_str()
    }
}

/// Result of decoding one response attempt.
#[derive(Debug, Clone)]
pub enum Decoded {
    /// `status` was falsy; carries the payload and the whole envelope.
    Success { data: Value, envelope: Envelope },
    /// `status` was non-falsy, or the payload was unusable.
    Failure { status: u32, envelope: Envelope },
}

/// Decode a raw response body.
///
/// Parse failures and non-object payloads are failures with
/// [`STATUS_MALFORMED`]; they are data, not errors, so the caller's failure
/// path sees them like any server-signaled status.
pub fn decode(source: &str) -> Decoded {
    match serde_json::from_str::<Value>(source) {
        Ok(value) if value.is_object() => decode_value(value),
        Ok(_) | Err(_) => {
            log::debug!("Response body is not a JSON object, treating as malformed");
            let envelope = Envelope::malformed(source);
            Decoded::Failure {
                status: STATUS_MALFORMED,
                envelope,
            }
        }
    }
}

/// Decode an already-parsed payload.
pub fn decode_value(value: Value) -> Decoded {
    let envelope: Envelope = match serde_json::from_value(value.clone()) {
        Ok(envelope) => envelope,
        Err(err) => {
            log::debug!("Envelope shape mismatch: {err}");
            let raw = value.to_string();
            return Decoded::Failure {
                status: STATUS_MALFORMED,
                envelope: Envelope::malformed(&raw),
            };
        }
    };

    if envelope.status == STATUS_OK {
        Decoded::Success {
            data: envelope.data.clone(),
            envelope,
        }
    } else {
        Decoded::Failure {
            status: envelope.status,
            envelope,
        }
    }
}
