//! Core building blocks: unified errors, the response envelope decoder, and
//! request identity utilities. Everything here is free of orchestration
//! state; the stores and the orchestrator build on top.

pub mod envelope;
pub mod error;
pub mod identity;

pub use envelope::{decode, decode_value, Decoded, Envelope};
pub use envelope::{STATUS_MALFORMED, STATUS_OK, STATUS_TRANSPORT_UNKNOWN};
pub use error::{ErrorContext, FlowError, FlowResult};
