//! This crate implements a request-lifecycle client for JSON envelope APIs.
//!
//! Responses arrive wrapped in a `{status, statusInfo, data}` envelope; the
//! [`orchestrator::Orchestrator`] decodes them, drops stale replies, refuses
//! duplicate in-flight submissions, caches where asked, and routes
//! application failures through a [`handler::HandlerRegistry`]. The [`form`]
//! module builds validated form submission on top of it.

pub mod config;
pub mod core;
pub mod form;
pub mod handler;
pub mod logging;
pub mod notify;
pub mod orchestrator;
pub mod store;
pub mod transport;

pub use crate::core::{decode, Decoded, Envelope, FlowError, FlowResult};
pub use handler::HandlerRegistry;
pub use notify::Notifier;
pub use orchestrator::{Orchestrator, OrchestratorBuilder, Outcome, RequestOptions};
pub use transport::{Transport, TransportRequest, TransportResponse};
