//! Status-code-keyed default failure handlers
//!
//! When a request fails and the caller's failure hook does not veto, the
//! handler registered for the envelope's status code runs; unmapped codes
//! fall back to one mandatory generic handler. The registry is owned per
//! orchestrator, so applications can add or override handlers without
//! touching global state.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::core::Envelope;
use crate::notify::Notifier;

/// Server-side validation failed; handled by the form layer.
pub const STATUS_VALIDATE_FAIL: u32 = 200;
/// Caller lacks permission for the operation.
pub const STATUS_NO_PERMISSION: u32 = 300;
/// Caller is not signed in; `statusInfo.url` may carry a sign-in location.
pub const STATUS_NOT_SIGNED_IN: u32 = 301;

/// One default failure handler.
pub trait FailureHandler: Send + Sync {
    fn handle(&self, status: u32, envelope: &Envelope, notifier: &dyn Notifier);
}

impl<F> FailureHandler for F
where
    F: Fn(u32, &Envelope, &dyn Notifier) + Send + Sync,
{
    fn handle(&self, status: u32, envelope: &Envelope, notifier: &dyn Notifier) {
        self(status, envelope, notifier)
    }
}

/// Registry mapping status codes to default handlers, with a mandatory
/// fallback for unmapped codes.
pub struct HandlerRegistry {
    handlers: DashMap<u32, Arc<dyn FailureHandler>>,
    fallback: RwLock<Arc<dyn FailureHandler>>,
}

impl HandlerRegistry {
    /// Registry with the built-in handlers (fallback, no-permission,
    /// not-signed-in) installed.
    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        registry.register(STATUS_NO_PERMISSION, Arc::new(no_permission_handler));
        registry.register(STATUS_NOT_SIGNED_IN, Arc::new(not_signed_in_handler));
        registry
    }

    /// Registry with only the generic fallback installed.
    pub fn empty() -> Self {
        Self {
            handlers: DashMap::new(),
            fallback: RwLock::new(Arc::new(fallback_handler)),
        }
    }

    /// Install or override the handler for a status code.
    pub fn register(&self, status: u32, handler: Arc<dyn FailureHandler>) {
        log::debug!("Registering failure handler for status {status}");
        self.handlers.insert(status, handler);
    }

    /// Replace the fallback handler for unmapped codes.
    pub fn set_fallback(&self, handler: Arc<dyn FailureHandler>) {
        *self.fallback.write() = handler;
    }

    /// Run the handler for `status`, or the fallback when none is mapped.
    pub fn dispatch(&self, status: u32, envelope: &Envelope, notifier: &dyn Notifier) {
        let handler = self
            .handlers
            .get(&status)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| self.fallback.read().clone());
        handler.handle(status, envelope, notifier);
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn fallback_handler(_status: u32, envelope: &Envelope, notifier: &dyn Notifier) {
    let msg = envelope
        .status_info_text()
        .unwrap_or("The service is temporarily unavailable, please retry later");
    notifier.warning(msg);
}

fn no_permission_handler(_status: u32, envelope: &Envelope, notifier: &dyn Notifier) {
    let msg = envelope
        .status_info_text()
        .unwrap_or("No permission for this operation, please contact an administrator");
    notifier.warning(msg);
}

fn not_signed_in_handler(_status: u32, envelope: &Envelope, notifier: &dyn Notifier) {
    let msg = envelope
        .status_info
        .get("msg")
        .and_then(|v| v.as_str())
        .unwrap_or("Not signed in, please sign in first");
    notifier.warning(msg);

    if let Some(url) = envelope.status_info.get("url").and_then(|v| v.as_str()) {
        notifier.redirect(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::test_support::RecordingNotifier;
    use serde_json::json;

    fn failure_envelope(status: u32, status_info: serde_json::Value) -> Envelope {
        Envelope {
            status,
            status_info,
            data: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_fallback_runs_for_unmapped_status() {
        let registry = HandlerRegistry::with_builtins();
        let notifier = RecordingNotifier::default();

        registry.dispatch(123, &failure_envelope(123, json!("oops")), &notifier);
        assert_eq!(notifier.events(), vec!["warning:oops"]);
    }

    #[test]
    fn test_no_permission_handler_default_message() {
        let registry = HandlerRegistry::with_builtins();
        let notifier = RecordingNotifier::default();

        registry.dispatch(
            STATUS_NO_PERMISSION,
            &failure_envelope(STATUS_NO_PERMISSION, serde_json::Value::Null),
            &notifier,
        );
        let events = notifier.events();
        assert_eq!(events.len(), 1);
        assert!(events[0].starts_with("warning:No permission"));
    }

    #[test]
    fn test_not_signed_in_redirects_when_url_present() {
        let registry = HandlerRegistry::with_builtins();
        let notifier = RecordingNotifier::default();

        registry.dispatch(
            STATUS_NOT_SIGNED_IN,
            &failure_envelope(
                STATUS_NOT_SIGNED_IN,
                json!({"msg": "session expired", "url": "/login"}),
            ),
            &notifier,
        );
        assert_eq!(
            notifier.events(),
            vec!["warning:session expired", "redirect:/login"]
        );
    }

    #[test]
    fn test_register_overrides_builtin() {
        let registry = HandlerRegistry::with_builtins();
        let notifier = RecordingNotifier::default();

        registry.register(
            STATUS_NO_PERMISSION,
            Arc::new(|_status: u32, _envelope: &Envelope, notifier: &dyn Notifier| {
                notifier.alert("custom");
            }),
        );
        registry.dispatch(
            STATUS_NO_PERMISSION,
            &failure_envelope(STATUS_NO_PERMISSION, serde_json::Value::Null),
            &notifier,
        );
        assert_eq!(notifier.events(), vec!["alert:custom"]);
    }
}
