//! Form binding layer
//!
//! Wires input controls to declarative validation rules and submission.
//! Controls are external collaborators behind [`FieldControl`]; the form
//! only consumes the orchestrator's public request surface and the
//! notification surface. Submission serializes control values into a
//! dot-path-nested payload and maps server-side validation failures back
//! onto the offending controls.

pub mod path;
pub mod validate;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::core::identity;
use crate::handler::STATUS_VALIDATE_FAIL;
use crate::orchestrator::{FailureHook, Orchestrator, Outcome, RequestOptions};

use validate::{validate_control, RuleMap};

/// One input control the form manages. Discovery and rendering live with
/// the widget layer; the form sees only this surface.
pub trait FieldControl: Send + Sync {
    fn name(&self) -> &str;
    fn get_value(&self) -> Value;
    fn set_data(&self, value: Value);
    /// `None` clears the error display.
    fn set_error(&self, msg: Option<&str>);
}

/// Form construction options.
#[derive(Debug, Clone)]
pub struct FormOptions {
    /// Default submission URL.
    pub url: Option<String>,
    /// URL to fetch the validation rule map from.
    pub rule_url: Option<String>,
    /// Message shown when fetching rules fails.
    pub fetch_rules_fail_msg: String,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            url: None,
            rule_url: None,
            fetch_rules_fail_msg: "Failed to fetch validation rules".to_string(),
        }
    }
}

/// Per-submission options.
pub struct SubmitOptions<'a> {
    /// Overrides the form's configured URL.
    pub url: Option<String>,
    /// Extra fields merged into the payload (JSON object).
    pub extra_data: Option<Value>,
    /// Pre-submission hook; returning `false` aborts the submit.
    pub on_submit: Option<Box<dyn FnOnce(&Map<String, Value>) -> bool + Send + 'a>>,
    /// Failure hook; its return value is ANDed into default-handling
    /// suppression together with the form's own validation-failure handling.
    pub on_failure: Option<FailureHook<'a>>,
    /// Request options forwarded to the orchestrator. Its method, data, and
    /// failure hook are set by the form.
    pub request: RequestOptions<'a>,
}

impl Default for SubmitOptions<'_> {
    fn default() -> Self {
        Self {
            url: None,
            extra_data: None,
            on_submit: None,
            on_failure: None,
            request: RequestOptions::default(),
        }
    }
}

/// A managed form: control registry, rules, submission.
pub struct Form {
    orchestrator: Arc<Orchestrator>,
    controls: HashMap<String, Arc<dyn FieldControl>>,
    rules: RwLock<RuleMap>,
    options: FormOptions,
}

impl Form {
    pub fn new(orchestrator: Arc<Orchestrator>, options: FormOptions) -> Self {
        Self {
            orchestrator,
            controls: HashMap::new(),
            rules: RwLock::new(RuleMap::new()),
            options,
        }
    }

    /// Take a control under management, keyed by its name.
    pub fn register_control(&mut self, control: Arc<dyn FieldControl>) {
        self.controls.insert(control.name().to_string(), control);
    }

    /// Replace the validation rule map.
    pub fn set_validate_rules(&self, rules: RuleMap) {
        *self.rules.write() = rules;
    }

    /// Fetch the rule map from `url` (or the configured `rule_url`).
    ///
    /// Stale-response suppression is off here: two forms fetching rules
    /// from the same URL must each receive their reply. On failure the
    /// configured message is shown via `alert`, the rules are cleared, and
    /// default failure handling is vetoed.
    pub async fn fetch_remote_rules(&self, url: Option<&str>) -> bool {
        let Some(url) = url.or(self.options.rule_url.as_deref()) else {
            log::warn!("No rule URL configured, skipping rule fetch");
            return false;
        };

        let options = RequestOptions {
            used_token: Some(false),
            on_failure: Some(Box::new(|_status, _envelope| false)),
            ..Default::default()
        };
        let outcome = self.orchestrator.get_with(url, options).await;

        match outcome {
            Outcome::Success { data, .. } => match serde_json::from_value::<RuleMap>(data) {
                Ok(rules) => {
                    *self.rules.write() = rules;
                    true
                }
                Err(err) => {
                    log::warn!("Rule map from {url} does not deserialize: {err}");
                    self.fail_rule_fetch()
                }
            },
            _ => self.fail_rule_fetch(),
        }
    }

    fn fail_rule_fetch(&self) -> bool {
        self.orchestrator
            .notifier()
            .alert(&self.options.fetch_rules_fail_msg);
        self.rules.write().clear();
        false
    }

    /// Run every field's validators. Collects overall validity across all
    /// fields; a failing field does not stop the others.
    pub fn validate(&self) -> bool {
        let rules = self.rules.read().clone();
        let collected = path::collect_rules(rules, |name| self.controls.contains_key(name));

        let mut valid = true;
        for (name, control) in &self.controls {
            if let Some(node) = collected.get(name) {
                if !validate_control(control.as_ref(), node) {
                    valid = false;
                }
            }
        }
        valid
    }

    /// Validate, assemble the payload, and submit.
    ///
    /// Returns `None` when validation or the `on_submit` hook aborted the
    /// submission before any request was issued. A server-side validation
    /// failure (status 200) maps `statusInfo.error` entries onto the named
    /// controls and shows `statusInfo.msg` as a warning.
    pub async fn submit(&self, mut options: SubmitOptions<'_>) -> Option<Outcome> {
        if !self.validate() {
            return None;
        }

        let mut req_param = Map::new();
        for (name, control) in &self.controls {
            req_param.insert(name.clone(), control.get_value());
        }
        if let Some(Value::Object(extra)) = options.extra_data.take() {
            for (key, value) in extra {
                req_param.insert(key, value);
            }
        }

        if let Some(on_submit) = options.on_submit.take() {
            if !on_submit(&req_param) {
                return None;
            }
        }

        let Some(url) = options.url.take().or_else(|| self.options.url.clone()) else {
            log::warn!("No submission URL configured");
            return None;
        };

        let nested = path::nest_params(&req_param);
        let payload = match serde_json::to_string(&nested) {
            Ok(payload) => payload,
            Err(err) => {
                log::error!("Failed to serialize submission payload: {err}");
                return None;
            }
        };
        let body = format!("reqParam={}", identity::encode_component(&payload));

        let controls = &self.controls;
        let notifier = self.orchestrator.notifier().clone();
        let caller_failure = options.on_failure.take();
        let hook: FailureHook<'_> = Box::new(move |status, envelope| {
            let mut res = true;
            if status == STATUS_VALIDATE_FAIL {
                if let Some(errors) = envelope.status_info.get("error").and_then(|v| v.as_object()) {
                    for (name, msg) in errors {
                        if let Some(control) = controls.get(name) {
                            control.set_error(msg.as_str());
                        }
                    }
                }
                if let Some(msg) = envelope.status_info.get("msg").and_then(|v| v.as_str()) {
                    notifier.warning(msg);
                }
                res = false;
            }
            if let Some(cb) = caller_failure {
                res = cb(status, envelope) && res;
            }
            res
        });

        let mut request = options.request;
        request.method = http::Method::POST;
        request.data = Some(Value::String(body));
        request.on_failure = Some(hook);

        Some(self.orchestrator.request(&url, request).await)
    }

    /// Push data back into the named controls.
    pub fn set_data(&self, datasource: &Map<String, Value>) {
        for (name, value) in datasource {
            if let Some(control) = self.controls.get(name) {
                control.set_data(value.clone());
            }
        }
    }

    /// Snapshot of all control values, `name → value`.
    pub fn get_value(&self) -> Value {
        let mut values = Map::new();
        for (name, control) in &self.controls {
            values.insert(name.clone(), control.get_value());
        }
        Value::Object(values)
    }

    /// Set an error message on one control, or on all when `name` is None.
    pub fn set_error(&self, msg: &str, name: Option<&str>) {
        match name {
            Some(name) => {
                if let Some(control) = self.controls.get(name) {
                    control.set_error(Some(msg));
                }
            }
            None => {
                for control in self.controls.values() {
                    control.set_error(Some(msg));
                }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::test_support::RecordingNotifier;
    use crate::transport::test_support::MockTransport;
    use parking_lot::Mutex;
    use serde_json::json;
    use test_support::TestControl;

    struct Fixture {
        form: Form,
        transport: Arc<MockTransport>,
        notifier: Arc<RecordingNotifier>,
        email: Arc<TestControl>,
        city: Arc<TestControl>,
    }

    fn fixture() -> Fixture {
        let transport = Arc::new(MockTransport::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let orchestrator = Arc::new(
            Orchestrator::builder(transport.clone())
                .notifier(notifier.clone())
                .build(),
        );

        let email = Arc::new(TestControl::new("email", json!("a@example.com")));
        let city = Arc::new(TestControl::new("address.city", json!("berlin")));

        let mut form = Form::new(
            orchestrator,
            FormOptions {
                url: Some("/api/submit".to_string()),
                ..Default::default()
            },
        );
        form.register_control(email.clone());
        form.register_control(city.clone());

        Fixture {
            form,
            transport,
            notifier,
            email,
            city,
        }
    }

    fn rule_map(json: serde_json::Value) -> RuleMap {
        serde_json::from_value(json).expect("rule map json")
    }

    #[test]
    fn test_validate_runs_all_fields() {
        let f = fixture();
        f.email.set_data(json!("not an email"));
        f.city.set_data(json!(""));
        f.form.set_validate_rules(rule_map(json!({
            "email": [{"type": "regexp", "rule": "email", "msg": "bad email"}],
            "address.city": [{"type": "len", "min": 1, "msg": "required"}]
        })));

        assert!(!f.form.validate());
        // No early stop: both fields carry their own error.
        assert_eq!(f.email.error(), Some("bad email".to_string()));
        assert_eq!(f.city.error(), Some("required".to_string()));
    }

    #[tokio::test]
    async fn test_submit_blocked_by_validation() {
        let f = fixture();
        f.email.set_data(json!("nope"));
        f.form.set_validate_rules(rule_map(json!({
            "email": [{"type": "regexp", "rule": "email"}]
        })));

        let outcome = f.form.submit(SubmitOptions::default()).await;
        assert!(outcome.is_none());
        assert_eq!(f.transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_payload_is_nested_and_encoded() {
        let f = fixture();
        f.transport.reply_with(r#"{"data": "saved"}"#);

        let outcome = f
            .form
            .submit(SubmitOptions {
                extra_data: Some(json!({"source": "test"})),
                ..Default::default()
            })
            .await
            .expect("submit should dispatch");
        assert!(outcome.is_success());

        let sent = f.transport.sent_requests();
        assert_eq!(sent[0].url, "/api/submit");
        let body = sent[0].body.as_deref().unwrap();
        assert!(body.starts_with("reqParam="));

        // The dotted control name lands as a nested object in the payload.
        let encoded = body.trim_start_matches("reqParam=");
        let decoded: String = percent_encoding::percent_decode_str(encoded)
            .decode_utf8_lossy()
            .into_owned();
        let payload: serde_json::Value = serde_json::from_str(&decoded).unwrap();
        assert_eq!(payload["email"], "a@example.com");
        assert_eq!(payload["address"]["city"], "berlin");
        assert_eq!(payload["source"], "test");
    }

    #[tokio::test]
    async fn test_on_submit_veto_aborts() {
        let f = fixture();

        let outcome = f
            .form
            .submit(SubmitOptions {
                on_submit: Some(Box::new(|_| false)),
                ..Default::default()
            })
            .await;
        assert!(outcome.is_none());
        assert_eq!(f.transport.sent_count(), 0);
    }

    // Scenario: server-side validation failure maps per-field errors onto
    // controls, warns with the aggregate message, and still runs the
    // caller's failure hook with its result ANDed into suppression.
    #[tokio::test]
    async fn test_server_validation_failure_maps_field_errors() {
        let f = fixture();
        f.transport.reply_with(
            r#"{"status": 200, "statusInfo": {"error": {"email": "invalid"}, "msg": "fix errors"}}"#,
        );

        let caller_saw = Arc::new(Mutex::new(None));
        let caller_saw_clone = caller_saw.clone();
        let outcome = f
            .form
            .submit(SubmitOptions {
                on_failure: Some(Box::new(move |status, _envelope| {
                    *caller_saw_clone.lock() = Some(status);
                    true
                })),
                ..Default::default()
            })
            .await
            .expect("submit should dispatch");

        assert_eq!(outcome.failure_status(), Some(STATUS_VALIDATE_FAIL));
        assert_eq!(f.email.error(), Some("invalid".to_string()));
        assert_eq!(*caller_saw.lock(), Some(STATUS_VALIDATE_FAIL));

        // The aggregate warning fired, and the validation failure vetoed
        // the generic default handler regardless of the caller returning
        // true.
        let warnings: Vec<_> = f
            .notifier
            .events()
            .into_iter()
            .filter(|e| e.starts_with("warning:"))
            .collect();
        assert_eq!(warnings, vec!["warning:fix errors"]);
    }

    #[tokio::test]
    async fn test_fetch_remote_rules_success_and_failure() {
        let f = fixture();
        f.transport.reply_with(
            r#"{"data": {"email": [{"type": "regexp", "rule": "email", "msg": "bad"}]}}"#,
        );
        assert!(f.form.fetch_remote_rules(Some("/api/rules")).await);

        f.email.set_data(json!("nope"));
        assert!(!f.form.validate());

        // A failing fetch alerts, clears the rules, and suppresses the
        // default failure handler.
        f.transport.reply_with(r#"{"status": 500, "statusInfo": "boom"}"#);
        assert!(!f.form.fetch_remote_rules(Some("/api/rules")).await);
        assert!(f
            .notifier
            .events()
            .contains(&"alert:Failed to fetch validation rules".to_string()));
        assert!(!f
            .notifier
            .events()
            .iter()
            .any(|e| e.starts_with("warning:")));
        assert!(f.form.validate());
    }

    #[test]
    fn test_set_data_get_value_set_error() {
        let f = fixture();
        let mut data = Map::new();
        data.insert("email".to_string(), json!("new@example.com"));
        f.form.set_data(&data);

        let values = f.form.get_value();
        assert_eq!(values["email"], "new@example.com");

        f.form.set_error("broken", Some("email"));
        assert_eq!(f.email.error(), Some("broken".to_string()));
        assert_eq!(f.city.error(), None);

        f.form.set_error("all broken", None);
        assert_eq!(f.city.error(), Some("all broken".to_string()));
    }
}
