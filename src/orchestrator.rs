//! Request orchestrator, the request lifecycle state machine
//!
//! Each logical call moves through
//! `Created → (RejectedByGuard | RejectedByCache | Dispatched) →
//! (Completed | DroppedStale)`. The orchestrator owns the cache, token,
//! guard, and queue stores and composes them around the transport
//! primitive; failures are data-carrying outcomes, never errors thrown
//! across this boundary.

use std::sync::Arc;

use http::Method;
use serde_json::Value;

use crate::config::OrchestratorConfig;
use crate::core::envelope::{self, Decoded, Envelope};
use crate::core::identity;
use crate::handler::{FailureHandler, HandlerRegistry};
use crate::notify::{LogNotifier, Notifier};
use crate::store::{LoadingQueue, RepeatGuard, ResponseCache, TokenStore, TOKEN_UNUSED};
use crate::transport::{Transport, TransportRequest};

/// Caller-supplied failure hook. Runs before default handling; returning
/// `false` vetoes the status-keyed default handler.
pub type FailureHook<'a> = Box<dyn FnOnce(u32, &Envelope) -> bool + Send + 'a>;

/// Per-request options.
pub struct RequestOptions<'a> {
    pub method: Method,
    /// Request params: a JSON object (urlencoded), a string (used verbatim),
    /// or any other JSON value (sent as JSON text).
    pub data: Option<Value>,
    /// Serve/record this request through the response cache.
    pub cache: bool,
    /// Refuse a second identical request while one is outstanding.
    pub prevent_repeat: bool,
    /// Mask the surface while this request is pending (implies queueing).
    pub mask: bool,
    /// Track this request in the loading queue. Defaults to true.
    pub queue: bool,
    /// Per-endpoint stale-response suppression. `None` resolves to the
    /// entry-point default: true for [`Orchestrator::dao`], false elsewhere.
    pub used_token: Option<bool>,
    /// Failure hook with veto power over default handling.
    pub on_failure: Option<FailureHook<'a>>,
}

impl Default for RequestOptions<'_> {
    fn default() -> Self {
        Self {
            method: Method::GET,
            data: None,
            cache: false,
            prevent_repeat: false,
            mask: false,
            queue: true,
            used_token: None,
            on_failure: None,
        }
    }
}

/// Terminal state of one logical call. Exactly one outcome per call.
#[derive(Debug)]
pub enum Outcome {
    /// The envelope carried a falsy status.
    Success {
        data: Value,
        envelope: Envelope,
        /// Served synchronously from the cache without a transport dispatch.
        from_cache: bool,
    },
    /// The envelope carried a failure status (application, transport, or
    /// malformed payload); default handling has already run unless vetoed.
    Failure { status: u32, envelope: Envelope },
    /// A newer request to the same endpoint superseded this one; the
    /// response was discarded silently.
    DroppedStale,
    /// The duplicate-submission guard refused the call; nothing was issued.
    RejectedDuplicate,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Payload of a successful call.
    pub fn data(&self) -> Option<&Value> {
        match self {
            Outcome::Success { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Failure status of a failed call.
    pub fn failure_status(&self) -> Option<u32> {
        match self {
            Outcome::Failure { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Builder wiring a transport, notifier, config, and failure handlers into
/// one [`Orchestrator`].
pub struct OrchestratorBuilder {
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    config: OrchestratorConfig,
    handlers: HandlerRegistry,
}

impl OrchestratorBuilder {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            notifier: Arc::new(LogNotifier),
            config: OrchestratorConfig::default(),
            handlers: HandlerRegistry::with_builtins(),
        }
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Install or override the default handler for a status code.
    pub fn handler(self, status: u32, handler: Arc<dyn FailureHandler>) -> Self {
        self.handlers.register(status, handler);
        self
    }

    /// Replace the fallback handler for unmapped status codes.
    pub fn fallback_handler(self, handler: Arc<dyn FailureHandler>) -> Self {
        self.handlers.set_fallback(handler);
        self
    }

    pub fn build(self) -> Orchestrator {
        let queue = LoadingQueue::new(self.notifier.clone(), self.config.loading_text.clone());
        Orchestrator {
            transport: self.transport,
            notifier: self.notifier,
            config: self.config,
            cache: ResponseCache::new(),
            tokens: TokenStore::new(),
            guard: RepeatGuard::new(),
            queue,
            handlers: self.handlers,
        }
    }
}

/// The request lifecycle manager. One instance per application context;
/// within it the stores keep shared-singleton semantics.
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    config: OrchestratorConfig,
    cache: ResponseCache,
    tokens: TokenStore,
    guard: RepeatGuard,
    queue: LoadingQueue,
    handlers: HandlerRegistry,
}

impl Orchestrator {
    pub fn builder(transport: Arc<dyn Transport>) -> OrchestratorBuilder {
        OrchestratorBuilder::new(transport)
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Issue a GET with default options.
    pub async fn get(&self, url: &str) -> Outcome {
        self.request(url, RequestOptions::default()).await
    }

    /// Issue a GET with explicit options.
    pub async fn get_with(&self, url: &str, mut options: RequestOptions<'_>) -> Outcome {
        options.method = Method::GET;
        self.request(url, options).await
    }

    /// Issue a POST with default options.
    pub async fn post(&self, url: &str, data: Value) -> Outcome {
        self.post_with(url, data, RequestOptions::default()).await
    }

    /// Issue a POST with explicit options.
    pub async fn post_with(&self, url: &str, data: Value, mut options: RequestOptions<'_>) -> Outcome {
        options.method = Method::POST;
        options.data = Some(data);
        self.request(url, options).await
    }

    /// Data-access entry point: POST with stale-response suppression on by
    /// default.
    pub async fn dao(&self, url: &str, data: Value, mut options: RequestOptions<'_>) -> Outcome {
        options.method = Method::POST;
        options.data = Some(data);
        options.used_token = Some(options.used_token.unwrap_or(true));
        self.request(url, options).await
    }

    /// Run one logical call through the full lifecycle.
    pub async fn request(&self, url: &str, mut options: RequestOptions<'_>) -> Outcome {
        let params = options.data.take().map(|d| render_params(&d)).unwrap_or_default();
        // Identity is derived from the caller's URL and params, before any
        // cache-buster touches them.
        let key = identity::derive_key(url, &params);
        let call_id = identity::mint_call_id();

        if options.prevent_repeat && !self.guard.try_acquire(&key) {
            return Outcome::RejectedDuplicate;
        }

        if options.cache {
            if let Some(entry) = self.cache.get(&key) {
                log::debug!("Cache hit for {url}, skipping dispatch");
                if options.prevent_repeat {
                    self.guard.release(&key);
                }
                return Outcome::Success {
                    data: entry.data,
                    envelope: entry.envelope,
                    from_cache: true,
                };
            }
        }

        if options.queue {
            self.queue.add(Some(&call_id), options.mask);
        }

        // Cache busting: safe reads get a timestamp query param; writes with
        // no body get a timestamp-only body so intermediaries cannot
        // collapse them.
        let buster = format!(
            "{}={}",
            self.config.buster_param,
            identity::timestamp_millis()
        );
        let is_read = matches!(options.method, Method::GET | Method::HEAD);
        let mut dispatch_url = url.to_string();
        let mut body = None;
        if is_read {
            if !params.is_empty() {
                dispatch_url = identity::add_params_to_url(&dispatch_url, &params);
            }
            dispatch_url = identity::add_params_to_url(&dispatch_url, &buster);
        } else if params.is_empty() {
            body = Some(buster);
        } else {
            body = Some(params);
        }

        let uid = identity::url_id(url).to_string();
        let used_token = options.used_token.unwrap_or(false);
        let token = if used_token {
            self.tokens.issue(&uid)
        } else {
            TOKEN_UNUSED
        };

        let mut request = TransportRequest::new(dispatch_url, options.method.clone());
        if let Some(body) = body {
            request = request.with_body(body);
        }

        let decoded = match self.transport.send(request).await {
            Ok(response) if response.is_success() => envelope::decode(&response.body_text()),
            Ok(response) => {
                let envelope = Envelope::from_transport(
                    response.status,
                    &response.status_text,
                    &response.body_text(),
                );
                Decoded::Failure {
                    status: envelope.status,
                    envelope,
                }
            }
            Err(err) => {
                log::warn!("Transport failure for {url}: {err}");
                let envelope = Envelope::from_transport(0, &err.to_string(), "");
                Decoded::Failure {
                    status: envelope.status,
                    envelope,
                }
            }
        };

        // Completion bookkeeping: the guard is released whatever happened,
        // then stale responses are dropped before any caller-visible effect.
        if options.prevent_repeat {
            self.guard.release(&key);
        }

        if !self.tokens.is_current(token, &uid) {
            if options.queue {
                self.queue.reduce(Some(&call_id));
            }
            log::debug!("Dropping stale response for {uid}");
            return Outcome::DroppedStale;
        }

        match decoded {
            Decoded::Success { data, envelope } => {
                if options.cache {
                    self.cache.set(key, data.clone(), envelope.clone());
                }
                if options.queue {
                    self.queue.reduce(Some(&call_id));
                }
                Outcome::Success {
                    data,
                    envelope,
                    from_cache: false,
                }
            }
            Decoded::Failure { status, envelope } => {
                if options.queue {
                    self.queue.reduce(Some(&call_id));
                }
                let vetoed = match options.on_failure.take() {
                    Some(hook) => !hook(status, &envelope),
                    None => false,
                };
                if !vetoed {
                    self.handlers.dispatch(status, &envelope, self.notifier.as_ref());
                }
                Outcome::Failure { status, envelope }
            }
        }
    }
}

/// Render request params for dispatch: objects become urlencoded queries,
/// strings pass through, anything else becomes JSON text.
fn render_params(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        Value::Object(_) => identity::json_to_query(data).unwrap_or_else(|err| {
            log::warn!("Unencodable request params: {err}");
            String::new()
        }),
        other => other.to_string(),
    }
}
