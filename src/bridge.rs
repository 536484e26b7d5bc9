//! Lifecycle controller that owns the relay pipeline.
//!
//! A [`MarketRelay`] is constructed once by the host, initialized with the
//! host's raw configuration section, fed every inbound message, and
//! terminated at shutdown. All mutable pipeline state (resolved config,
//! compiled pattern, HTTP session) lives on the controller; there are no
//! ambient globals.
//!
//! Activation fails closed: any precondition failure (missing config,
//! disabled, empty pattern or URL, non-HTTP scheme, compile failure) leaves
//! the controller [`Disabled`](RelayState::Disabled), where every
//! [`forward_matches`](MarketRelay::forward_matches) call is a no-op. There
//! is no path back to [`Active`](RelayState::Active) short of a process
//! restart.

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::RelayConfig;
use crate::dispatch::{DispatchClient, DispatchOutcome, MatchPayload};
use crate::error::ConfigError;
use crate::event::MessageEvent;
use crate::pattern::CompiledPattern;

/// Lifecycle state of the relay pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayState {
    /// Constructed but not yet initialized.
    #[default]
    Uninitialized,
    /// Initialization succeeded; messages are being processed.
    Active,
    /// A precondition failed; the controller is inert for the process
    /// lifetime.
    Disabled,
    /// Shut down; the session has been released.
    Terminated,
}

/// The long-lived controller owning the extraction-and-forwarding pipeline.
///
/// # Concurrency
///
/// [`forward_matches`](Self::forward_matches) takes `&self`, so concurrent
/// message-handling tasks may share one controller behind an `Arc`. The
/// pooled HTTP session is read-shared; matches of a single message are
/// dispatched sequentially, and all dispatches complete before the call
/// returns.
#[derive(Debug, Default)]
pub struct MarketRelay {
    state: RelayState,
    config: Option<RelayConfig>,
    pattern: Option<CompiledPattern>,
    client: Option<DispatchClient>,
}

impl MarketRelay {
    /// Creates an uninitialized controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Returns `true` while the pipeline is processing messages.
    pub fn is_active(&self) -> bool {
        self.state == RelayState::Active
    }

    /// Resolves the raw configuration and activates the pipeline.
    ///
    /// Never panics and never surfaces an error to the host: every failed
    /// precondition is logged at its own severity and leaves the controller
    /// disabled. Calling this on anything but a fresh controller is ignored.
    pub fn initialize(&mut self, raw: &Value) {
        if self.state != RelayState::Uninitialized {
            warn!(state = ?self.state, "Ignoring repeated initialize call");
            return;
        }

        let config = match RelayConfig::resolve(raw) {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, "Relay configuration missing, pipeline disabled");
                self.state = RelayState::Disabled;
                return;
            }
        };

        if !config.enabled {
            info!("Relay switched off by configuration, not processing messages");
            self.config = Some(config);
            self.state = RelayState::Disabled;
            return;
        }

        match Self::activate(&config) {
            Ok((pattern, client)) => {
                info!(api_url = %config.api_url, "Relay pipeline active");
                self.pattern = Some(pattern);
                self.client = Some(client);
                self.config = Some(config);
                self.state = RelayState::Active;
            }
            Err(e) => {
                match e {
                    ConfigError::IncompleteField { .. } => {
                        warn!(error = %e, "Relay pipeline disabled")
                    }
                    _ => error!(error = %e, "Relay pipeline disabled"),
                }
                self.config = Some(config);
                self.state = RelayState::Disabled;
            }
        }
    }

    /// Checks the activation preconditions and acquires the pipeline
    /// resources.
    fn activate(config: &RelayConfig) -> Result<(CompiledPattern, DispatchClient), ConfigError> {
        if config.pattern.is_empty() {
            return Err(ConfigError::IncompleteField { field: "pattern" });
        }
        if config.api_url.is_empty() {
            return Err(ConfigError::IncompleteField { field: "api_url" });
        }
        if !config.has_http_scheme() {
            return Err(ConfigError::MalformedUrl {
                url: config.api_url.clone(),
            });
        }

        let pattern = CompiledPattern::compile(&config.pattern)?;
        let client = DispatchClient::new(config)?;
        Ok((pattern, client))
    }

    /// Feeds one inbound message event through the pipeline.
    pub async fn handle_event(&self, event: &impl MessageEvent) -> usize {
        self.forward_matches(event.plain_text()).await
    }

    /// Matches `text` against the pattern and dispatches every usable match,
    /// up to the configured cap.
    ///
    /// A match with unusable captures is dropped and logged; the remaining
    /// matches of the same message are unaffected. Returns the number of
    /// dispatch attempts, all of which have completed (or failed) by the
    /// time this returns. No-op unless the pipeline is active.
    pub async fn forward_matches(&self, text: &str) -> usize {
        let (Some(config), Some(pattern), Some(client)) =
            (&self.config, &self.pattern, &self.client)
        else {
            return 0;
        };

        let records = pattern.find_matches(text, config.max_matches);
        if records.is_empty() {
            debug!("No pattern match in message");
            return 0;
        }

        let mut dispatched = 0;
        for record in &records {
            let payload = match MatchPayload::extract(record, config.legacy_payload) {
                Ok(payload) => payload,
                Err(e) => {
                    error!(matched = %record.text, error = %e, "Dropping match with unusable captures");
                    continue;
                }
            };

            dispatched += 1;
            match client.dispatch(&payload).await {
                DispatchOutcome::Success(status) => {
                    info!(status, "Forwarded match to backend");
                }
                DispatchOutcome::RemoteError { status, body } => {
                    error!(status, body = %body, "Backend rejected forwarded match");
                }
                DispatchOutcome::TransportError(reason) => {
                    error!(reason = %reason, "Failed to reach backend");
                }
            }
        }

        dispatched
    }

    /// Releases the session and pattern; further calls are no-ops.
    pub fn terminate(&mut self) {
        if self.state == RelayState::Terminated {
            return;
        }

        self.client = None;
        self.pattern = None;
        self.state = RelayState::Terminated;
        info!("Relay pipeline terminated");
    }
}
