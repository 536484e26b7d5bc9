//! A message-filtering and forwarding bridge for chat bots.
//!
//! The bridge watches a stream of inbound chat messages, extracts structured
//! data from them with a configurable regex, and relays the extracted data to
//! an external HTTP endpoint. It deliberately owns very little: the host
//! messaging runtime delivers message events, the host's configuration layer
//! supplies raw settings, and the host drives startup and shutdown.
//!
//! # Pipeline
//!
//! ```text
//! inbound message ─► CompiledPattern ─► 0..N MatchRecord
//!                                          │ (capped by max_matches)
//!                                          ▼
//!                                    MatchPayload ─► DispatchClient ─► POST api_url
//! ```
//!
//! Every stage is owned by a single long-lived [`MarketRelay`] controller.
//! The controller activates only when the resolved configuration is complete
//! and the pattern compiles; otherwise it stays inert and every
//! [`forward_matches`](MarketRelay::forward_matches) call is a no-op.
//!
//! # Example
//!
//! ```rust,ignore
//! use market_relay::MarketRelay;
//! use serde_json::json;
//!
//! let mut relay = MarketRelay::new();
//! relay.initialize(&json!({
//!     "pattern": r"【(?P<code>[^】]+)】.*?(?P<price>\d+)块",
//!     "api_url": "https://backend.example/listings",
//! }));
//!
//! // per inbound message, from the host's event handler:
//! relay.forward_matches("【ABC123】今天特价 88块").await;
//!
//! // at host shutdown:
//! relay.terminate();
//! ```

pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod pattern;

pub use bridge::{MarketRelay, RelayState};
pub use config::RelayConfig;
pub use dispatch::{DispatchClient, DispatchOutcome, MatchPayload};
pub use error::{ConfigError, ExtractError};
pub use event::{MessageEvent, TextMessage};
pub use pattern::{CompiledPattern, MatchRecord};
