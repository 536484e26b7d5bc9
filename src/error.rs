//! Error types for the relay pipeline.

use thiserror::Error;

/// Errors that keep the pipeline from activating.
///
/// Every variant maps to one disabling condition checked during
/// [`MarketRelay::initialize`](crate::MarketRelay::initialize). None of them
/// is fatal to the host process; the controller logs the error and stays
/// inert for the rest of the process lifetime.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No raw configuration was supplied at all.
    #[error("no configuration was supplied")]
    Missing,

    /// A required field resolved to an empty string.
    #[error("required field `{field}` is empty")]
    IncompleteField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// The endpoint URL does not carry an HTTP scheme.
    #[error("api_url must start with http:// or https://, got `{url}`")]
    MalformedUrl {
        /// The rejected URL.
        url: String,
    },

    /// The configured pattern is not a valid regex.
    #[error("pattern failed to compile: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The pooled HTTP client could not be constructed.
    #[error("failed to build HTTP session: {0}")]
    Session(String),
}

/// Errors that drop a single match without touching the rest of the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The match has neither `code`/`price` named captures nor two
    /// positional captures to fall back to.
    #[error("match has neither `code`/`price` named captures nor two positional captures")]
    InsufficientCaptures,

    /// The `price` capture is not parseable as an integer.
    #[error("price capture is not an integer: `{0}`")]
    PriceNotInteger(String),
}
