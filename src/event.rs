//! Minimal inbound-message abstraction.
//!
//! The pipeline consumes exactly one thing from the host runtime: the plain
//! text of a message. Hosts adapt their own event types by implementing
//! [`MessageEvent`]; sender identity and platform metadata stay out of the
//! core.

/// An inbound message event as seen by the relay.
pub trait MessageEvent {
    /// Plain-text body of the message, as the host runtime renders it.
    fn plain_text(&self) -> &str;
}

/// The simplest possible message event: a plain string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    text: String,
}

impl TextMessage {
    /// Wraps a message body.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl MessageEvent for TextMessage {
    fn plain_text(&self) -> &str {
        &self.text
    }
}
