use std::sync::Mutex;

use {async_trait::async_trait, tracing::debug};

use crate::{ChannelOutbound, Error, OutboundMessage, Result};

/// In-memory outbound that records every delivered message.
///
/// Optionally rejects the send with the given zero-based position, which
/// makes it usable for exercising fail-fast delivery paths.
#[derive(Debug, Default)]
pub struct RecordingOutbound {
    sent: Mutex<Vec<OutboundMessage>>,
    fail_at: Option<usize>,
}

impl RecordingOutbound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the `position`-th send (zero-based) and every send after it.
    #[must_use]
    pub fn failing_at(position: usize) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_at: Some(position),
        }
    }

    /// Messages delivered so far, in send order.
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Texts delivered so far, in send order.
    pub fn texts(&self) -> Vec<String> {
        self.messages().into_iter().map(|m| m.text).collect()
    }
}

#[async_trait]
impl ChannelOutbound for RecordingOutbound {
    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        let mut sent = self.sent.lock().unwrap_or_else(|e| e.into_inner());
        if self.fail_at.is_some_and(|at| sent.len() >= at) {
            return Err(Error::unavailable(format!(
                "recording outbound rejects send #{}",
                sent.len()
            )));
        }
        debug!(source = %message.source, len = message.text.len(), "recorded outbound message");
        sent.push(message.clone());
        Ok(())
    }
}
