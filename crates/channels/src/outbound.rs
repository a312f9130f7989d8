use {async_trait::async_trait, serde::Serialize};

use crate::{ChannelType, Result};

/// One platform-ready message handed to the delivery primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub text: String,
    /// Platform the message is addressed to.
    pub source: ChannelType,
}

impl OutboundMessage {
    pub fn new(text: impl Into<String>, source: impl Into<ChannelType>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
        }
    }
}

/// Send messages to a chat platform.
///
/// Implementations must resolve (or fail) in bounded time: callers await
/// every send before issuing the next one and apply no timeout of their own.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<()>;
}

#[async_trait]
impl<T: ChannelOutbound + ?Sized> ChannelOutbound for std::sync::Arc<T> {
    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        (**self).send(message).await
    }
}
