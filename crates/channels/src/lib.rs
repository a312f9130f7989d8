//! Outbound delivery primitive shared by every chat platform.
//!
//! A platform adapter implements [`ChannelOutbound`]; the relay hands it one
//! [`OutboundMessage`] at a time and awaits each send before the next.

pub mod channel_type;
pub mod error;
pub mod outbound;
pub mod recording;

pub use {
    channel_type::ChannelType,
    error::{Error, Result},
    outbound::{ChannelOutbound, OutboundMessage},
    recording::RecordingOutbound,
};
