/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Profile values are out of range.
    #[error("invalid platform profile: {message}")]
    InvalidProfile { message: String },

    /// Start/end markers cannot form a result-block pattern.
    #[error("invalid result markers: {message}")]
    InvalidMarkers { message: String },

    /// The delivery primitive rejected a message; nothing further was sent.
    #[error("delivery failed after {records_sent} record(s)")]
    Delivery {
        records_sent: usize,
        #[source]
        source: chronos_channels::Error,
    },
}

impl Error {
    #[must_use]
    pub fn invalid_profile(message: impl Into<String>) -> Self {
        Self::InvalidProfile {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_markers(message: impl Into<String>) -> Self {
        Self::InvalidMarkers {
            message: message.into(),
        }
    }

    /// Whether this error came from the delivery primitive.
    #[must_use]
    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivery { .. })
    }
}
