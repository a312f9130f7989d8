use std::error::Error as StdError;

/// Crate-wide result type for delivery operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed delivery errors surfaced by platform adapters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The message was rejected before reaching the platform.
    #[error("invalid outbound message: {message}")]
    InvalidInput { message: String },

    /// The platform is not reachable or not configured.
    #[error("channel unavailable: {message}")]
    Unavailable { message: String },

    /// Wrapped source error from the platform client.
    #[error("delivery failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
