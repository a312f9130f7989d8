use std::fmt;

use serde::Serialize;

/// Chat platform a message is addressed to.
///
/// Known platforms get their own variant; any other configured platform
/// name is carried as [`ChannelType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum ChannelType {
    Telegram,
    Discord,
    Other(String),
}

impl ChannelType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Telegram => "telegram",
            Self::Discord => "discord",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<&str> for ChannelType {
    fn from(name: &str) -> Self {
        match name {
            "telegram" => Self::Telegram,
            "discord" => Self::Discord,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ChannelType {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<ChannelType> for String {
    fn from(channel: ChannelType) -> Self {
        match channel {
            ChannelType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl PartialEq<str> for ChannelType {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ChannelType {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
