use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How an answer is split into messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkPolicy {
    /// One message per paragraph, no hard length bound.
    #[default]
    Paragraph,
    /// Messages capped at `max_message_length`, cut at sentence breaks when
    /// one falls late enough in the window.
    LengthBounded,
}

impl std::fmt::Display for ChunkPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paragraph => write!(f, "paragraph"),
            Self::LengthBounded => write!(f, "length_bounded"),
        }
    }
}

/// Length and splitting behaviour of one delivery target.
///
/// Immutable once built; every constructor validates its ranges, including
/// deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProfile", into = "RawProfile")]
pub struct PlatformProfile {
    max_message_length: usize,
    reserve_for_label: usize,
    breakpoint_min_fraction: f64,
    policy: ChunkPolicy,
}

/// Telegram caps messages at 4096; a little headroom is kept.
const TELEGRAM_MAX_MESSAGE_LEN: usize = 4000;

/// Discord caps messages at 2000.
const DISCORD_MAX_MESSAGE_LEN: usize = 1900;
const DISCORD_LABEL_RESERVE: usize = 50;
const DISCORD_BREAKPOINT_MIN_FRACTION: f64 = 0.7;

impl PlatformProfile {
    pub fn new(
        policy: ChunkPolicy,
        max_message_length: usize,
        reserve_for_label: usize,
        breakpoint_min_fraction: f64,
    ) -> Result<Self> {
        if max_message_length == 0 {
            return Err(Error::invalid_profile("max_message_length must be > 0"));
        }
        if !(0.0..=1.0).contains(&breakpoint_min_fraction) {
            return Err(Error::invalid_profile(format!(
                "breakpoint_min_fraction must be within [0, 1], got {breakpoint_min_fraction}"
            )));
        }
        if policy == ChunkPolicy::LengthBounded && reserve_for_label >= max_message_length {
            return Err(Error::invalid_profile(format!(
                "reserve_for_label ({reserve_for_label}) must be below max_message_length ({max_message_length})"
            )));
        }
        Ok(Self {
            max_message_length,
            reserve_for_label,
            breakpoint_min_fraction,
            policy,
        })
    }

    /// Paragraph-per-message profile.
    pub fn paragraph(max_message_length: usize) -> Result<Self> {
        Self::new(ChunkPolicy::Paragraph, max_message_length, 0, 0.0)
    }

    /// Length-bounded profile with sentence-aware breakpoints.
    pub fn length_bounded(
        max_message_length: usize,
        reserve_for_label: usize,
        breakpoint_min_fraction: f64,
    ) -> Result<Self> {
        Self::new(
            ChunkPolicy::LengthBounded,
            max_message_length,
            reserve_for_label,
            breakpoint_min_fraction,
        )
    }

    /// The profile used for Telegram delivery.
    #[must_use]
    pub fn telegram() -> Self {
        Self {
            max_message_length: TELEGRAM_MAX_MESSAGE_LEN,
            reserve_for_label: 0,
            breakpoint_min_fraction: 0.0,
            policy: ChunkPolicy::Paragraph,
        }
    }

    /// The profile used for Discord delivery.
    #[must_use]
    pub fn discord() -> Self {
        Self {
            max_message_length: DISCORD_MAX_MESSAGE_LEN,
            reserve_for_label: DISCORD_LABEL_RESERVE,
            breakpoint_min_fraction: DISCORD_BREAKPOINT_MIN_FRACTION,
            policy: ChunkPolicy::LengthBounded,
        }
    }

    pub fn max_message_length(&self) -> usize {
        self.max_message_length
    }

    pub fn reserve_for_label(&self) -> usize {
        self.reserve_for_label
    }

    pub fn breakpoint_min_fraction(&self) -> f64 {
        self.breakpoint_min_fraction
    }

    pub fn policy(&self) -> ChunkPolicy {
        self.policy
    }

    /// Characters available to answer text in one length-bounded message.
    pub fn budget(&self) -> usize {
        self.max_message_length
            .saturating_sub(self.reserve_for_label)
            .max(1)
    }
}

/// Wire shape of [`PlatformProfile`], validated on conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawProfile {
    #[serde(default)]
    policy: ChunkPolicy,
    max_message_length: usize,
    #[serde(default)]
    reserve_for_label: usize,
    #[serde(default)]
    breakpoint_min_fraction: f64,
}

impl TryFrom<RawProfile> for PlatformProfile {
    type Error = Error;

    fn try_from(raw: RawProfile) -> Result<Self> {
        Self::new(
            raw.policy,
            raw.max_message_length,
            raw.reserve_for_label,
            raw.breakpoint_min_fraction,
        )
    }
}

impl From<PlatformProfile> for RawProfile {
    fn from(profile: PlatformProfile) -> Self {
        Self {
            policy: profile.policy,
            max_message_length: profile.max_message_length,
            reserve_for_label: profile.reserve_for_label,
            breakpoint_min_fraction: profile.breakpoint_min_fraction,
        }
    }
}
