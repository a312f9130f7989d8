//! Turns the raw stdout of the analysis process into chat messages.
//!
//! The pipeline is strictly forward: [`extract`] isolates the result block,
//! [`parse`] reads it into [`Record`]s, [`chunk`] re-flows each answer for a
//! [`PlatformProfile`], and [`Dispatcher`] delivers the fragments in order.
//! [`relay`] runs all four for one invocation.

pub mod chunk;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod parse;
pub mod profile;
pub mod relay;

pub use {
    chunk::{Fragment, chunk},
    dispatch::{DEFAULT_NO_RESULTS_NOTICE, Dispatcher, RECORD_SEPARATOR},
    error::{Error, Result},
    extract::{ResultBlock, ResultMarkers, extract},
    parse::{Record, parse},
    profile::{ChunkPolicy, PlatformProfile},
    relay::{RelayOutcome, relay},
};
