//! External analysis process runner.
//!
//! Runs the analysis command once per request and hands its stdout back as
//! raw text for result-block extraction.

pub mod error;
pub mod runner;

pub use {
    error::{Error, Result},
    runner::{AnalysisRequest, AnalysisRunner, RawOutput, RunnerConfig},
};
