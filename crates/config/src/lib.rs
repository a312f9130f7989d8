//! Configuration loading, validation and env substitution.
//!
//! Config files: `chronos.toml`, `chronos.yaml` or `chronos.json`,
//! searched in `./` then `~/.config/chronos/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in all
//! string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{config_dir, discover_and_load, find_config_file, load_config},
    schema::{ChronosConfig, PlatformConfig, RunnerConfig},
    validate::{Diagnostic, Severity, ValidationResult},
};
