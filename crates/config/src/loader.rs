use std::path::{Path, PathBuf};

use {
    anyhow::Context,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::ChronosConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "chronos.toml",
    "chronos.yaml",
    "chronos.yml",
    "chronos.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<ChronosConfig> {
    let raw = read_substituted(path)?;
    parse_config(&raw, path).with_context(|| format!("failed to parse {}", path.display()))
}

fn read_substituted(path: &Path) -> anyhow::Result<String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    Ok(substitute_env(&raw))
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./chronos.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/chronos/chronos.{toml,yaml,yml,json}` (user-global)
///
/// Returns `ChronosConfig::default()` if no config file is found or the
/// file fails to load.
pub fn discover_and_load() -> ChronosConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    ChronosConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    if let Some(path) = find_in_dir(Path::new(".")) {
        return Some(path);
    }
    config_dir().and_then(|dir| find_in_dir(&dir))
}

fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/chronos/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "chronos").map(|d| d.config_dir().to_path_buf())
}

/// Render `config` as pretty TOML.
pub fn to_toml(config: &ChronosConfig) -> anyhow::Result<String> {
    toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("serialize config: {e}"))
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("toml")
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<ChronosConfig> {
    match extension(path) {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        ext => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

pub(crate) fn parse_config_value(raw: &str, path: &Path) -> anyhow::Result<serde_json::Value> {
    match extension(path) {
        "toml" => {
            let v: toml::Value = toml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "yaml" | "yml" => {
            let v: serde_yaml::Value = serde_yaml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "json" => Ok(serde_json::from_str(raw)?),
        ext => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, chronos_results::ChunkPolicy};

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chronos.toml");
        std::fs::write(
            &path,
            r#"
[platforms.telegram]
marker = "TELEGRAM"
[platforms.telegram.profile]
max_message_length = 4000
"#,
        )
        .unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(
            cfg.platform("telegram").unwrap().profile.policy(),
            ChunkPolicy::Paragraph
        );
    }

    #[test]
    fn loads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chronos.yaml");
        std::fs::write(
            &path,
            "runner:\n  command: python3\n  timeout_ms: 5000\nplatforms:\n  discord:\n    marker: DISCORD\n    profile:\n      policy: length_bounded\n      max_message_length: 1900\n      reserve_for_label: 50\n      breakpoint_min_fraction: 0.7\n",
        )
        .unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.runner.timeout_ms, 5000);
        assert_eq!(cfg.platform("discord").unwrap().profile.budget(), 1850);
    }

    #[test]
    fn loads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chronos.json");
        std::fs::write(&path, r#"{ "runner": { "command": "analyze" } }"#).unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.runner.command, "analyze");
        // Platforms fall back to the built-in pair.
        assert_eq!(cfg.platform_names(), vec!["discord", "telegram"]);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chronos.ini");
        std::fs::write(&path, "x=1").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("unsupported config format"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_config(Path::new("/nonexistent/chronos.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/chronos.toml"));
    }

    #[test]
    fn parse_error_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chronos.toml");
        std::fs::write(&path, "[platforms.telegram\nmarker = 1\n").unwrap();
        let err = load_config(&path).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("chronos.toml"), "{message}");
        assert!(message.contains("failed to parse"), "{message}");
    }

    #[test]
    fn rendered_toml_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chronos.toml");
        std::fs::write(&path, to_toml(&ChronosConfig::default()).unwrap()).unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.platforms, ChronosConfig::default().platforms);
    }

    #[test]
    fn finds_first_supported_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("chronos.yaml"), "{}").unwrap();
        std::fs::write(dir.path().join("chronos.json"), "{}").unwrap();
        let found = find_in_dir(dir.path()).unwrap();
        assert!(found.ends_with("chronos.yaml"));
    }
}
