//! Configuration validation engine.
//!
//! Detects unknown/misspelled fields, out-of-range platform profiles and
//! runner settings that would make every analysis fail.

use std::{collections::HashMap, path::Path};

use {
    chronos_results::{ChunkPolicy, PlatformProfile, chunk::part_label},
    serde_json::Value,
};

use crate::{env_subst::substitute_env, loader, schema::ChronosConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "profile", "marker", "runner",
    /// "type-error"
    pub category: &'static str,
    /// Dotted path, e.g. "platforms.discord.profile"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

enum KnownKeys {
    /// A struct with fixed field names.
    Struct(HashMap<&'static str, KnownKeys>),
    /// A map with dynamic keys (platform names) whose values have a known shape.
    Map(Box<KnownKeys>),
    /// Scalar or list value; recursion stops.
    Leaf,
}

fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Map, Struct};

    let profile = Struct(HashMap::from([
        ("policy", Leaf),
        ("max_message_length", Leaf),
        ("reserve_for_label", Leaf),
        ("breakpoint_min_fraction", Leaf),
    ]));

    let platform = Struct(HashMap::from([
        ("marker", Leaf),
        ("profile", profile),
        ("no_results_notice", Leaf),
    ]));

    let runner = Struct(HashMap::from([
        ("command", Leaf),
        ("args", Leaf),
        ("work_dir", Leaf),
        ("timeout_ms", Leaf),
    ]));

    Struct(HashMap::from([
        ("runner", runner),
        ("platforms", Map(Box::new(platform))),
    ]))
}

/// Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (*c, levenshtein(needle, c)))
        .filter(|(_, d)| *d > 0 && *d <= max_distance)
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or discover the default config
/// file location if `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = path
        .map(Path::to_path_buf)
        .or_else(loader::find_config_file);

    let Some(ref actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Info,
                "syntax",
                "",
                "no config file found; using defaults",
            )],
            config_path: None,
        };
    };

    let mut result = match std::fs::read_to_string(actual_path) {
        Ok(content) => validate_str(&substitute_env(&content), actual_path),
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("failed to read config file: {e}"),
            )],
            config_path: None,
        },
    };
    result.config_path = Some(actual_path.clone());
    result
}

/// Validate config text; `path` only selects the format by extension.
#[must_use]
pub fn validate_str(raw: &str, path: &Path) -> ValidationResult {
    let mut diagnostics = Vec::new();

    // 1. Syntax
    let value = match loader::parse_config_value(raw, path) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("syntax error: {e}"),
            ));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    // 2. Unknown fields
    check_unknown_fields(&value, &build_schema_map(), "", &mut diagnostics);

    // 3. Per-platform semantics
    if let Some(platforms) = value.get("platforms").and_then(Value::as_object) {
        if platforms.is_empty() {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "profile",
                "platforms",
                "no platforms configured; nothing can be relayed",
            ));
        }
        for (name, platform) in platforms {
            check_platform(name, platform, &mut diagnostics);
        }
    }

    // 4. Runner semantics
    if let Some(runner) = value.get("runner") {
        check_runner(runner, &mut diagnostics);
    }

    // 5. Full typed deserialization catches anything left over.
    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    if !has_errors && let Err(e) = serde_json::from_value::<ChronosConfig>(value) {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        ));
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(
    value: &Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    };
    match (value, schema) {
        (Value::Object(table), KnownKeys::Struct(fields)) => {
            let known: Vec<&str> = fields.keys().copied().collect();
            for (key, child) in table {
                let path = join(key);
                if let Some(child_schema) = fields.get(key.as_str()) {
                    check_unknown_fields(child, child_schema, &path, diagnostics);
                } else {
                    let message = match suggest(key, &known, 3) {
                        Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
                        None => "unknown field".to_string(),
                    };
                    diagnostics.push(Diagnostic::new(
                        Severity::Error,
                        "unknown-field",
                        path,
                        message,
                    ));
                }
            }
        },
        (Value::Object(table), KnownKeys::Map(value_schema)) => {
            for (key, child) in table {
                check_unknown_fields(child, value_schema, &join(key), diagnostics);
            }
        },
        _ => {},
    }
}

/// Part number whose label sizes the `reserve_for_label` check.
const LABEL_CHECK_PART: usize = 99;

fn check_platform(name: &str, platform: &Value, diagnostics: &mut Vec<Diagnostic>) {
    let path = format!("platforms.{name}");

    match platform.get("marker").and_then(Value::as_str) {
        Some(marker) if !marker.trim().is_empty() => {
            if marker.chars().any(char::is_whitespace) {
                diagnostics.push(Diagnostic::new(
                    Severity::Warning,
                    "marker",
                    format!("{path}.marker"),
                    "marker contains whitespace; the producer prints it verbatim",
                ));
            }
        },
        _ => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "marker",
            format!("{path}.marker"),
            "marker must be a non-empty string",
        )),
    }

    let Some(profile) = platform.get("profile") else {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "profile",
            format!("{path}.profile"),
            "missing profile",
        ));
        return;
    };
    match serde_json::from_value::<PlatformProfile>(profile.clone()) {
        Ok(profile) => match profile.policy() {
            ChunkPolicy::Paragraph => diagnostics.push(Diagnostic::new(
                Severity::Info,
                "profile",
                format!("{path}.profile"),
                format!(
                    "paragraph policy does not enforce max_message_length ({}); long paragraphs are left to the platform",
                    profile.max_message_length()
                ),
            )),
            ChunkPolicy::LengthBounded => {
                let label_len = part_label(LABEL_CHECK_PART).chars().count();
                if profile.reserve_for_label() < label_len {
                    diagnostics.push(Diagnostic::new(
                        Severity::Warning,
                        "profile",
                        format!("{path}.profile.reserve_for_label"),
                        format!(
                            "reserve_for_label ({}) is shorter than the part label \"{}\" ({label_len} chars); labelled parts may exceed max_message_length",
                            profile.reserve_for_label(),
                            part_label(LABEL_CHECK_PART),
                        ),
                    ));
                }
            },
        },
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "profile",
            format!("{path}.profile"),
            e.to_string(),
        )),
    }
}

fn check_runner(runner: &Value, diagnostics: &mut Vec<Diagnostic>) {
    if runner
        .get("command")
        .and_then(Value::as_str)
        .is_some_and(|c| c.trim().is_empty())
    {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "runner",
            "runner.command",
            "command must not be empty",
        ));
    }
    if runner.get("timeout_ms").and_then(Value::as_u64) == Some(0) {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "runner",
            "runner.timeout_ms",
            "timeout_ms must be greater than 0",
        ));
    }
    if let Some(dir) = runner.get("work_dir").and_then(Value::as_str)
        && !Path::new(dir).is_dir()
    {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "runner",
            "runner.work_dir",
            format!("directory does not exist: {dir}"),
        ));
    }
}
