use std::{
    path::PathBuf,
    process::Stdio,
    time::{Duration, Instant},
};

use {
    serde::{Deserialize, Serialize},
    tokio::{process::Command, sync::RwLock, time::timeout},
    tracing::{debug, info, warn},
};

use crate::{Error, Result};

/// Bytes of stderr kept in the warning logged for a failed run.
const STDERR_TAIL_BYTES: usize = 2_000;

/// How the external analysis process is launched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunnerConfig {
    /// Program to execute (default: "python3").
    pub command: String,
    /// Arguments placed before the image path and user id.
    pub args: Vec<String>,
    /// Working directory; inherits the current one when `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
    /// Timeout for one run in milliseconds.
    pub timeout_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: "python3".into(),
            args: vec!["telegram_main.py".into()],
            work_dir: None,
            timeout_ms: 900_000,
        }
    }
}

/// One analysis request.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub image_path: PathBuf,
    /// Requesting chat user, forwarded for the producer's own bookkeeping.
    pub user_id: String,
}

impl AnalysisRequest {
    pub fn new(image_path: impl Into<PathBuf>, user_id: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            user_id: user_id.into(),
        }
    }
}

/// Captured result of one finished run.
#[derive(Debug, Clone)]
pub struct RawOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
}

impl RawOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Launches the external analysis process.
pub struct AnalysisRunner {
    config: RunnerConfig,
    /// Cached result of the availability probe.
    available: RwLock<Option<bool>>,
}

impl AnalysisRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            available: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Check whether the configured command can be found.
    pub async fn is_available(&self) -> bool {
        {
            let cached = self.available.read().await;
            if let Some(available) = *cached {
                return available;
            }
        }

        let available = match which::which(&self.config.command) {
            Ok(path) => {
                debug!(path = %path.display(), "analysis command found");
                true
            },
            Err(e) => {
                warn!(command = %self.config.command, error = %e, "analysis command not found");
                false
            },
        };
        *self.available.write().await = Some(available);
        available
    }

    /// Run the analysis for `request` and capture its output.
    ///
    /// A non-zero exit is not an error: the producer may print its result
    /// block and still fail during cleanup, so the output is returned and
    /// the caller decides whether anything in it is usable.
    pub async fn run(&self, request: &AnalysisRequest) -> Result<RawOutput> {
        if !request.image_path.exists() {
            return Err(Error::MissingInput {
                path: request.image_path.clone(),
            });
        }

        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args)
            .arg(&request.image_path)
            .arg(&request.user_id)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.work_dir {
            cmd.current_dir(dir);
        }

        info!(
            command = %self.config.command,
            image = %request.image_path.display(),
            user_id = %request.user_id,
            "starting analysis"
        );
        let started = Instant::now();
        let child = cmd.spawn().map_err(|source| Error::Spawn {
            command: self.config.command.clone(),
            source,
        })?;

        let timeout_duration = Duration::from_millis(self.config.timeout_ms);
        let output = match timeout(timeout_duration, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(timeout_ms = self.config.timeout_ms, "analysis timed out, killing process");
                return Err(Error::Timeout {
                    timeout_ms: self.config.timeout_ms,
                });
            },
        };

        let raw = RawOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
            elapsed: started.elapsed(),
        };

        if raw.success() {
            info!(
                elapsed_ms = raw.elapsed.as_millis() as u64,
                stdout_len = raw.stdout.len(),
                "analysis finished"
            );
        } else {
            warn!(
                exit_code = ?raw.exit_code,
                stderr = %tail(&raw.stderr, STDERR_TAIL_BYTES),
                "analysis exited unsuccessfully"
            );
        }
        Ok(raw)
    }
}

/// The last `max_bytes` of `text`, starting on a character boundary.
fn tail(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let start = text.len() - max_bytes;
    let start = text
        .char_indices()
        .map(|(i, _)| i)
        .find(|i| *i >= start)
        .unwrap_or(text.len());
    &text[start..]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn shell(script: &str, timeout_ms: u64) -> AnalysisRunner {
        AnalysisRunner::new(RunnerConfig {
            command: "sh".into(),
            args: vec!["-c".into(), script.into()],
            work_dir: None,
            timeout_ms,
        })
    }

    fn input_file() -> tempfile::NamedTempFile {
        tempfile::NamedTempFile::new().unwrap()
    }

    #[test]
    fn config_default() {
        let config = RunnerConfig::default();
        assert_eq!(config.command, "python3");
        assert_eq!(config.timeout_ms, 900_000);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: RunnerConfig = serde_json::from_str(r#"{ "timeout_ms": 5000 }"#).unwrap();
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.args, vec!["telegram_main.py"]);
        assert!(config.work_dir.is_none());
    }

    #[tokio::test]
    async fn missing_input_is_rejected() {
        let runner = shell("echo never", 1_000);
        let err = runner
            .run(&AnalysisRequest::new("/nonexistent/image.png", "u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingInput { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout_and_forwards_arguments() {
        let image = input_file();
        // `sh -c script a b` binds a to $0 and b to $1.
        let runner = shell("echo \"image=$0\"; echo \"user=$1\"", 5_000);
        let raw = runner
            .run(&AnalysisRequest::new(image.path(), "user-42"))
            .await
            .unwrap();
        assert!(raw.success());
        assert!(raw.stdout.contains(&format!("image={}", image.path().display())));
        assert!(raw.stdout.contains("user=user-42"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_exit_still_returns_output() {
        let image = input_file();
        let runner = shell("echo partial; echo boom >&2; exit 3", 5_000);
        let raw = runner
            .run(&AnalysisRequest::new(image.path(), "u"))
            .await
            .unwrap();
        assert!(!raw.success());
        assert_eq!(raw.exit_code, Some(3));
        assert_eq!(raw.stdout.trim(), "partial");
        assert_eq!(raw.stderr.trim(), "boom");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_process_times_out() {
        let image = input_file();
        let runner = shell("sleep 5", 100);
        let err = runner
            .run(&AnalysisRequest::new(image.path(), "u"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { timeout_ms: 100 }));
    }

    #[tokio::test]
    async fn unknown_command_fails_to_spawn() {
        let image = input_file();
        let runner = AnalysisRunner::new(RunnerConfig {
            command: "nonexistent-analysis-binary-12345".into(),
            args: Vec::new(),
            work_dir: None,
            timeout_ms: 1_000,
        });
        assert!(!runner.is_available().await);
        let err = runner
            .run(&AnalysisRequest::new(image.path(), "u"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }

    #[test]
    fn tail_respects_char_boundaries() {
        let text = format!("{}é", "a".repeat(10));
        assert_eq!(tail(&text, 1), "");
        assert_eq!(tail(&text, 2), "é");
        assert_eq!(tail("short", 100), "short");
    }
}
