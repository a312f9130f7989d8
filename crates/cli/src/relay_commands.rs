use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use {
    anyhow::{Context, Result, bail},
    async_trait::async_trait,
    chronos_channels::{ChannelOutbound, OutboundMessage},
    chronos_config::{ChronosConfig, PlatformConfig},
    chronos_results::{RelayOutcome, relay},
    chronos_runner::{AnalysisRequest, AnalysisRunner},
    tokio::io::AsyncReadExt,
    tracing::{debug, error, info},
};

/// How delivered messages are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, one block per message.
    Text,
    /// One JSON object per line.
    Json,
}

/// Delivery primitive that writes each message to stdout.
pub struct StdoutOutbound {
    format: OutputFormat,
    count: AtomicUsize,
}

impl StdoutOutbound {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            count: AtomicUsize::new(0),
        }
    }

    fn render(&self, message: &OutboundMessage, position: usize) -> Result<String> {
        Ok(match self.format {
            OutputFormat::Json => serde_json::to_string(message)?,
            OutputFormat::Text => format!(
                "── message {} ({}, {} chars) ──\n{}\n",
                position + 1,
                message.source,
                message.text.chars().count(),
                message.text
            ),
        })
    }
}

#[async_trait]
impl ChannelOutbound for StdoutOutbound {
    async fn send(&self, message: &OutboundMessage) -> chronos_channels::Result<()> {
        let position = self.count.fetch_add(1, Ordering::SeqCst);
        let rendered = self
            .render(message, position)
            .map_err(chronos_channels::Error::invalid_input)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{rendered}")
            .and_then(|()| stdout.flush())
            .map_err(|e| chronos_channels::Error::external("write to stdout", e))
    }
}

fn platform<'a>(config: &'a ChronosConfig, name: &str) -> Result<&'a PlatformConfig> {
    match config.platform(name) {
        Some(platform) => Ok(platform),
        None => bail!(
            "unknown platform \"{name}\" (configured: {})",
            config.platform_names().join(", ")
        ),
    }
}

async fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("failed to read stdin")?;
            Ok(raw)
        },
    }
}

async fn relay_raw(
    raw: &str,
    platform_name: &str,
    platform: &PlatformConfig,
    format: OutputFormat,
) -> Result<RelayOutcome> {
    let markers = platform.markers()?;
    let dispatcher = platform.dispatcher(platform_name);
    debug!(
        platform = %dispatcher.source(),
        policy = %dispatcher.profile().policy(),
        max_message_length = dispatcher.profile().max_message_length(),
        "dispatching to stdout"
    );
    let outbound = StdoutOutbound::new(format);
    let outcome = relay(raw, &markers, &dispatcher, &outbound).await?;
    if outcome.is_empty() {
        info!(platform = platform_name, "sent the no-results notice");
    }
    report(&outcome);
    Ok(outcome)
}

fn report(outcome: &RelayOutcome) {
    match outcome {
        RelayOutcome::Delivered { records } => eprintln!("Delivered {records} record(s)."),
        RelayOutcome::NoBlockFound => {
            eprintln!("No result block found in the process output.")
        },
        RelayOutcome::EmptyRecordSet => {
            eprintln!("Result block found, but it held no complete records.")
        },
    }
}

/// `chronos relay`: relay already-captured process output.
pub async fn handle_relay(
    config: &ChronosConfig,
    platform_name: &str,
    input: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let platform = platform(config, platform_name)?;
    let raw = read_input(input.as_deref()).await?;
    info!(platform = platform_name, raw_len = raw.len(), "relaying captured output");
    relay_raw(&raw, platform_name, platform, format).await?;
    Ok(())
}

/// `chronos run`: run the analysis on one image, then relay its output.
pub async fn handle_run(
    config: &ChronosConfig,
    platform_name: &str,
    image: PathBuf,
    user_id: String,
    format: OutputFormat,
) -> Result<()> {
    let platform = platform(config, platform_name)?;
    let runner = AnalysisRunner::new(config.runner.clone());

    if !runner.is_available().await {
        bail!("analysis command not found: {}", runner.config().command);
    }

    let request = AnalysisRequest::new(image, user_id);
    let raw = match runner.run(&request).await {
        Ok(raw) => raw,
        Err(e) => {
            error!(platform = platform_name, error = %e, "analysis failed");
            let notice = OutboundMessage::new(format!("Analysis failed: {e}"), platform_name);
            StdoutOutbound::new(format).send(&notice).await?;
            return Err(e.into());
        },
    };

    relay_raw(&raw.stdout, platform_name, platform, format).await?;
    Ok(())
}

/// `chronos platforms`: list configured delivery targets.
pub fn handle_platforms(config: &ChronosConfig) {
    for (name, platform) in &config.platforms {
        let profile = &platform.profile;
        println!(
            "{name:<12} marker={:<10} policy={:<15} max={} reserve={} breakpoint>={}",
            platform.marker,
            profile.policy().to_string(),
            profile.max_message_length(),
            profile.reserve_for_label(),
            profile.breakpoint_min_fraction(),
        );
    }
}
