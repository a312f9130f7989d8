mod config_commands;
mod relay_commands;

use std::path::{Path, PathBuf};

use {
    chronos_config::ChronosConfig,
    clap::{Parser, Subcommand},
    config_commands::ConfigAction,
    relay_commands::OutputFormat,
    tracing::{debug, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "chronos", about = "Chronos: relay analysis results to chat platforms")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery in ./ and ~/.config/chronos/).
    #[arg(long, global = true, env = "CHRONOS_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Relay already-captured analysis output.
    Relay {
        /// Platform to format for (see `chronos platforms`).
        #[arg(short, long)]
        platform: String,
        /// File holding the process output; stdin when omitted or "-".
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Run the analysis on one image and relay its results.
    Run {
        #[arg(short, long)]
        platform: String,
        #[arg(long)]
        image: PathBuf,
        /// Requesting user id, forwarded to the analysis process.
        #[arg(long, default_value = "cli")]
        user: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List configured platforms.
    Platforms,
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries delivered messages, so logs go to stderr.
    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Load the explicit config file, or discover one.
pub(crate) fn load_config(path: Option<&Path>) -> anyhow::Result<ChronosConfig> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            chronos_config::load_config(path)
        },
        None => Ok(chronos_config::discover_and_load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "chronos starting");

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Relay {
            platform,
            input,
            format,
        } => {
            let config = load_config(config_path)?;
            relay_commands::handle_relay(&config, &platform, input, format).await
        },
        Commands::Run {
            platform,
            image,
            user,
            format,
        } => {
            let config = load_config(config_path)?;
            relay_commands::handle_run(&config, &platform, image, user, format).await
        },
        Commands::Platforms => {
            let config = load_config(config_path)?;
            relay_commands::handle_platforms(&config);
            Ok(())
        },
        Commands::Config { action } => config_commands::handle_config(action, config_path),
    }
}
