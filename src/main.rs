//! Native messaging host binary entry point.
//!
//! Launched by the browser, speaking the native messaging protocol over
//! stdin/stdout. All logging goes to stderr; stdout carries protocol frames
//! only.

use clap::Parser;
use dartium_messaging::HostConfig;

/// Command line arguments for the messaging host.
///
/// The wire behavior consults none of these; they exist for operators and
/// default to the bare behavior. Browsers pass their own positional
/// arguments (the extension origin) when starting a host, which are
/// accepted and ignored.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (JSON or TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Arguments the browser passes to native messaging hosts; ignored
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    browser_args: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = if let Some(config_path) = &args.config {
        HostConfig::from_file(config_path)?
    } else {
        HostConfig::default()
    };
    config.validate()?;

    let log_level = match args
        .log_level
        .as_deref()
        .unwrap_or(&config.log_level)
        .to_lowercase()
        .as_str()
    {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    // stdout belongs to the protocol; logs must not touch it.
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Dartium messaging host starting");
    if !args.browser_args.is_empty() {
        tracing::debug!(browser_args = ?args.browser_args, "ignoring browser arguments");
    }

    dartium_messaging::run_host(config).await
}
