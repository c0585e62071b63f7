//! relayircd - Main binary

use clap::Parser;
use relayircd_core::{Config, EventLoop};
use std::path::PathBuf;
use tracing::info;

/// relayircd - A single-reactor IRC-style chat relay
#[derive(Parser)]
#[command(name = "relayircd")]
#[command(about = "A single-reactor IRC-style chat relay")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Password clients must send with PASS
    #[arg(value_parser = parse_password)]
    password: String,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Address to bind, overriding the configuration file
    #[arg(short, long)]
    bind: Option<String>,
}

fn parse_password(value: &str) -> Result<String, String> {
    if value.is_empty() {
        return Err("password cannot be empty".to_string());
    }
    if value.contains(' ') || value.contains('\t') {
        return Err("password cannot contain spaces or tabs".to_string());
    }
    Ok(value.to_string())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level)?;

    // Load configuration
    let mut config = match cli.config {
        Some(ref path) => {
            info!("Loading configuration from {:?}", path);
            Config::from_file(path)?
        }
        None => Config::default(),
    };
    config.connection.port = cli.port;
    config.security.password = Some(cli.password);
    if let Some(bind) = cli.bind {
        config.connection.bind_address = bind;
    }

    // Validate configuration
    config.validate()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        info!("Starting relayircd {}...", env!("CARGO_PKG_VERSION"));
        let event_loop = EventLoop::bind(config).await?;
        event_loop
            .run_until(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await?;
        Ok::<_, anyhow::Error>(())
    })
}

/// Initialize logging
fn init_logging(level: &str) -> anyhow::Result<()> {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    Ok(())
}
