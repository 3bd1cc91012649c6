//! EmberKV server binary.
//!
//! Parses command-line arguments, installs logging and the shutdown signal
//! handler, and runs the event loop until interrupted.

use clap::Parser;
use emberkv::{Config, Server};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Arena-backed in-memory key-value server
#[derive(Parser, Debug)]
#[command(name = "emberkv")]
#[command(about = "Arena-backed in-memory key-value server")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = emberkv::DEFAULT_HOST)]
    host: String,

    /// Port to listen on (0 lets the kernel pick)
    #[arg(short, long, default_value_t = emberkv::DEFAULT_PORT)]
    port: u16,

    /// Value-arena capacity in MiB
    #[arg(long, default_value_t = 64)]
    arena_capacity_mb: usize,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();
    let config = Config {
        host: args.host,
        port: args.port,
        arena_capacity: args.arena_capacity_mb * 1024 * 1024,
    };

    info!(version = emberkv::VERSION, "starting emberkv");

    let mut server = Server::bind(&config)?;

    let shutdown = server.shutdown_handle();
    ctrlc::set_handler(move || {
        info!("shutdown signal received");
        shutdown.shutdown();
    })?;

    server.run()?;
    info!("server stopped");
    Ok(())
}
