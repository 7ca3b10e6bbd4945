//! PollKV Server Binary
//!
//! Starts the single-threaded TCP server.

use clap::Parser;
use pollkv::{Config, Server};
use tracing_subscriber::{fmt, EnvFilter};

/// PollKV Server
#[derive(Parser, Debug)]
#[command(name = "pollkv-server")]
#[command(about = "Single-threaded, event-driven key-value server")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    listen: String,

    /// Maximum frame body size in bytes
    #[arg(long, default_value = "4096")]
    max_frame_size: usize,

    /// Upper bound on each readiness wait, in milliseconds
    #[arg(long, default_value = "1000")]
    poll_timeout_ms: u64,

    /// Readiness events handled per wait
    #[arg(long, default_value = "1024")]
    event_capacity: usize,

    /// Leave Nagle's algorithm enabled on client sockets
    #[arg(long)]
    no_nodelay: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pollkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    tracing::info!("PollKV Server v{}", pollkv::VERSION);
    tracing::info!("Listen address: {}", args.listen);
    tracing::info!("Max frame size: {} bytes", args.max_frame_size);

    // Build config from args
    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_frame_size(args.max_frame_size)
        .poll_timeout_ms(args.poll_timeout_ms)
        .event_capacity(args.event_capacity)
        .nodelay(!args.no_nodelay)
        .build();

    let mut server = match Server::bind(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
