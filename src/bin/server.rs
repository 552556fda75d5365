//! SetCache Server Binary
//!
//! Starts the TCP server for SetCache.

use clap::Parser;
use setcache::{Server, ServerConfig, DEFAULT_PORT};
use tracing_subscriber::{fmt, EnvFilter};

/// SetCache Server
#[derive(Parser, Debug)]
#[command(name = "setcache-server")]
#[command(about = "Distributed set cache server")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value_t = format!("0.0.0.0:{}", DEFAULT_PORT))]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Per-connection read timeout in ms (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,

    /// Per-connection write timeout in ms (0 = none)
    #[arg(long, default_value = "5000")]
    write_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,setcache=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("SetCache Server v{}", setcache::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let config = ServerConfig::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .build();

    let server = Server::new(config);
    if let Err(e) = server.start() {
        tracing::error!("Failed to start server: {}", e);
        std::process::exit(1);
    }

    // Serve until the process is terminated
    loop {
        std::thread::park();
    }
}
