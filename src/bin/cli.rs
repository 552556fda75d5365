//! SetCache CLI Client
//!
//! Command-line interface for interacting with a SetCache server.
//! Values are sent as UTF-8 strings.

use clap::{Parser, Subcommand};
use setcache::{ClientConfig, SetCacheClient, StringSerializer, DEFAULT_PORT};
use tracing_subscriber::{fmt, EnvFilter};

/// SetCache CLI
#[derive(Parser, Debug)]
#[command(name = "setcache-cli")]
#[command(about = "CLI for the SetCache distributed set cache")]
struct Args {
    /// Server hostname
    #[arg(short = 'H', long, default_value = "localhost")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check whether a value is in the set
    Contains {
        /// The value to look up
        value: String,
    },

    /// Add a value if it is not already present
    Add {
        /// The value to add
        value: String,
    },

    /// Remove a value
    Remove {
        /// The value to remove
        value: String,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    let config = ClientConfig::builder()
        .hostname(&args.host)
        .port(args.port)
        .pool_size(1)
        .build();

    let client = match SetCacheClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let result = match &args.command {
        Commands::Contains { value } => client.contains(value.as_str(), &StringSerializer),
        Commands::Add { value } => client.add_if_absent(value.as_str(), &StringSerializer),
        Commands::Remove { value } => client.remove(value.as_str(), &StringSerializer),
    };

    match result {
        Ok(answer) => println!("{}", answer),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }
}
