//! PollKV CLI Client
//!
//! Command-line interface for interacting with PollKV.

use clap::{Parser, Subcommand};
use pollkv::protocol::{Response, DEFAULT_MAX_FRAME_SIZE};
use pollkv::Client;
use tracing_subscriber::{fmt, EnvFilter};

/// PollKV CLI
#[derive(Parser, Debug)]
#[command(name = "pollkv-cli")]
#[command(about = "CLI for the PollKV key-value server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Maximum frame body size in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    max_frame_size: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Send an arbitrary argument vector
    Raw {
        /// Command name followed by its arguments
        #[arg(required = true, num_args = 1..)]
        args: Vec<String>,
    },
}

impl Commands {
    fn into_argv(self) -> Vec<String> {
        match self {
            Commands::Get { key } => vec!["get".to_string(), key],
            Commands::Set { key, value } => vec!["set".to_string(), key, value],
            Commands::Del { key } => vec!["del".to_string(), key],
            Commands::Raw { args } => args,
        }
    }
}

fn print_response(response: &Response) {
    println!(
        "server says: [{}] {}",
        response.status.code(),
        String::from_utf8_lossy(&response.payload)
    );
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let argv = args.command.into_argv();

    let mut client = match Client::connect(&args.server, args.max_frame_size) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    match client.query(argv.as_slice()) {
        Ok(response) => print_response(&response),
        Err(e) => {
            tracing::error!("Request failed: {}", e);
            std::process::exit(1);
        }
    }
}
