//! flagcache - Read feature flags from the command line
//!
//! Thin binary over the library: parses arguments, builds a client and runs
//! one operation. Logs go to stderr, filtered by `RUST_LOG` (default `warn`).

use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use flagcache::cli::{Cli, Command};
use flagcache::FlagClient;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

/// Runs the selected subcommand, printing results to stdout
async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.client_config()?;
    let mut client = FlagClient::new(config)?;

    match cli.command {
        Command::Get { names } => {
            for name in names {
                match client.get_flag(&name).await? {
                    Some(value) => println!("{} = {}", name, value),
                    None => println!("{} = (absent)", name),
                }
            }
        }
        Command::Enabled { name } => {
            println!("{}", client.is_enabled(&name).await?);
        }
        Command::Warm => {
            if client.is_cache_enabled() {
                client.warm_cache().await?;
                println!("Cache warmed");
            } else {
                println!("Caching is disabled, nothing to warm");
            }
        }
        Command::Clear => {
            if client.is_cache_enabled() {
                client.clear_cache();
                println!("Cache cleared");
            } else {
                println!("Caching is disabled, nothing to clear");
            }
        }
        Command::Info => print_info(&client),
    }
    Ok(())
}

fn print_info(client: &FlagClient) {
    let config = client.config();
    println!("server:      {}", config.server_url);
    println!("environment: {}", client.environment());
    println!("timeout:     {}s", config.timeout.as_secs());
    println!("cache:       {}", if client.is_cache_enabled() { "enabled" } else { "disabled" });

    let Some(status) = client.cache_status() else {
        return;
    };
    println!("cache file:  {}", status.path.display());
    println!("cache ttl:   {}s", client.cache_ttl().as_secs());
    match status.file_modified {
        Some(modified) => {
            let age = (Utc::now() - modified).num_seconds().max(0);
            println!(
                "written:     {} ({}s ago, {})",
                modified.format("%Y-%m-%d %H:%M:%S UTC"),
                age,
                if status.file_fresh { "fresh" } else { "expired" }
            );
        }
        None => println!("written:     never"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
