#![cfg_attr(not(test), forbid(unsafe_code))]
#![deny(warnings, clippy::pedantic)]
#![allow(clippy::multiple_crate_versions)]

//! Main entry point for the Threadline backend CLI.

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use shared::config::server::Config;
use std::error::Error;
use std::path::PathBuf;

/// Main CLI structure for the Threadline server.
#[derive(Parser)]
#[command(name = "threadline-server")]
#[command(about = "Backend server for Threadline", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for the Threadline server CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Start the backend server
    Serve {
        /// The port number to bind the server to (e.g., 7000)
        #[arg(long, short)]
        port: Option<u16>,

        /// Path to the configuration file (yaml or json); defaults are used
        /// when not provided
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, config } => {
            let resolved = Config::load_config(config, port)
                .map_err(|err| -> Box<dyn Error> { Box::new(err) })?;
            server::server::run(resolved).await?;
        }
    }

    Ok(())
}
