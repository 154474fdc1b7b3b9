//! CLI module for Session Gate
//!
//! - `serve`: HTTP surface (default deployment mode)
//! - `sessions`: inspect and manage stored sessions

pub mod serve;
pub mod sessions;

use clap::{Parser, Subcommand};

/// Session Gate - token sessions and role-based access
#[derive(Parser)]
#[command(name = "session-gate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,

    /// Operate on sessions in the configured store
    Sessions(sessions::SessionsArgs),
}
