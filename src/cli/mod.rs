//! CLI module - Command-line interface for Postwall
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Postwall - a small social network backend
#[derive(Parser)]
#[command(name = "postwall")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run migrations and start the HTTP server (default)
    #[command(alias = "web")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Create a user account
    CreateUser {
        email: String,
        password: String,
        username: String,
        /// Grant superuser rights
        #[arg(long)]
        superuser: bool,
    },
}

pub use commands::*;
