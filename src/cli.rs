//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure for linkwatch using clap's derive macros.

use clap::{Parser, Subcommand};

/// linkwatch - URL shortener with a destination status checker
#[derive(Parser)]
#[command(name = "linkwatch")]
#[command(version)]
#[command(about = "URL shortener that watches whether its destinations still exist", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server and background checker (default)
    Serve,

    /// Run a single destination check tick and print the report
    ///
    /// Runs regardless of `checker.enabled`.
    CheckOnce,

    /// Print a sample config.toml with all defaults
    GenerateConfig,

    /// Add or replace a short link
    Add {
        short_code: String,

        target_url: String,

        /// Relative expiration like "1d", "2h30m"
        #[arg(long)]
        expire: Option<String>,
    },

    /// Remove a short link (and its check status)
    Remove { short_code: String },

    /// List short links with their last check result
    List,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_no_subcommand() {
        let cli = Cli::try_parse_from(["linkwatch"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_config_flag_is_global() {
        let cli = Cli::try_parse_from(["linkwatch", "check-once", "-c", "/etc/lw.toml"]).unwrap();
        assert_eq!(cli.command, Some(Commands::CheckOnce));
        assert_eq!(cli.config.as_deref(), Some("/etc/lw.toml"));
    }

    #[test]
    fn test_add_with_expire() {
        let cli = Cli::try_parse_from([
            "linkwatch",
            "add",
            "docs",
            "https://example.com/docs",
            "--expire",
            "7d",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Add {
                short_code: "docs".to_string(),
                target_url: "https://example.com/docs".to_string(),
                expire: Some("7d".to_string()),
            })
        );
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["linkwatch", "tui"]).is_err());
    }
}
