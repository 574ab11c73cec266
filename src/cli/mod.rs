//! CLI definitions for todo-board.
//!
//! Flags given here override every configuration tier.

pub mod migrate;

use clap::{Parser, Subcommand};
use migrate::MigrateArgs;

/// Single-user task board served over HTTP
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Interface to bind (overrides config)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to bind (overrides config)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web server (default if no subcommand given)
    Serve,

    /// Create or upgrade the database schema, then exit
    Migrate(MigrateArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve_with_stderr_logging() {
        let cli = Cli::try_parse_from(["todo-board"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
        assert!(!cli.verbose);
        assert!(cli.port.is_none());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["todo-board", "serve", "--port", "9000", "--host", "0.0.0.0"])
                .unwrap();
        assert!(matches!(cli.command, Some(Command::Serve)));
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.host.as_deref(), Some("0.0.0.0"));
    }

    #[test]
    fn migrate_accepts_list_flag() {
        let cli = Cli::try_parse_from(["todo-board", "migrate", "--list", "-d", "x.db"]).unwrap();
        match cli.command {
            Some(Command::Migrate(args)) => assert!(args.list),
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.database.as_deref(), Some("x.db"));
    }
}
