//! Migrate command: bring the database schema up to date without serving.

use crate::db::Database;
use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;

/// Arguments for the migrate command.
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Print the applied migrations afterwards.
    #[arg(long)]
    pub list: bool,
}

/// Run the migrate command against the database at `db_path`.
pub fn run_migrate(args: &MigrateArgs, db_path: &Path) -> Result<()> {
    let db = Database::open(db_path)
        .with_context(|| format!("Failed to open database '{}'", db_path.display()))?;
    let history = db.schema_history()?;

    println!(
        "Database '{}' is at schema version {}.",
        db_path.display(),
        history.last().map(|(v, _)| *v).unwrap_or(0)
    );
    if args.list {
        for (version, name) in &history {
            println!("  V{version}  {name}");
        }
    }
    Ok(())
}
