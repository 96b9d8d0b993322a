//! `things-query db-path`: print the database the other commands would open.

use crate::output::{OutputMode, render};
use serde::Serialize;
use std::path::{Path, PathBuf};
use things_core::config::{self, Config};

#[derive(Debug, Serialize)]
struct Resolved {
    database: PathBuf,
    exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<PathBuf>,
}

/// Run `things-query db-path`.
///
/// # Errors
///
/// Returns an error when no path is configured and none can be discovered.
pub fn run_db_path(
    explicit: Option<&Path>,
    config: &Config,
    output: OutputMode,
) -> anyhow::Result<()> {
    let database = config::resolve_database_path(explicit, config)?;
    let resolved = Resolved {
        exists: database.is_file(),
        database,
        config_file: config::config_path().filter(|path| path.exists()),
    };
    render(output, &resolved, |r, w| {
        writeln!(w, "{}", r.database.display())
    })
}
