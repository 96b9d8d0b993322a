//! `things-query tags`: list tags.

use crate::output::{OutputMode, render_list};
use clap::Args;
use things_core::Database;

#[derive(Args, Debug)]
pub struct TagsArgs {
    /// Only tags attached to this area uuid.
    #[arg(long, conflicts_with = "task")]
    pub area: Option<String>,

    /// Only tags attached to this task uuid.
    #[arg(long)]
    pub task: Option<String>,

    /// Maximum tags to show.
    #[arg(short = 'n', long)]
    pub limit: Option<u32>,
}

/// Run `things-query tags`.
///
/// # Errors
///
/// Returns an error if the query fails or output cannot be written.
pub fn run_tags(args: &TagsArgs, db: &Database, output: OutputMode) -> anyhow::Result<()> {
    let mut query = db.tags();
    if let Some(ref area) = args.area {
        query = query.in_area(area.as_str());
    }
    if let Some(ref task) = args.task {
        query = query.in_task(task.as_str());
    }
    if let Some(limit) = args.limit {
        query = query.limit(limit);
    }
    render_list(&query.all()?, output)?;
    Ok(())
}
