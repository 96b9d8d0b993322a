//! `things-query show`: one task with its checklist.

use crate::output::{OutputMode, render_item};
use crate::render::TaskDetail;
use anyhow::Context;
use clap::Args;
use things_core::Database;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Uuid of the task, project or heading.
    pub uuid: String,
}

/// Load a task and its checklist items.
///
/// # Errors
///
/// Returns [`things_core::Error::NotFound`] (wrapped) when no task has the
/// uuid, or any query error.
pub fn load_detail(db: &Database, uuid: &str) -> anyhow::Result<TaskDetail> {
    let task = db
        .tasks()
        .with_uuid(uuid)
        .first()
        .with_context(|| format!("show {uuid}"))?;
    let checklist = db.checklist_items(&task.uuid)?;
    Ok(TaskDetail { task, checklist })
}

/// Run `things-query show`.
///
/// # Errors
///
/// Returns an error if the task is missing, a query fails, or output cannot
/// be written.
pub fn run_show(args: &ShowArgs, db: &Database, output: OutputMode) -> anyhow::Result<()> {
    let detail = load_detail(db, &args.uuid)?;
    render_item(&detail, output)?;
    Ok(())
}
