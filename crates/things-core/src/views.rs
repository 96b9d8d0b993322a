//! Derived lists the Things app computes implicitly.
//!
//! Unless noted, a view lists incomplete to-dos that are not trashed
//! themselves or through their project or heading. Views that merge several
//! queries run them one after another and sort the merged result with a
//! stable sort, so rows with equal keys keep their query order.

use chrono::{Local, NaiveDate, TimeDelta};
use std::cmp::{Ordering, Reverse};
use std::time::Duration;
use tracing::debug;

use crate::db::Database;
use crate::error::Result;
use crate::model::{Status, Task};
use crate::query::{TaskOrder, TaskQuery};

/// The view every other view narrows.
fn open_todos(db: &Database) -> TaskQuery<'_> {
    db.tasks()
        .type_()
        .todo()
        .status()
        .incomplete()
        .context_trashed(false)
}

/// Ascending with unset dates last.
fn unset_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn today_order(a: &Task, b: &Task) -> Ordering {
    a.today_index
        .cmp(&b.today_index)
        .then_with(|| unset_last::<NaiveDate>(a.start_date, b.start_date))
}

/// Descending with unset dates last.
fn stop_date_desc(a: &Task, b: &Task) -> Ordering {
    unset_last(a.stop_date.map(Reverse), b.stop_date.map(Reverse))
}

/// Today: scheduled to-dos in Anytime, Someday to-dos whose start date has
/// arrived, and unscheduled to-dos whose deadline has passed (unless the
/// overdue warning was dismissed).
///
/// # Errors
///
/// Returns the first error from any of the three underlying queries.
pub fn today(db: &Database) -> Result<Vec<Task>> {
    let scheduled = open_todos(db)
        .start()
        .anytime()
        .start_date()
        .exists(true)
        .all()?;
    let unconfirmed = open_todos(db).start().someday().start_date().past().all()?;
    let overdue = open_todos(db)
        .start_date()
        .exists(false)
        .deadline()
        .past()
        .deadline_suppressed(false)
        .all()?;
    debug!(
        scheduled = scheduled.len(),
        unconfirmed = unconfirmed.len(),
        overdue = overdue.len(),
        "today"
    );

    let mut tasks = scheduled;
    tasks.extend(unconfirmed);
    tasks.extend(overdue);
    tasks.sort_by(today_order);
    Ok(tasks)
}

/// Someday to-dos with a start date after today, soonest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn upcoming(db: &Database) -> Result<Vec<Task>> {
    open_todos(db)
        .start()
        .someday()
        .start_date()
        .future()
        .order_by(TaskOrder::StartDate)
        .all()
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn inbox(db: &Database) -> Result<Vec<Task>> {
    open_todos(db).start().inbox().all()
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn anytime(db: &Database) -> Result<Vec<Task>> {
    open_todos(db).start().anytime().all()
}

/// Someday to-dos without a start date.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn someday(db: &Database) -> Result<Vec<Task>> {
    open_todos(db).start().someday().start_date().exists(false).all()
}

/// Completed and canceled tasks of any type, most recently closed first.
///
/// # Errors
///
/// Returns the first error from either underlying query.
pub fn logbook(db: &Database) -> Result<Vec<Task>> {
    let mut tasks = closed_any_type(db, Status::Completed)?;
    tasks.extend(closed_any_type(db, Status::Canceled)?);
    tasks.sort_by(stop_date_desc);
    Ok(tasks)
}

fn closed_any_type(db: &Database, status: Status) -> Result<Vec<Task>> {
    db.tasks()
        .status()
        .is(status)
        .context_trashed(false)
        .order_by(TaskOrder::StopDateDesc)
        .all()
}

/// Completed to-dos, most recently completed first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn completed(db: &Database) -> Result<Vec<Task>> {
    open_todos(db)
        .status()
        .completed()
        .order_by(TaskOrder::StopDateDesc)
        .all()
}

/// Canceled to-dos, most recently canceled first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn canceled(db: &Database) -> Result<Vec<Task>> {
    open_todos(db)
        .status()
        .canceled()
        .order_by(TaskOrder::StopDateDesc)
        .all()
}

/// To-dos trashed themselves, whatever their status.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn trash(db: &Database) -> Result<Vec<Task>> {
    db.tasks().type_().todo().trashed(true).all()
}

/// Open to-dos with a deadline, earliest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn deadlines(db: &Database) -> Result<Vec<Task>> {
    open_todos(db)
        .deadline()
        .exists(true)
        .order_by(TaskOrder::Deadline)
        .all()
}

/// Open to-dos created within `window` of now, newest first.
///
/// A window too large to subtract from the current time matches every
/// task.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn created_within(db: &Database, window: Duration) -> Result<Vec<Task>> {
    let since = TimeDelta::from_std(window)
        .ok()
        .and_then(|delta| Local::now().checked_sub_signed(delta));
    let query = open_todos(db).order_by(TaskOrder::CreatedDesc);
    match since {
        Some(since) => query.created_after(&since).all(),
        None => query.all(),
    }
}

/// Open to-dos whose title, notes or area title contain `text`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn search(db: &Database, text: &str) -> Result<Vec<Task>> {
    open_todos(db).search(text).all()
}
