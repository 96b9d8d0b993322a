//! Row scanning: maps result rows of the `SELECT`s in [`super::schema`]
//! onto [`crate::model`] records.
//!
//! Packed dates and times arrive already rendered as `YYYY-MM-DD` / `HH:MM`
//! strings; unset values arrive as `NULL` or `0`. Epoch columns arrive as
//! raw `REAL` seconds.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use rusqlite::Row;
use rusqlite::types::ValueRef;

use super::schema::TAG_SEPARATOR;
use crate::error::Result;
use crate::model::{Area, ChecklistItem, Parent, StartBucket, Status, Tag, Task, TaskType};

/// Scan one row of [`super::schema::task_columns`].
///
/// # Errors
///
/// Returns an error if a column has an unexpected type or a stored enum
/// code is unknown.
pub fn task(row: &Row<'_>) -> Result<Task> {
    Ok(Task {
        uuid: row.get(0)?,
        task_type: TaskType::from_code(int_or_zero(row, 1)?)?,
        title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        status: Status::from_code(int_or_zero(row, 3)?)?,
        notes: row.get::<_, Option<String>>(4)?.filter(|n| !n.is_empty()),
        start: StartBucket::from_code(int_or_zero(row, 5)?)?,
        start_date: iso_date(row, 6)?,
        deadline: iso_date(row, 7)?,
        reminder_time: iso_time(row, 8)?,
        stop_date: epoch(row, 9)?,
        created: epoch(row, 10)?,
        modified: epoch(row, 11)?,
        area: parent(row, 12, 13)?,
        project: parent(row, 14, 15)?,
        heading: parent(row, 16, 17)?,
        tags: tag_list(row, 18)?,
        index: int_or_zero(row, 19)?,
        today_index: int_or_zero(row, 20)?,
        trashed: int_or_zero(row, 21)? != 0,
    })
}

/// Scan one row of [`super::schema::area_columns`].
///
/// # Errors
///
/// Returns an error if a column has an unexpected type.
pub fn area(row: &Row<'_>) -> Result<Area> {
    Ok(Area {
        uuid: row.get(0)?,
        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        visible: int_or_zero(row, 2)? != 0,
        index: int_or_zero(row, 3)?,
        tags: tag_list(row, 4)?,
    })
}

/// Scan one row of [`super::schema::TAG_COLUMNS`].
///
/// # Errors
///
/// Returns an error if a column has an unexpected type.
pub fn tag(row: &Row<'_>) -> Result<Tag> {
    Ok(Tag {
        uuid: row.get(0)?,
        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        shortcut: row.get::<_, Option<String>>(2)?.filter(|s| !s.is_empty()),
        parent: row.get(3)?,
        index: int_or_zero(row, 4)?,
    })
}

/// Scan one row of [`super::schema::CHECKLIST_COLUMNS`].
///
/// # Errors
///
/// Returns an error if a column has an unexpected type or the status code
/// is unknown.
pub fn checklist_item(row: &Row<'_>) -> Result<ChecklistItem> {
    Ok(ChecklistItem {
        uuid: row.get(0)?,
        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        status: Status::from_code(int_or_zero(row, 2)?)?,
        stop_date: epoch(row, 3)?,
        task: row.get(4)?,
        index: int_or_zero(row, 5)?,
    })
}

fn int_or_zero(row: &Row<'_>, idx: usize) -> Result<i64> {
    Ok(row.get::<_, Option<i64>>(idx)?.unwrap_or(0))
}

/// Text of a column that may hold `NULL`, an integer sentinel or a string.
fn rendered_text(row: &Row<'_>, idx: usize) -> Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    })
}

fn iso_date(row: &Row<'_>, idx: usize) -> Result<Option<NaiveDate>> {
    Ok(rendered_text(row, idx)?
        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()))
}

fn iso_time(row: &Row<'_>, idx: usize) -> Result<Option<NaiveTime>> {
    Ok(rendered_text(row, idx)?
        .and_then(|s| NaiveTime::parse_from_str(&s, "%H:%M").ok())
        .filter(|t| *t != NaiveTime::MIN))
}

fn epoch(row: &Row<'_>, idx: usize) -> Result<Option<DateTime<Local>>> {
    let seconds = match row.get_ref(idx)? {
        ValueRef::Real(f) => f,
        #[allow(clippy::cast_precision_loss)]
        ValueRef::Integer(i) => i as f64,
        _ => return Ok(None),
    };
    Ok(epoch_to_local(seconds))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn epoch_to_local(seconds: f64) -> Option<DateTime<Local>> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    let whole = seconds.trunc();
    let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
    Local.timestamp_opt(whole as i64, nanos).single()
}

fn parent(row: &Row<'_>, uuid_idx: usize, title_idx: usize) -> Result<Option<Parent>> {
    let uuid: Option<String> = row.get(uuid_idx)?;
    let title: Option<String> = row.get(title_idx)?;
    Ok(uuid
        .filter(|u| !u.is_empty())
        .map(|uuid| Parent { uuid, title }))
}

fn tag_list(row: &Row<'_>, idx: usize) -> Result<Vec<String>> {
    Ok(row
        .get::<_, Option<String>>(idx)?
        .map(|joined| {
            joined
                .split(TAG_SEPARATOR)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default())
}
