//! Builds throwaway Things databases for integration tests.

#![allow(dead_code)]

use chrono::{Local, NaiveDate, TimeDelta, TimeZone};
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use things_core::Database;
use things_core::date::date_to_things_date;
use things_core::db::schema::THINGS_SCHEMA_SQL;

pub const TODO: i64 = 0;
pub const PROJECT: i64 = 1;
pub const HEADING: i64 = 2;

pub const INCOMPLETE: i64 = 0;
pub const CANCELED: i64 = 2;
pub const COMPLETED: i64 = 3;

pub const INBOX: i64 = 0;
pub const ANYTIME: i64 = 1;
pub const SOMEDAY: i64 = 2;

/// One `TMTask` row. Unset fields are stored as `NULL`.
#[derive(Debug, Clone, Default)]
pub struct TaskRow {
    pub uuid: String,
    pub title: String,
    pub kind: i64,
    pub status: i64,
    pub start: i64,
    pub start_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub deadline_suppressed: bool,
    pub reminder_time: Option<i64>,
    pub stop_date: Option<f64>,
    pub creation_date: Option<f64>,
    pub notes: Option<String>,
    pub trashed: bool,
    pub area: Option<String>,
    pub project: Option<String>,
    pub heading: Option<String>,
    pub index: i64,
    pub today_index: i64,
}

impl TaskRow {
    /// An incomplete Anytime to-do titled after its uuid.
    pub fn todo(uuid: &str) -> Self {
        Self {
            uuid: uuid.to_string(),
            title: uuid.to_string(),
            kind: TODO,
            status: INCOMPLETE,
            start: ANYTIME,
            ..Self::default()
        }
    }

    pub fn project(uuid: &str) -> Self {
        Self {
            kind: PROJECT,
            ..Self::todo(uuid)
        }
    }

    pub fn heading(uuid: &str, project: &str) -> Self {
        Self {
            kind: HEADING,
            project: Some(project.to_string()),
            ..Self::todo(uuid)
        }
    }
}

pub struct Fixture {
    _dir: TempDir,
    path: PathBuf,
    conn: Connection,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("main.sqlite");
        let conn = Connection::open(&path).expect("create fixture db");
        conn.execute_batch(THINGS_SCHEMA_SQL).expect("apply schema");
        Self {
            _dir: dir,
            path,
            conn,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open(&self) -> Database {
        Database::open(&self.path).expect("open fixture read-only")
    }

    pub fn task(&self, row: &TaskRow) -> &Self {
        let packed = |d: Option<NaiveDate>| d.map(date_to_things_date);
        self.conn
            .execute(
                "INSERT INTO TMTask (uuid, title, type, status, start, startDate, deadline,
                     deadlineSuppressionDate, reminderTime, stopDate, creationDate, notes,
                     trashed, area, project, heading, \"index\", todayIndex)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                     ?17, ?18)",
                params![
                    row.uuid,
                    row.title,
                    row.kind,
                    row.status,
                    row.start,
                    packed(row.start_date),
                    packed(row.deadline),
                    row.deadline_suppressed.then(|| date_to_things_date(today())),
                    row.reminder_time,
                    row.stop_date,
                    row.creation_date,
                    row.notes,
                    i64::from(row.trashed),
                    row.area,
                    row.project,
                    row.heading,
                    row.index,
                    row.today_index,
                ],
            )
            .expect("insert task");
        self
    }

    pub fn area(&self, uuid: &str, title: &str, index: i64) -> &Self {
        self.conn
            .execute(
                "INSERT INTO TMArea (uuid, title, visible, \"index\") VALUES (?1, ?2, 1, ?3)",
                params![uuid, title, index],
            )
            .expect("insert area");
        self
    }

    pub fn tag(&self, uuid: &str, title: &str, index: i64) -> &Self {
        self.conn
            .execute(
                "INSERT INTO TMTag (uuid, title, \"index\") VALUES (?1, ?2, ?3)",
                params![uuid, title, index],
            )
            .expect("insert tag");
        self
    }

    pub fn tag_task(&self, task: &str, tag: &str) -> &Self {
        self.conn
            .execute(
                "INSERT INTO TMTaskTag (tasks, tags) VALUES (?1, ?2)",
                params![task, tag],
            )
            .expect("insert task tag");
        self
    }

    pub fn tag_area(&self, area: &str, tag: &str) -> &Self {
        self.conn
            .execute(
                "INSERT INTO TMAreaTag (areas, tags) VALUES (?1, ?2)",
                params![area, tag],
            )
            .expect("insert area tag");
        self
    }

    pub fn checklist_item(&self, uuid: &str, task: &str, title: &str, index: i64) -> &Self {
        self.conn
            .execute(
                "INSERT INTO TMChecklistItem (uuid, task, title, status, \"index\")
                 VALUES (?1, ?2, ?3, 0, ?4)",
                params![uuid, task, title, index],
            )
            .expect("insert checklist item");
        self
    }
}

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid fixture date")
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn days_from_today(days: i64) -> NaiveDate {
    today() + TimeDelta::days(days)
}

/// Unix seconds at local noon of `date`, clear of any day boundary.
#[allow(clippy::cast_precision_loss)]
pub fn local_noon(date: NaiveDate) -> f64 {
    let noon = date.and_hms_opt(12, 0, 0).expect("valid time");
    Local
        .from_local_datetime(&noon)
        .earliest()
        .expect("local noon exists")
        .timestamp() as f64
}

pub fn uuids(tasks: &[things_core::model::Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.uuid.as_str()).collect()
}
