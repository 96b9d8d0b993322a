//! Table names, column references and `SELECT` text for the Things schema.
//!
//! The schema is owned by the Things app and never changed here:
//! - `TMTask` holds to-dos, projects and headings in one table
//! - `TMArea` and `TMTag` are flat lookup tables
//! - `TMTaskTag` / `TMAreaTag` link tags to tasks and areas
//! - `TMChecklistItem` rows belong to a single task

use crate::date::{things_date_sql, things_time_sql};

pub const TAG_TABLE: &str = "TMTag";
pub const TASK_TAG_TABLE: &str = "TMTaskTag";
pub const AREA_TAG_TABLE: &str = "TMAreaTag";

/// Separator used when tag titles are concatenated into one column.
pub const TAG_SEPARATOR: char = '\u{1f}';

// Task columns, qualified with the `TASK` alias used by every task query.
pub const TASK_UUID: &str = "TASK.uuid";
pub const TASK_TYPE: &str = "TASK.type";
pub const TASK_TITLE: &str = "TASK.title";
pub const TASK_NOTES: &str = "TASK.notes";
pub const TASK_STATUS: &str = "TASK.status";
pub const TASK_START: &str = "TASK.start";
pub const TASK_START_DATE: &str = "TASK.startDate";
pub const TASK_DEADLINE: &str = "TASK.deadline";
pub const TASK_DEADLINE_SUPPRESSION: &str = "TASK.deadlineSuppressionDate";
pub const TASK_REMINDER_TIME: &str = "TASK.reminderTime";
pub const TASK_STOP_DATE: &str = "TASK.stopDate";
pub const TASK_CREATION_DATE: &str = "TASK.creationDate";
pub const TASK_MODIFICATION_DATE: &str = "TASK.userModificationDate";
pub const TASK_AREA: &str = "TASK.area";
pub const TASK_PROJECT: &str = "TASK.project";
pub const TASK_HEADING: &str = "TASK.heading";
pub const TASK_INDEX: &str = "TASK.\"index\"";
pub const TASK_TODAY_INDEX: &str = "TASK.todayIndex";
pub const TASK_TRASHED: &str = "TASK.trashed";

pub const AREA_TITLE: &str = "AREA.title";
pub const PROJECT_TRASHED: &str = "PROJECT.trashed";
pub const HEADING_PROJECT: &str = "HEADING.project";
pub const HEADING_TRASHED: &str = "HEADING.trashed";
pub const PROJECT_OF_HEADING_TRASHED: &str = "PROJECT_OF_HEADING.trashed";

/// Joins shared by every task query. A task's project is either direct or
/// reached through its heading.
pub const TASK_FROM: &str = "TMTask AS TASK
LEFT OUTER JOIN TMTask AS PROJECT ON TASK.project = PROJECT.uuid
LEFT OUTER JOIN TMArea AS AREA ON TASK.area = AREA.uuid
LEFT OUTER JOIN TMTask AS HEADING ON TASK.heading = HEADING.uuid
LEFT OUTER JOIN TMTask AS PROJECT_OF_HEADING ON HEADING.project = PROJECT_OF_HEADING.uuid";

/// Result columns of a task query, in the order [`super::scan::task`] reads
/// them.
#[must_use]
pub fn task_columns() -> String {
    [
        TASK_UUID.to_string(),
        TASK_TYPE.to_string(),
        TASK_TITLE.to_string(),
        TASK_STATUS.to_string(),
        TASK_NOTES.to_string(),
        TASK_START.to_string(),
        format!("{} AS start_date", things_date_sql(TASK_START_DATE)),
        format!("{} AS deadline", things_date_sql(TASK_DEADLINE)),
        format!("{} AS reminder_time", things_time_sql(TASK_REMINDER_TIME)),
        TASK_STOP_DATE.to_string(),
        TASK_CREATION_DATE.to_string(),
        TASK_MODIFICATION_DATE.to_string(),
        TASK_AREA.to_string(),
        "AREA.title AS area_title".to_string(),
        "COALESCE(TASK.project, HEADING.project) AS project".to_string(),
        "COALESCE(PROJECT.title, PROJECT_OF_HEADING.title) AS project_title".to_string(),
        TASK_HEADING.to_string(),
        "HEADING.title AS heading_title".to_string(),
        format!(
            "(SELECT group_concat(TAG.title, char(31)) FROM {TASK_TAG_TABLE} AS TASK_TAG \
             JOIN {TAG_TABLE} AS TAG ON TAG.uuid = TASK_TAG.tags \
             WHERE TASK_TAG.tasks = TASK.uuid) AS tags"
        ),
        TASK_INDEX.to_string(),
        TASK_TODAY_INDEX.to_string(),
        TASK_TRASHED.to_string(),
    ]
    .join(",\n    ")
}

pub const AREA_FROM: &str = "TMArea AS AREA";

/// Result columns of an area query, in the order [`super::scan::area`]
/// reads them.
#[must_use]
pub fn area_columns() -> String {
    format!(
        "AREA.uuid, AREA.title, AREA.visible, AREA.\"index\",
    (SELECT group_concat(TAG.title, char(31)) FROM {AREA_TAG_TABLE} AS AREA_TAG \
JOIN {TAG_TABLE} AS TAG ON TAG.uuid = AREA_TAG.tags \
WHERE AREA_TAG.areas = AREA.uuid) AS tags"
    )
}

pub const TAG_FROM: &str = "TMTag AS TAG";
pub const TAG_COLUMNS: &str = "TAG.uuid, TAG.title, TAG.shortcut, TAG.parent, TAG.\"index\"";

pub const CHECKLIST_FROM: &str = "TMChecklistItem AS ITEM";
pub const CHECKLIST_COLUMNS: &str =
    "ITEM.uuid, ITEM.title, ITEM.status, ITEM.stopDate, ITEM.task, ITEM.\"index\"";
pub const CHECKLIST_ORDER: &str = "ITEM.\"index\"";

/// The subset of the Things schema this crate reads.
///
/// Used to build in-memory and fixture databases; column affinities match
/// the app's own tables.
pub const THINGS_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS TMArea (
    uuid TEXT PRIMARY KEY,
    title TEXT,
    visible INTEGER,
    "index" INTEGER,
    cachedTags BLOB,
    experimental BLOB
);

CREATE TABLE IF NOT EXISTS TMTag (
    uuid TEXT PRIMARY KEY,
    title TEXT,
    shortcut TEXT,
    usedDate REAL,
    parent TEXT,
    "index" INTEGER,
    experimental BLOB
);

CREATE TABLE IF NOT EXISTS TMTask (
    uuid TEXT PRIMARY KEY,
    leavesTombstone INTEGER,
    creationDate REAL,
    userModificationDate REAL,
    type INTEGER,
    status INTEGER,
    stopDate REAL,
    trashed INTEGER,
    title TEXT,
    notes TEXT,
    notesSync INTEGER,
    cachedTags BLOB,
    start INTEGER,
    startDate INTEGER,
    startBucket INTEGER,
    reminderTime INTEGER,
    lastReminderInteractionDate REAL,
    deadline INTEGER,
    deadlineSuppressionDate INTEGER,
    t2_deadlineOffset INTEGER,
    "index" INTEGER,
    todayIndex INTEGER,
    todayIndexReferenceDate INTEGER,
    area TEXT,
    project TEXT,
    heading TEXT,
    contact TEXT,
    untrashedLeafActionsCount INTEGER,
    openUntrashedLeafActionsCount INTEGER,
    checklistItemsCount INTEGER,
    openChecklistItemsCount INTEGER,
    rt1_repeatingTemplate TEXT,
    rt1_recurrenceRule BLOB,
    rt1_instanceCreationStartDate INTEGER,
    rt1_instanceCreationPaused INTEGER,
    rt1_instanceCreationCount INTEGER,
    rt1_afterCompletionReferenceDate INTEGER,
    rt1_nextInstanceStartDate INTEGER,
    experimental BLOB,
    repeater BLOB,
    repeaterMigrationDate REAL
);

CREATE TABLE IF NOT EXISTS TMTaskTag (
    tasks TEXT NOT NULL,
    tags TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS TMAreaTag (
    areas TEXT NOT NULL,
    tags TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS TMChecklistItem (
    uuid TEXT PRIMARY KEY,
    userModificationDate REAL,
    creationDate REAL,
    title TEXT,
    status INTEGER,
    stopDate REAL,
    "index" INTEGER,
    task TEXT,
    leavesTombstone INTEGER,
    experimental BLOB
);
"#;
