//! Typed records scanned from the Things database.

pub mod task;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub use task::{Parent, StartBucket, Status, Task, TaskType};

/// A row of `TMArea`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub uuid: String,
    pub title: String,
    pub visible: bool,
    pub index: i64,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
}

/// A row of `TMTag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub uuid: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
    /// Uuid of the parent tag in the tag hierarchy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub index: i64,
}

/// A row of `TMChecklistItem`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub uuid: String,
    pub title: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_date: Option<DateTime<Local>>,
    /// Uuid of the owning task.
    pub task: String,
    pub index: i64,
}
