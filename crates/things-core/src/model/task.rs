use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::Error;

/// The three kinds of row stored in `TMTask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    #[serde(rename = "to-do")]
    Todo,
    Project,
    Heading,
}

impl TaskType {
    /// Stored integer code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Todo => 0,
            Self::Project => 1,
            Self::Heading => 2,
        }
    }

    /// Decode a stored integer code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for unknown codes.
    pub const fn from_code(code: i64) -> Result<Self, Error> {
        match code {
            0 => Ok(Self::Todo),
            1 => Ok(Self::Project),
            2 => Ok(Self::Heading),
            value => Err(Error::InvalidValue {
                field: "type",
                value,
            }),
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "to-do",
            Self::Project => "project",
            Self::Heading => "heading",
        }
    }
}

/// Completion state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Incomplete,
    Canceled,
    Completed,
}

impl Status {
    /// Stored integer code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Incomplete => 0,
            Self::Canceled => 2,
            Self::Completed => 3,
        }
    }

    /// Decode a stored integer code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for unknown codes.
    pub const fn from_code(code: i64) -> Result<Self, Error> {
        match code {
            0 => Ok(Self::Incomplete),
            2 => Ok(Self::Canceled),
            3 => Ok(Self::Completed),
            value => Err(Error::InvalidValue {
                field: "status",
                value,
            }),
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Incomplete => "incomplete",
            Self::Canceled => "canceled",
            Self::Completed => "completed",
        }
    }
}

/// Scheduling bucket a task sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartBucket {
    Inbox,
    Anytime,
    Someday,
}

impl StartBucket {
    /// Stored integer code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Inbox => 0,
            Self::Anytime => 1,
            Self::Someday => 2,
        }
    }

    /// Decode a stored integer code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for unknown codes.
    pub const fn from_code(code: i64) -> Result<Self, Error> {
        match code {
            0 => Ok(Self::Inbox),
            1 => Ok(Self::Anytime),
            2 => Ok(Self::Someday),
            value => Err(Error::InvalidValue {
                field: "start",
                value,
            }),
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Anytime => "anytime",
            Self::Someday => "someday",
        }
    }
}

macro_rules! display_and_parse {
    ($ty:ty, $what:literal, [$($variant:ident => [$($alias:literal),+]),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($($alias)|+ => Ok(Self::$variant),)+
                    other => Err(format!(concat!("unknown ", $what, " '{}'"), other)),
                }
            }
        }
    };
}

display_and_parse!(TaskType, "task type", [
    Todo => ["to-do", "todo", "task"],
    Project => ["project"],
    Heading => ["heading"],
]);

display_and_parse!(Status, "status", [
    Incomplete => ["incomplete", "open"],
    Canceled => ["canceled", "cancelled"],
    Completed => ["completed", "done"],
]);

display_and_parse!(StartBucket, "start bucket", [
    Inbox => ["inbox"],
    Anytime => ["anytime"],
    Someday => ["someday"],
]);

/// Reference to a containing record by uuid and title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent {
    pub uuid: String,
    pub title: Option<String>,
}

/// A row of `TMTask`: a to-do, project or heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub uuid: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub title: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub start: StartBucket,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_date: Option<DateTime<Local>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Local>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Local>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<Parent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<Parent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<Parent>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    pub index: i64,
    pub today_index: i64,
    pub trashed: bool,
}

impl Task {
    /// True for rows whose status is completed or canceled.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self.status, Status::Completed | Status::Canceled)
    }
}
