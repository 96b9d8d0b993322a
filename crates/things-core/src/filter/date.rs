//! Date comparisons for the two storage representations in `TMTask`:
//! packed dates (`startDate`, `deadline`) and Unix seconds (`stopDate`,
//! `creationDate`).

use crate::date::{
    parse_iso_date, string_to_things_date, today_things_date_sql, today_unix_date_sql,
    unix_date_sql,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::quote;

/// Comparison operator of a date filter.
///
/// `Exists`, `NotExists`, `Future` and `Past` carry no operand; the rest
/// compare against a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOp {
    Exists,
    NotExists,
    Equal,
    Before,
    BeforeOrEqual,
    After,
    AfterOrEqual,
    /// Strictly after today.
    Future,
    /// Today or earlier.
    Past,
}

impl DateOp {
    /// Whether the operator compares against a caller-supplied date.
    #[must_use]
    pub const fn is_absolute(self) -> bool {
        self.comparison().is_some()
    }

    /// SQL comparison operator for absolute ops.
    #[must_use]
    pub const fn comparison(self) -> Option<&'static str> {
        match self {
            Self::Equal => Some("="),
            Self::Before => Some("<"),
            Self::BeforeOrEqual => Some("<="),
            Self::After => Some(">"),
            Self::AfterOrEqual => Some(">="),
            Self::Exists | Self::NotExists | Self::Future | Self::Past => None,
        }
    }
}

/// The operators of [`DateOp`] that take a calendar-date operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Equal,
    Before,
    BeforeOrEqual,
    After,
    AfterOrEqual,
}

impl From<Comparison> for DateOp {
    fn from(comparison: Comparison) -> Self {
        match comparison {
            Comparison::Equal => Self::Equal,
            Comparison::Before => Self::Before,
            Comparison::BeforeOrEqual => Self::BeforeOrEqual,
            Comparison::After => Self::After,
            Comparison::AfterOrEqual => Self::AfterOrEqual,
        }
    }
}

impl fmt::Display for DateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Exists => "exists",
            Self::NotExists => "not_exists",
            Self::Equal => "equal",
            Self::Before => "before",
            Self::BeforeOrEqual => "before_or_equal",
            Self::After => "after",
            Self::AfterOrEqual => "after_or_equal",
            Self::Future => "future",
            Self::Past => "past",
        };
        f.write_str(name)
    }
}

/// Render a packed-date comparison. Unparseable literals render `""`.
pub(super) fn things_date_sql(column: &str, op: DateOp, value: &str) -> String {
    match op {
        DateOp::Exists => format!("{column} IS NOT NULL"),
        DateOp::NotExists => format!("{column} IS NULL"),
        DateOp::Future => format!("{column} > {}", today_things_date_sql()),
        DateOp::Past => format!("{column} <= {}", today_things_date_sql()),
        _ => match (op.comparison(), string_to_things_date(value)) {
            (Some(operator), Ok(packed)) if packed > 0 => {
                format!("{column} {operator} {packed}")
            }
            _ => String::new(),
        },
    }
}

/// Render a Unix-seconds comparison by local calendar day.
/// Unparseable literals render `""`.
pub(super) fn unix_time_sql(column: &str, op: DateOp, value: &str) -> String {
    let local_date = unix_date_sql(column);
    match op {
        DateOp::Exists => format!("{column} IS NOT NULL"),
        DateOp::NotExists => format!("{column} IS NULL"),
        DateOp::Future => format!("{local_date} > {}", today_unix_date_sql()),
        DateOp::Past => format!("{local_date} <= {}", today_unix_date_sql()),
        _ => match (op.comparison(), parse_iso_date(value)) {
            (Some(operator), Ok(date)) => format!(
                "{local_date} {operator} date({})",
                quote(&date.format("%Y-%m-%d").to_string())
            ),
            _ => String::new(),
        },
    }
}
