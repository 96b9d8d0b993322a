use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::TaskQuery;
use crate::date::parse_iso_date;
use crate::db::schema::{TASK_DEADLINE, TASK_START_DATE, TASK_STOP_DATE};
use crate::error::Result;
use crate::filter::{Comparison, DateOp, Filter};

/// Value of one date slot. Exactly one comparison by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFilter {
    /// `true`: a date is set. `false`: no date.
    Exists(bool),
    /// Strictly after today.
    Future,
    /// Today or earlier.
    Past,
    /// Compare against a `YYYY-MM-DD` literal.
    Compare(Comparison, String),
}

impl DateFilter {
    /// Interpret a caller string: `future`, `past`, or a `YYYY-MM-DD` date
    /// matched exactly.
    #[must_use]
    pub fn parse(literal: &str) -> Self {
        match literal.trim().to_ascii_lowercase().as_str() {
            "future" => Self::Future,
            "past" => Self::Past,
            other => Self::Compare(Comparison::Equal, other.to_string()),
        }
    }

    /// Build the value for any [`DateOp`]. Operand-free ops ignore
    /// `literal` and map to their own variants.
    #[must_use]
    pub fn from_op(op: DateOp, literal: &str) -> Self {
        match op {
            DateOp::Exists => Self::Exists(true),
            DateOp::NotExists => Self::Exists(false),
            DateOp::Future => Self::Future,
            DateOp::Past => Self::Past,
            DateOp::Equal => Self::Compare(Comparison::Equal, literal.to_string()),
            DateOp::Before => Self::Compare(Comparison::Before, literal.to_string()),
            DateOp::BeforeOrEqual => Self::Compare(Comparison::BeforeOrEqual, literal.to_string()),
            DateOp::After => Self::Compare(Comparison::After, literal.to_string()),
            DateOp::AfterOrEqual => Self::Compare(Comparison::AfterOrEqual, literal.to_string()),
        }
    }

    /// Check the literal of a comparison. Queries accept malformed literals
    /// and skip them; this reports them instead.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidDate`] when a comparison literal is
    /// not a `YYYY-MM-DD` date the packed format can hold.
    pub fn validate(&self) -> Result<()> {
        if let Self::Compare(_, literal) = self {
            parse_iso_date(literal)?;
        }
        Ok(())
    }

    fn op_and_value(&self) -> (DateOp, &str) {
        match self {
            Self::Exists(true) => (DateOp::Exists, ""),
            Self::Exists(false) => (DateOp::NotExists, ""),
            Self::Future => (DateOp::Future, ""),
            Self::Past => (DateOp::Past, ""),
            Self::Compare(comparison, value) => ((*comparison).into(), value),
        }
    }
}

/// The task date columns a [`DateFilterBuilder`] can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateSlot {
    /// Packed date: when the task is scheduled to start.
    StartDate,
    /// Unix seconds: when the task was completed or canceled.
    StopDate,
    /// Packed date.
    Deadline,
}

impl DateSlot {
    /// Render `value` against this slot's column with the matching family.
    #[must_use]
    pub fn filter(self, value: &DateFilter) -> Filter {
        let (op, literal) = value.op_and_value();
        match self {
            Self::StartDate => Filter::things_date(TASK_START_DATE, op, literal),
            Self::Deadline => Filter::things_date(TASK_DEADLINE, op, literal),
            Self::StopDate => Filter::unix_time(TASK_STOP_DATE, op, literal),
        }
    }
}

/// Sub-builder returned by [`TaskQuery::start_date`],
/// [`TaskQuery::stop_date`] and [`TaskQuery::deadline`].
///
/// Every method writes the one slot it was created for and hands the parent
/// query back.
#[derive(Debug, Clone)]
#[must_use = "a date filter does nothing until a setter returns the query"]
pub struct DateFilterBuilder<'db> {
    query: TaskQuery<'db>,
    slot: DateSlot,
}

impl<'db> DateFilterBuilder<'db> {
    pub(super) const fn new(query: TaskQuery<'db>, slot: DateSlot) -> Self {
        Self { query, slot }
    }

    /// Replace the slot with an explicit value.
    pub fn set(self, value: DateFilter) -> TaskQuery<'db> {
        self.query.with_date(self.slot, Some(value))
    }

    pub fn exists(self, exists: bool) -> TaskQuery<'db> {
        self.set(DateFilter::Exists(exists))
    }

    pub fn future(self) -> TaskQuery<'db> {
        self.set(DateFilter::Future)
    }

    pub fn past(self) -> TaskQuery<'db> {
        self.set(DateFilter::Past)
    }

    pub fn on(self, date: NaiveDate) -> TaskQuery<'db> {
        self.compare_date(Comparison::Equal, date)
    }

    pub fn before(self, date: NaiveDate) -> TaskQuery<'db> {
        self.compare_date(Comparison::Before, date)
    }

    pub fn on_or_before(self, date: NaiveDate) -> TaskQuery<'db> {
        self.compare_date(Comparison::BeforeOrEqual, date)
    }

    pub fn after(self, date: NaiveDate) -> TaskQuery<'db> {
        self.compare_date(Comparison::After, date)
    }

    pub fn on_or_after(self, date: NaiveDate) -> TaskQuery<'db> {
        self.compare_date(Comparison::AfterOrEqual, date)
    }

    /// Compare against a raw literal. A malformed literal leaves the slot
    /// set but renders no SQL, so the query is not narrowed. Operand-free
    /// ops set their own variant and ignore `literal`.
    pub fn compare(self, op: DateOp, literal: &str) -> TaskQuery<'db> {
        self.set(DateFilter::from_op(op, literal))
    }

    /// Accepts `future`, `past` or a `YYYY-MM-DD` date.
    pub fn literal(self, literal: &str) -> TaskQuery<'db> {
        self.set(DateFilter::parse(literal))
    }

    fn compare_date(self, op: Comparison, date: NaiveDate) -> TaskQuery<'db> {
        self.set(DateFilter::Compare(op, date.format("%Y-%m-%d").to_string()))
    }
}
