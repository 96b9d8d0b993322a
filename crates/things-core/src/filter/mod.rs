//! Predicate algebra rendering SQL `WHERE` fragments.
//!
//! A [`Filter`] is an immutable value that renders one SQL boolean
//! expression and reports whether it contributes nothing. [`Filters`] ANDs
//! them together, skipping members that render nothing, and collapses to
//! [`ALWAYS_TRUE`] when nothing is left.
//!
//! Every caller-supplied string interpolated into SQL passes through
//! [`quote`]. [`Filter::raw`] is the one deliberate opt-out.

mod date;

pub use date::{Comparison, DateOp};

use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

/// Universally true SQL expression used when no filter contributes.
pub const ALWAYS_TRUE: &str = "TRUE";

/// Columns searched by [`Filter::search`] when none are given.
pub const DEFAULT_SEARCH_COLUMNS: [&str; 3] = ["TASK.title", "TASK.notes", "AREA.title"];

const AND_SEPARATOR: &str = "\n    AND ";

/// Quote `value` as a SQL string literal, doubling every single quote.
#[must_use]
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// Scalar operand of [`Filter::Equal`].
///
/// Booleans test for presence (`IS NOT NULL` / `IS NULL`); every other
/// scalar compares as a quoted literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// One SQL boolean condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Pre-formed SQL passed through verbatim. Never escaped.
    Static(String),
    /// Equality, or presence when the value is a boolean.
    Equal { column: String, value: Option<Value> },
    /// `LIKE` against a caller-built pattern (wildcards included by caller).
    Like { column: String, pattern: String },
    /// SQL truthiness, treating `NULL` as false.
    Truthy { column: String, value: Option<bool> },
    /// Parenthesized disjunction of the non-empty members.
    Or(Vec<Self>),
    /// Substring match of `query` against each column, OR-combined.
    Search { query: String, columns: Vec<String> },
    /// Comparison against a packed-date column.
    ThingsDate {
        column: String,
        op: DateOp,
        value: String,
    },
    /// Comparison against a Unix-seconds column, by local calendar day.
    UnixTime {
        column: String,
        op: DateOp,
        value: String,
    },
    /// Strictly later than an instant, on a Unix-seconds column.
    CreatedAfter {
        column: String,
        after: Option<DateTime<Utc>>,
    },
}

impl Filter {
    /// Verbatim SQL. The caller is responsible for escaping.
    pub fn raw(expr: impl Into<String>) -> Self {
        Self::Static(expr.into())
    }

    /// `column = value`, or a presence test for boolean values.
    pub fn equal(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equal {
            column: column.into(),
            value: Some(value.into()),
        }
    }

    /// Like [`Filter::equal`]; `None` yields an empty filter.
    pub fn equal_opt<V: Into<Value>>(column: impl Into<String>, value: Option<V>) -> Self {
        Self::Equal {
            column: column.into(),
            value: value.map(Into::into),
        }
    }

    /// `column LIKE pattern`.
    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Like {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    /// Bare column for `Some(true)`, `NOT IFNULL(column, 0)` for `Some(false)`.
    pub fn truthy(column: impl Into<String>, value: Option<bool>) -> Self {
        Self::Truthy {
            column: column.into(),
            value,
        }
    }

    /// Disjunction of `filters`.
    pub fn or(filters: impl IntoIterator<Item = Self>) -> Self {
        Self::Or(filters.into_iter().collect())
    }

    /// Search title, notes and area title for `query`.
    pub fn search(query: impl Into<String>) -> Self {
        Self::search_in(query, DEFAULT_SEARCH_COLUMNS)
    }

    /// Search the given columns for `query`.
    pub fn search_in<C: Into<String>>(
        query: impl Into<String>,
        columns: impl IntoIterator<Item = C>,
    ) -> Self {
        Self::Search {
            query: query.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Compare a packed-date column. `value` is a `YYYY-MM-DD` literal for
    /// absolute operators and ignored otherwise.
    pub fn things_date(column: impl Into<String>, op: DateOp, value: impl Into<String>) -> Self {
        Self::ThingsDate {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Compare a Unix-seconds column by local calendar day.
    pub fn unix_time(column: impl Into<String>, op: DateOp, value: impl Into<String>) -> Self {
        Self::UnixTime {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// `column > after` in Unix seconds; `None` yields an empty filter.
    pub fn created_after<Tz: TimeZone>(
        column: impl Into<String>,
        after: Option<&DateTime<Tz>>,
    ) -> Self {
        Self::CreatedAfter {
            column: column.into(),
            after: after.map(|t| t.with_timezone(&Utc)),
        }
    }

    /// Whether this filter contributes nothing.
    ///
    /// An absolute date comparison holding an unparseable literal is *not*
    /// empty, yet renders `""`; [`Filters`] skips it either way.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Static(expr) => expr.is_empty(),
            Self::Equal { value, .. } => value.is_none(),
            Self::Like { pattern, .. } => pattern.is_empty(),
            Self::Truthy { value, .. } => value.is_none(),
            Self::Or(members) => members.iter().all(Self::is_empty),
            Self::Search { query, .. } => query.is_empty(),
            Self::ThingsDate { op, value, .. } | Self::UnixTime { op, value, .. } => {
                op.is_absolute() && value.is_empty()
            }
            Self::CreatedAfter { after, .. } => after.is_none(),
        }
    }

    /// Render the SQL boolean expression; `""` when nothing is contributed.
    #[must_use]
    pub fn sql(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        match self {
            Self::Static(expr) => expr.clone(),
            Self::Equal { column, value } => match value {
                Some(Value::Bool(true)) => format!("{column} IS NOT NULL"),
                Some(Value::Bool(false)) => format!("{column} IS NULL"),
                Some(other) => format!("{column} = {}", quote(&other.to_string())),
                None => String::new(),
            },
            Self::Like { column, pattern } => format!("{column} LIKE {}", quote(pattern)),
            Self::Truthy { column, value } => match value {
                Some(true) => column.clone(),
                Some(false) => format!("NOT IFNULL({column}, 0)"),
                None => String::new(),
            },
            Self::Or(members) => {
                let parts: Vec<String> = members
                    .iter()
                    .map(Self::sql)
                    .filter(|sql| !sql.is_empty())
                    .collect();
                if parts.is_empty() {
                    String::new()
                } else {
                    format!("({})", parts.join(" OR "))
                }
            }
            Self::Search { query, columns } => {
                let pattern = quote(&format!("%{query}%"));
                let columns: Vec<&str> = if columns.is_empty() {
                    DEFAULT_SEARCH_COLUMNS.to_vec()
                } else {
                    columns.iter().map(String::as_str).collect()
                };
                let parts: Vec<String> = columns
                    .iter()
                    .map(|column| format!("{column} LIKE {pattern}"))
                    .collect();
                format!("({})", parts.join(" OR "))
            }
            Self::ThingsDate { column, op, value } => date::things_date_sql(column, *op, value),
            Self::UnixTime { column, op, value } => date::unix_time_sql(column, *op, value),
            Self::CreatedAfter { column, after } => after
                .map(|t| format!("{column} > {}", t.timestamp()))
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql())
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Ordered AND-list of filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(Vec<Filter>);

impl Filters {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, filter: Filter) {
        self.0.push(filter);
    }

    /// Builder-style [`Filters::push`].
    #[must_use]
    pub fn with(mut self, filter: Filter) -> Self {
        self.push(filter);
        self
    }

    /// Number of members that render SQL.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.iter().filter(|filter| !filter.sql().is_empty()).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Filter> {
        self.0.iter()
    }

    /// True when no member renders any SQL.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the conjunction, or [`ALWAYS_TRUE`] when nothing contributes.
    #[must_use]
    pub fn sql(&self) -> String {
        let clauses = self.clauses();
        if clauses.is_empty() {
            ALWAYS_TRUE.to_string()
        } else {
            clauses.join(AND_SEPARATOR)
        }
    }

    fn clauses(&self) -> Vec<String> {
        self.0
            .iter()
            .map(Filter::sql)
            .filter(|sql| !sql.is_empty())
            .collect()
    }
}

impl FromIterator<Filter> for Filters {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Filter> for Filters {
    fn extend<I: IntoIterator<Item = Filter>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Filters {
    type Item = Filter;
    type IntoIter = std::vec::IntoIter<Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Filters {
    type Item = &'a Filter;
    type IntoIter = std::slice::Iter<'a, Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, NaiveDate};

    #[test]
    fn equal_renders_each_value_kind() {
        assert_eq!(Filter::equal("TASK.type", 1_i64).sql(), "TASK.type = '1'");
        assert_eq!(
            Filter::equal("TASK.uuid", "abc").sql(),
            "TASK.uuid = 'abc'"
        );
        assert_eq!(Filter::equal("TASK.area", true).sql(), "TASK.area IS NOT NULL");
        assert_eq!(Filter::equal("TASK.area", false).sql(), "TASK.area IS NULL");
    }

    #[test]
    fn equal_without_value_is_empty() {
        let filter = Filter::equal_opt::<String>("TASK.uuid", None);
        assert!(filter.is_empty());
        assert_eq!(filter.sql(), "");
    }

    #[test]
    fn quote_doubles_single_quotes_only() {
        assert_eq!(quote("it's"), "'it''s'");
        assert_eq!(quote("''"), "''''''");
        assert_eq!(quote(r#"back\slash "double""#), r#"'back\slash "double"'"#);
        assert_eq!(quote("%_"), "'%_'");
    }

    #[test]
    fn equal_escapes_injection_attempt() {
        let sql = Filter::equal("TASK.title", "x' OR '1'='1").sql();
        assert_eq!(sql, "TASK.title = 'x'' OR ''1''=''1'");
    }

    #[test]
    fn quote_count_doubles_inside_literal() {
        for input in ["'", "''", "'''", "a'b''c'''d", "no quotes", "'leading", "trailing'"] {
            let sql = Filter::equal("c", input).sql();
            let literal = sql.strip_prefix("c = ").expect("equality prefix");
            let inner = &literal[1..literal.len() - 1];
            let input_quotes = input.matches('\'').count();
            assert_eq!(inner.matches('\'').count(), input_quotes * 2, "{input:?}");
            // Balanced: every quote inside is paired, plus the two delimiters.
            assert_eq!(literal.matches('\'').count() % 2, 0, "{input:?}");
        }
    }

    #[test]
    fn like_does_not_add_wildcards() {
        assert_eq!(
            Filter::like("TASK.title", "Buy%").sql(),
            "TASK.title LIKE 'Buy%'"
        );
        assert!(Filter::like("TASK.title", "").is_empty());
    }

    #[test]
    fn truthy_treats_null_as_false() {
        assert_eq!(Filter::truthy("TASK.trashed", Some(true)).sql(), "TASK.trashed");
        assert_eq!(
            Filter::truthy("TASK.trashed", Some(false)).sql(),
            "NOT IFNULL(TASK.trashed, 0)"
        );
        assert!(Filter::truthy("TASK.trashed", None).is_empty());
    }

    #[test]
    fn raw_is_verbatim() {
        assert_eq!(Filter::raw("1 = 1").sql(), "1 = 1");
        assert!(Filter::raw("").is_empty());
    }

    #[test]
    fn search_uses_default_columns() {
        assert_eq!(
            Filter::search("milk").sql(),
            "(TASK.title LIKE '%milk%' OR TASK.notes LIKE '%milk%' OR AREA.title LIKE '%milk%')"
        );
    }

    #[test]
    fn search_escapes_and_honours_columns() {
        assert_eq!(
            Filter::search_in("o'clock", ["AREA.title"]).sql(),
            "(AREA.title LIKE '%o''clock%')"
        );
        assert!(Filter::search("").is_empty());
    }

    #[test]
    fn or_parenthesizes_and_drops_empty_members() {
        let filter = Filter::or([
            Filter::truthy("A.trashed", Some(true)),
            Filter::equal_opt::<String>("B.uuid", None),
            Filter::truthy("C.trashed", Some(true)),
        ]);
        assert_eq!(filter.sql(), "(A.trashed OR C.trashed)");

        let single = Filter::or([Filter::equal("A.uuid", "x")]);
        assert_eq!(single.sql(), "(A.uuid = 'x')");

        let empty = Filter::or([Filter::raw(""), Filter::truthy("A", None)]);
        assert!(empty.is_empty());
        assert_eq!(empty.sql(), "");
        assert!(Filter::or([]).is_empty());
    }

    #[test]
    fn created_after_uses_epoch_seconds() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("utc");
        assert_eq!(
            Filter::created_after("TASK.creationDate", Some(&at)).sql(),
            "TASK.creationDate > 1704067200"
        );
        assert!(Filter::created_after::<Local>("TASK.creationDate", None).is_empty());
    }

    #[test]
    fn empty_list_is_always_true() {
        assert_eq!(Filters::new().sql(), ALWAYS_TRUE);
        assert!(Filters::new().is_empty());
    }

    #[test]
    fn all_empty_members_absorb_to_always_true() {
        let filters: Filters = [
            Filter::equal_opt::<String>("TASK.uuid", None),
            Filter::like("TASK.title", ""),
            Filter::truthy("TASK.trashed", None),
            Filter::raw(""),
            Filter::search(""),
            Filter::things_date("TASK.deadline", DateOp::Equal, ""),
            Filter::or([]),
        ]
        .into_iter()
        .collect();
        assert!(filters.is_empty());
        assert_eq!(filters.sql(), ALWAYS_TRUE);

        let extended = filters.with(Filter::equal("TASK.status", 0_i64));
        assert!(!extended.is_empty());
        assert_eq!(extended.sql(), "TASK.status = '0'");
    }

    #[test]
    fn len_counts_only_contributing_members() {
        let filters = Filters::new()
            .with(Filter::raw(""))
            .with(Filter::things_date("TASK.deadline", DateOp::Equal, "2024-13-40"));
        assert_eq!(filters.len(), 0);
        assert!(filters.is_empty());

        let filters = filters.with(Filter::equal("TASK.type", 0_i64));
        assert_eq!(filters.len(), 1);
        assert_eq!(filters.iter().count(), 3);
    }

    #[test]
    fn list_joins_with_and_and_no_dangling_operator() {
        let filters = Filters::new()
            .with(Filter::equal("TASK.type", 0_i64))
            .with(Filter::raw(""))
            .with(Filter::truthy("TASK.trashed", Some(false)));
        let sql = filters.sql();
        assert_eq!(sql, "TASK.type = '0'\n    AND NOT IFNULL(TASK.trashed, 0)");
        assert!(!sql.trim_end().ends_with("AND"));
        assert!(!sql.trim_start().starts_with("AND"));
    }

    #[test]
    fn unparseable_date_is_not_empty_but_renders_nothing() {
        let filter = Filter::things_date("TASK.deadline", DateOp::Equal, "2024-13-40");
        assert!(!filter.is_empty());
        assert_eq!(filter.sql(), "");

        let filters = Filters::new()
            .with(Filter::equal("TASK.status", 0_i64))
            .with(filter)
            .with(Filter::equal("TASK.type", 0_i64));
        assert_eq!(filters.sql(), "TASK.status = '0'\n    AND TASK.type = '0'");
    }

    #[test]
    fn date_filter_in_list() {
        let pivot = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let filters = Filters::new().with(Filter::things_date(
            "TASK.startDate",
            DateOp::Before,
            pivot.format("%Y-%m-%d").to_string(),
        ));
        assert_eq!(filters.sql(), "TASK.startDate < 132649088");
    }

    #[test]
    fn filters_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Filter>();
        assert_send_sync::<Filters>();
    }
}
