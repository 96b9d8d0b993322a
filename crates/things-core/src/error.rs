use std::fmt;
use std::path::PathBuf;

use crate::date::DateParseError;

/// Result alias for library operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the query layer.
///
/// Malformed date literals inside filters are deliberately *not* errors:
/// such filters render nothing and the query proceeds unfiltered on that
/// dimension.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `first()` terminal matched no rows.
    #[error("{entity} not found")]
    NotFound {
        /// Kind of record that was looked up (`"task"`, `"area"`, `"tag"`).
        entity: &'static str,
    },

    /// Failure reported by `SQLite`, propagated verbatim.
    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    /// The resolved database path does not exist.
    #[error("Things database not found at {}", .path.display())]
    DatabaseMissing {
        /// Path that was checked.
        path: PathBuf,
    },

    /// No database path was given and none could be discovered.
    #[error("no Things database path configured and none discovered")]
    NoDatabasePath,

    /// A date literal passed to a codec parsing function was rejected.
    #[error(transparent)]
    InvalidDate(#[from] DateParseError),

    /// A stored enum code has no known meaning.
    #[error("unknown {field} value {value}")]
    InvalidValue {
        /// Column the value was read from.
        field: &'static str,
        /// The stored value.
        value: i64,
    },
}

impl Error {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Database(_) => ErrorCode::DatabaseFailure,
            Self::DatabaseMissing { .. } => ErrorCode::DatabaseMissing,
            Self::NoDatabasePath => ErrorCode::NoDatabasePath,
            Self::InvalidDate(_) => ErrorCode::InvalidDate,
            Self::InvalidValue { .. } => ErrorCode::InvalidValue,
        }
    }

    /// True for the distinct "no rows" outcome of `first()`.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    NoDatabasePath,
    DatabaseMissing,
    NotFound,
    InvalidDate,
    InvalidValue,
    DatabaseFailure,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::NoDatabasePath => "E1002",
            Self::DatabaseMissing => "E1003",
            Self::NotFound => "E2001",
            Self::InvalidDate => "E2002",
            Self::InvalidValue => "E3001",
            Self::DatabaseFailure => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::NoDatabasePath => "No Things database configured",
            Self::DatabaseMissing => "Things database not found",
            Self::NotFound => "Record not found",
            Self::InvalidDate => "Invalid date literal",
            Self::InvalidValue => "Unexpected value in Things database",
            Self::DatabaseFailure => "Database query failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => {
                Some("Fix syntax in ~/.config/things-query/config.toml and retry.")
            }
            Self::NoDatabasePath | Self::DatabaseMissing => {
                Some("Pass --database, set THINGSDB, or set database_path in the config file.")
            }
            Self::NotFound => None,
            Self::InvalidDate => Some("Use YYYY-MM-DD, `future` or `past`."),
            Self::InvalidValue => {
                Some("The database may come from a newer Things release; please report it.")
            }
            Self::DatabaseFailure => {
                Some("Retry once; Things may be holding a write lock on the database.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorCode};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::NoDatabasePath,
            ErrorCode::DatabaseMissing,
            ErrorCode::NotFound,
            ErrorCode::InvalidDate,
            ErrorCode::InvalidValue,
            ErrorCode::DatabaseFailure,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::NotFound.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn not_found_is_distinguishable() {
        let err = Error::NotFound { entity: "task" };
        assert!(err.is_not_found());
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.to_string(), "task not found");

        let db = Error::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(!db.is_not_found());
        assert_eq!(db.code(), ErrorCode::DatabaseFailure);
    }
}
