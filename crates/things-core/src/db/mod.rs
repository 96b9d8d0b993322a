//! Read-only access to the Things `SQLite` database.
//!
//! Connections are opened with conservative defaults:
//! - `SQLITE_OPEN_READ_ONLY` so no statement can mutate the store
//! - `query_only = ON` as a second guard on the same connection
//! - `busy_timeout = 5s` to ride out the app's own write transactions

pub mod scan;
pub mod schema;

use rusqlite::{Connection, InterruptHandle, OpenFlags, Row};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::filter::{Filter, Filters};
use crate::model::ChecklistItem;
use crate::query::{AreaQuery, TagQuery, TaskQuery};

/// Busy timeout used for database connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle on one read-only connection to a Things database.
///
/// `Database` is `Send` but not `Sync`; queries borrow it, so one handle
/// serves one thread at a time.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open the database at `path` read-only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatabaseMissing`] if `path` does not exist, or the
    /// `SQLite` error if opening or configuring the connection fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::DatabaseMissing {
                path: path.to_path_buf(),
            });
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;
        configure_connection(&conn)?;
        debug!(path = %path.display(), "opened Things database");

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Resolve the database location (see
    /// [`crate::config::resolve_database_path`]) and open it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoDatabasePath`] when nothing can be resolved, or
    /// any error from [`Database::open`].
    pub fn discover(explicit: Option<&Path>, config: &crate::config::Config) -> Result<Self> {
        let path = crate::config::resolve_database_path(explicit, config)?;
        Self::open(path)
    }

    /// An empty in-memory database carrying the Things schema, locked
    /// read-only once created.
    ///
    /// # Errors
    ///
    /// Returns the `SQLite` error if creating the schema fails.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(schema::THINGS_SCHEMA_SQL)?;
        configure_connection(&conn)?;
        Ok(Self { conn, path: None })
    }

    /// Path the database was opened from; `None` for in-memory databases.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Handle that can interrupt a running statement from another thread.
    #[must_use]
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.conn.get_interrupt_handle()
    }

    /// Start a task query. With no filters it matches every row of `TMTask`.
    pub const fn tasks(&self) -> TaskQuery<'_> {
        TaskQuery::new(self)
    }

    /// Start an area query.
    pub const fn areas(&self) -> AreaQuery<'_> {
        AreaQuery::new(self)
    }

    /// Start a tag query.
    pub const fn tags(&self) -> TagQuery<'_> {
        TagQuery::new(self)
    }

    /// Checklist items of the task `task_uuid`, in manual order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be scanned.
    pub fn checklist_items(&self, task_uuid: &str) -> Result<Vec<ChecklistItem>> {
        let filters = Filters::new().with(Filter::equal("ITEM.task", task_uuid));
        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {}",
            schema::CHECKLIST_COLUMNS,
            schema::CHECKLIST_FROM,
            filters.sql(),
            schema::CHECKLIST_ORDER
        );
        self.query_rows(&sql, scan::checklist_item)
    }

    /// Run `sql` and map every row with `map`.
    pub(crate) fn query_rows<T>(
        &self,
        sql: &str,
        mut map: impl FnMut(&Row<'_>) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(map(row)?);
        }
        debug!(rows = out.len(), sql, "query");
        Ok(out)
    }

    /// Run a `SELECT COUNT(*)` statement.
    pub(crate) fn query_count(&self, sql: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        debug!(count, sql, "count");
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "query_only", "ON")?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}
