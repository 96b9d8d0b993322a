//! things-core library.
//!
//! Read-only query layer over the Things 3 `SQLite` database: a filter
//! algebra that renders SQL `WHERE` fragments, the packed date/time codec
//! used by the store, fluent query builders for tasks, areas and tags, and
//! the derived views (Today, Upcoming, Logbook, ...) the app computes
//! implicitly.
//!
//! # Conventions
//!
//! - **Errors**: library calls return [`Result`] with the typed [`Error`];
//!   configuration loading uses `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod date;
pub mod db;
pub mod error;
pub mod filter;
pub mod model;
pub mod query;
pub mod views;

pub use db::Database;
pub use error::{Error, ErrorCode, Result};
pub use filter::{Comparison, DateOp, Filter, Filters, Value};
pub use query::{DateFilter, TaskOrder, TaskQuery};
