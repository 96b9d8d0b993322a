//! `things-query tasks`: free-form task queries built from filter flags.

use crate::cmd::view::{ListArgs, emit_tasks};
use crate::output::OutputMode;
use chrono::{Local, NaiveDate, TimeZone};
use clap::{Args, ValueEnum};
use things_core::date::parse_iso_date;
use things_core::model::{StartBucket, Status, TaskType};
use things_core::{Comparison, Database, DateFilter, TaskOrder, TaskQuery};
use tracing::warn;

/// Sort order accepted by `--order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    /// Manual order within the containing list.
    Index,
    /// Manual order within Today.
    Today,
    /// Start date, soonest first.
    Start,
    /// Deadline, soonest first.
    Deadline,
    /// Most recently closed first.
    Closed,
    /// Most recently created first.
    Created,
}

impl From<OrderArg> for TaskOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Index => Self::Index,
            OrderArg::Today => Self::TodayIndex,
            OrderArg::Start => Self::StartDate,
            OrderArg::Deadline => Self::Deadline,
            OrderArg::Closed => Self::StopDateDesc,
            OrderArg::Created => Self::CreatedDesc,
        }
    }
}

/// Arguments for `things-query tasks`.
#[derive(Args, Debug)]
pub struct TasksArgs {
    /// Row type: to-do, project or heading.
    #[arg(long = "type", value_name = "TYPE")]
    pub task_type: Option<TaskType>,

    /// Status: incomplete, completed or canceled.
    #[arg(short, long)]
    pub status: Option<Status>,

    /// Start bucket: inbox, anytime or someday.
    #[arg(long)]
    pub start: Option<StartBucket>,

    /// Start date filter (see DATE FILTERS).
    #[arg(long, value_name = "DATE", value_parser = parse_date_filter)]
    pub start_date: Option<DateFilter>,

    /// Completion/cancel date filter (see DATE FILTERS).
    #[arg(long, value_name = "DATE", value_parser = parse_date_filter)]
    pub stop_date: Option<DateFilter>,

    /// Deadline filter (see DATE FILTERS).
    #[arg(long, value_name = "DATE", value_parser = parse_date_filter)]
    pub deadline: Option<DateFilter>,

    /// Only the task with this uuid.
    #[arg(long)]
    pub uuid: Option<String>,

    /// Area uuid.
    #[arg(long, conflicts_with = "no_area")]
    pub area: Option<String>,

    /// Only tasks outside any area.
    #[arg(long)]
    pub no_area: bool,

    /// Project uuid; includes tasks under the project's headings.
    #[arg(long)]
    pub project: Option<String>,

    /// Heading uuid.
    #[arg(long)]
    pub heading: Option<String>,

    /// Tag title.
    #[arg(short, long, conflicts_with = "untagged")]
    pub tag: Option<String>,

    /// Only tasks without tags.
    #[arg(long)]
    pub untagged: bool,

    /// Only tasks that are trashed themselves.
    #[arg(long, conflicts_with = "include_trashed")]
    pub trashed: bool,

    /// Also list tasks inside trashed projects and headings.
    #[arg(long)]
    pub include_trashed: bool,

    /// Substring of title, notes or area title.
    #[arg(short = 'q', long)]
    pub search: Option<String>,

    /// Only tasks created after local midnight of this date.
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_iso_date)]
    pub created_after: Option<NaiveDate>,

    /// Sort order.
    #[arg(long, value_enum, default_value_t = OrderArg::Index)]
    pub order: OrderArg,

    /// Print the generated SQL instead of running it.
    #[arg(long)]
    pub sql: bool,

    #[command(flatten)]
    pub list: ListArgs,
}

/// Parse a date filter argument.
///
/// Accepted forms: `set`, `unset`, `future`, `past`, or a `YYYY-MM-DD`
/// date optionally prefixed by `=`, `<`, `<=`, `>` or `>=`.
pub fn parse_date_filter(raw: &str) -> Result<DateFilter, String> {
    let raw = raw.trim();
    match raw.to_ascii_lowercase().as_str() {
        "set" | "any" => return Ok(DateFilter::Exists(true)),
        "unset" | "none" => return Ok(DateFilter::Exists(false)),
        "" => return Err("empty date filter".to_string()),
        _ => {}
    }
    let (op, literal) = [
        ("<=", Comparison::BeforeOrEqual),
        (">=", Comparison::AfterOrEqual),
        ("<", Comparison::Before),
        (">", Comparison::After),
        ("=", Comparison::Equal),
    ]
    .into_iter()
    .find_map(|(prefix, op)| raw.strip_prefix(prefix).map(|rest| (op, rest.trim())))
    .unwrap_or((Comparison::Equal, raw));

    if op == Comparison::Equal {
        let parsed = DateFilter::parse(literal);
        if matches!(parsed, DateFilter::Future | DateFilter::Past) {
            return Ok(parsed);
        }
    }
    Ok(DateFilter::Compare(op, literal.to_string()))
}

/// The query layer skips malformed dates, which widens the result.
fn warn_if_malformed(flag: &str, value: &DateFilter) {
    if let Err(err) = value.validate() {
        warn!(flag, error = %err, "date filter ignored");
    }
}

impl TasksArgs {
    /// Translate the flags into a task query.
    pub fn query<'db>(&self, db: &'db Database) -> TaskQuery<'db> {
        let mut query = db.tasks().order_by(self.order.into());

        if let Some(task_type) = self.task_type {
            query = query.type_().is(task_type);
        }
        if let Some(status) = self.status {
            query = query.status().is(status);
        }
        if let Some(start) = self.start {
            query = query.start().is(start);
        }
        if let Some(ref value) = self.start_date {
            warn_if_malformed("--start-date", value);
            query = query.start_date().set(value.clone());
        }
        if let Some(ref value) = self.stop_date {
            warn_if_malformed("--stop-date", value);
            query = query.stop_date().set(value.clone());
        }
        if let Some(ref value) = self.deadline {
            warn_if_malformed("--deadline", value);
            query = query.deadline().set(value.clone());
        }
        if let Some(ref uuid) = self.uuid {
            query = query.with_uuid(uuid.as_str());
        }
        if let Some(ref area) = self.area {
            query = query.in_area(area.as_str());
        } else if self.no_area {
            query = query.has_area(false);
        }
        if let Some(ref project) = self.project {
            query = query.in_project(project.as_str());
        }
        if let Some(ref heading) = self.heading {
            query = query.in_heading(heading.as_str());
        }
        if let Some(ref tag) = self.tag {
            query = query.in_tag(tag.as_str());
        } else if self.untagged {
            query = query.has_tag(false);
        }
        if self.trashed {
            query = query.trashed(true);
        } else if !self.include_trashed {
            query = query.context_trashed(false);
        }
        if let Some(ref text) = self.search {
            query = query.search(text.as_str());
        }
        if let Some(since) = self
            .created_after
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        {
            query = query.created_after(&since);
        }
        if let Some(limit) = self.list.limit.and_then(|n| u32::try_from(n).ok()) {
            query = query.limit(limit);
        }
        query
    }
}

/// Run `things-query tasks`.
///
/// # Errors
///
/// Returns an error if the query fails or output cannot be written.
pub fn run_tasks(args: &TasksArgs, db: &Database, output: OutputMode) -> anyhow::Result<()> {
    let query = args.query(db);
    if args.sql {
        println!("{}", query.sql());
        return Ok(());
    }
    if args.list.count {
        let count = query.count()?;
        return crate::output::render(
            output,
            &serde_json::json!({ "list": "tasks", "count": count }),
            |_, w| writeln!(w, "{count}"),
        );
    }
    emit_tasks("tasks", query.all()?, &args.list, output)
}
