//! The derived lists: `today`, `upcoming`, `logbook` and friends.

use crate::output::{OutputMode, render, render_list};
use clap::Args;
use std::time::Duration;
use things_core::model::Task;
use things_core::{Database, views};
use tracing::debug;

/// A list the Things app computes rather than stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Today,
    Upcoming,
    Anytime,
    Someday,
    Inbox,
    Logbook,
    Trash,
    Completed,
    Canceled,
    Deadlines,
}

impl View {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Upcoming => "upcoming",
            Self::Anytime => "anytime",
            Self::Someday => "someday",
            Self::Inbox => "inbox",
            Self::Logbook => "logbook",
            Self::Trash => "trash",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::Deadlines => "deadlines",
        }
    }

    fn load(self, db: &Database) -> things_core::Result<Vec<Task>> {
        match self {
            Self::Today => views::today(db),
            Self::Upcoming => views::upcoming(db),
            Self::Anytime => views::anytime(db),
            Self::Someday => views::someday(db),
            Self::Inbox => views::inbox(db),
            Self::Logbook => views::logbook(db),
            Self::Trash => views::trash(db),
            Self::Completed => views::completed(db),
            Self::Canceled => views::canceled(db),
            Self::Deadlines => views::deadlines(db),
        }
    }
}

/// Arguments shared by every list-producing command.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Maximum tasks to show.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Print only the number of matching tasks.
    #[arg(long, conflicts_with = "limit")]
    pub count: bool,
}

/// Arguments for `things-query created-within`.
#[derive(Args, Debug)]
pub struct CreatedWithinArgs {
    /// Window length: a number followed by `m`, `h`, `d` or `w` (e.g. `3d`).
    #[arg(value_parser = parse_window)]
    pub window: Duration,

    #[command(flatten)]
    pub list: ListArgs,
}

/// Arguments for `things-query search`.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text to find in titles, notes and area titles.
    pub query: String,

    #[command(flatten)]
    pub list: ListArgs,
}

/// Parse `<count><unit>` into a duration.
pub fn parse_window(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("missing unit in '{raw}' (use m, h, d or w)"))?;
    let (count, unit) = raw.split_at(split);
    let count: u64 = count
        .parse()
        .map_err(|_| format!("missing count in '{raw}'"))?;
    let unit_secs = match unit {
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        "w" => 604_800,
        other => return Err(format!("unknown unit '{other}' (use m, h, d or w)")),
    };
    count
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("window '{raw}' is too large"))
}

/// Print a task list, honoring `--limit` and `--count`.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn emit_tasks(
    name: &str,
    mut tasks: Vec<Task>,
    args: &ListArgs,
    output: OutputMode,
) -> anyhow::Result<()> {
    debug!(list = name, rows = tasks.len(), "loaded tasks");
    if args.count {
        let count = tasks.len();
        return render(
            output,
            &serde_json::json!({ "list": name, "count": count }),
            |_, w| writeln!(w, "{count}"),
        );
    }
    if let Some(limit) = args.limit {
        tasks.truncate(limit);
    }
    render_list(&tasks, output)?;
    Ok(())
}

/// Run one of the fixed views.
///
/// # Errors
///
/// Returns an error if the view's queries fail or output cannot be written.
pub fn run_view(
    view: View,
    args: &ListArgs,
    db: &Database,
    output: OutputMode,
) -> anyhow::Result<()> {
    let tasks = view.load(db)?;
    emit_tasks(view.name(), tasks, args, output)
}

/// Run `things-query created-within`.
///
/// # Errors
///
/// Returns an error if the query fails or output cannot be written.
pub fn run_created_within(
    args: &CreatedWithinArgs,
    db: &Database,
    output: OutputMode,
) -> anyhow::Result<()> {
    let tasks = views::created_within(db, args.window)?;
    emit_tasks("created-within", tasks, &args.list, output)
}

/// Run `things-query search`.
///
/// # Errors
///
/// Returns an error if the query fails or output cannot be written.
pub fn run_search(args: &SearchArgs, db: &Database, output: OutputMode) -> anyhow::Result<()> {
    let tasks = views::search(db, &args.query)?;
    emit_tasks("search", tasks, &args.list, output)
}
