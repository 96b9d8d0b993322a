//! Fluent query builders.
//!
//! A [`TaskQuery`] holds one optional value per filter dimension. Setters
//! overwrite their dimension (last write wins), and the narrow
//! sub-builders returned by [`TaskQuery::type_`], [`TaskQuery::status`],
//! [`TaskQuery::start`] and the date methods can only write the dimension
//! they were created for. Nothing touches the database until a terminal
//! method (`all`, `first`, `count`) consumes the query.

mod area;
mod date;
mod tag;

pub use area::AreaQuery;
pub use date::{DateFilter, DateFilterBuilder, DateSlot};
pub use tag::TagQuery;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::db::schema::{
    self, HEADING_PROJECT, HEADING_TRASHED, PROJECT_OF_HEADING_TRASHED, PROJECT_TRASHED,
    TASK_AREA, TASK_CREATION_DATE, TASK_DEADLINE_SUPPRESSION, TASK_HEADING, TASK_PROJECT,
    TASK_START, TASK_STATUS, TASK_TRASHED, TASK_TYPE, TASK_UUID,
};
use crate::db::{Database, scan};
use crate::error::{Error, Result};
use crate::filter::{Filter, Filters, quote};
use crate::model::{StartBucket, Status, Task, TaskType};

/// Link to a containing record: a specific one, or merely whether one
/// exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// Uuid (area, project, heading) or title (tag) of the record.
    Is(String),
    Present(bool),
}

/// `EXISTS` test against a tag link table. `link` is `TMTaskTag` or
/// `TMAreaTag`, `owner_column` its column naming the tagged record and
/// `owner` the SQL reference to that record's uuid.
pub(crate) fn tagged(link: &str, owner_column: &str, owner: &str, relation: &Relation) -> Filter {
    let linked = format!(
        "SELECT 1 FROM {link} AS LINK JOIN {} AS TG ON TG.uuid = LINK.tags \
         WHERE LINK.{owner_column} = {owner}",
        schema::TAG_TABLE
    );
    match relation {
        Relation::Is(title) if title.is_empty() => Filter::raw(""),
        Relation::Is(title) => {
            Filter::raw(format!("EXISTS ({linked} AND TG.title = {})", quote(title)))
        }
        Relation::Present(true) => Filter::raw(format!("EXISTS ({linked})")),
        Relation::Present(false) => Filter::raw(format!("NOT EXISTS ({linked})")),
    }
}

fn limit_sql(limit: Option<u32>) -> String {
    limit.map(|n| format!("\nLIMIT {n}")).unwrap_or_default()
}

/// Result ordering of a task query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOrder {
    /// Manual order within the containing list.
    #[default]
    Index,
    /// Manual order within Today.
    TodayIndex,
    /// Start date ascending, unset last.
    StartDate,
    /// Deadline ascending, unset last.
    Deadline,
    /// Most recently completed or canceled first, unset last.
    StopDateDesc,
    /// Most recently created first.
    CreatedDesc,
}

impl TaskOrder {
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Index => "TASK.\"index\", TASK.uuid",
            Self::TodayIndex => "TASK.todayIndex, TASK.\"index\", TASK.uuid",
            Self::StartDate => {
                "IFNULL(TASK.startDate, 0) = 0, TASK.startDate, TASK.\"index\", TASK.uuid"
            }
            Self::Deadline => {
                "IFNULL(TASK.deadline, 0) = 0, TASK.deadline, TASK.\"index\", TASK.uuid"
            }
            Self::StopDateDesc => "TASK.stopDate IS NULL, TASK.stopDate DESC, TASK.uuid",
            Self::CreatedDesc => "TASK.creationDate DESC, TASK.uuid",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TaskSlots {
    task_type: Option<TaskType>,
    status: Option<Status>,
    start: Option<StartBucket>,
    start_date: Option<DateFilter>,
    stop_date: Option<DateFilter>,
    deadline: Option<DateFilter>,
    uuid: Option<String>,
    area: Option<Relation>,
    project: Option<Relation>,
    heading: Option<Relation>,
    tag: Option<Relation>,
    trashed: Option<bool>,
    context_trashed: Option<bool>,
    deadline_suppressed: Option<bool>,
    search: Option<String>,
    created_after: Option<DateTime<Utc>>,
}

/// Query over `TMTask`. See the [module docs](self).
#[derive(Debug, Clone)]
#[must_use = "queries do nothing until `all`, `first` or `count` runs them"]
pub struct TaskQuery<'db> {
    db: &'db Database,
    slots: TaskSlots,
    order: TaskOrder,
    limit: Option<u32>,
}

impl<'db> TaskQuery<'db> {
    pub(crate) const fn new(db: &'db Database) -> Self {
        Self {
            db,
            slots: TaskSlots {
                task_type: None,
                status: None,
                start: None,
                start_date: None,
                stop_date: None,
                deadline: None,
                uuid: None,
                area: None,
                project: None,
                heading: None,
                tag: None,
                trashed: None,
                context_trashed: None,
                deadline_suppressed: None,
                search: None,
                created_after: None,
            },
            order: TaskOrder::Index,
            limit: None,
        }
    }

    // -- sub-builders -------------------------------------------------------

    pub const fn type_(self) -> TypeFilter<'db> {
        TypeFilter(self)
    }

    pub const fn status(self) -> StatusFilter<'db> {
        StatusFilter(self)
    }

    pub const fn start(self) -> StartFilter<'db> {
        StartFilter(self)
    }

    pub const fn start_date(self) -> DateFilterBuilder<'db> {
        DateFilterBuilder::new(self, DateSlot::StartDate)
    }

    pub const fn stop_date(self) -> DateFilterBuilder<'db> {
        DateFilterBuilder::new(self, DateSlot::StopDate)
    }

    pub const fn deadline(self) -> DateFilterBuilder<'db> {
        DateFilterBuilder::new(self, DateSlot::Deadline)
    }

    // -- flat filters -------------------------------------------------------

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.slots.uuid = Some(uuid.into());
        self
    }

    pub fn in_area(mut self, uuid: impl Into<String>) -> Self {
        self.slots.area = Some(Relation::Is(uuid.into()));
        self
    }

    pub fn has_area(mut self, has: bool) -> Self {
        self.slots.area = Some(Relation::Present(has));
        self
    }

    /// Tasks of the project `uuid`, directly or under one of its headings.
    pub fn in_project(mut self, uuid: impl Into<String>) -> Self {
        self.slots.project = Some(Relation::Is(uuid.into()));
        self
    }

    pub fn has_project(mut self, has: bool) -> Self {
        self.slots.project = Some(Relation::Present(has));
        self
    }

    pub fn in_heading(mut self, uuid: impl Into<String>) -> Self {
        self.slots.heading = Some(Relation::Is(uuid.into()));
        self
    }

    pub fn has_heading(mut self, has: bool) -> Self {
        self.slots.heading = Some(Relation::Present(has));
        self
    }

    /// Tasks carrying the tag titled `title`.
    pub fn in_tag(mut self, title: impl Into<String>) -> Self {
        self.slots.tag = Some(Relation::Is(title.into()));
        self
    }

    pub fn has_tag(mut self, has: bool) -> Self {
        self.slots.tag = Some(Relation::Present(has));
        self
    }

    /// Filter on the task's own trashed flag.
    pub const fn trashed(mut self, trashed: bool) -> Self {
        self.slots.trashed = Some(trashed);
        self
    }

    /// Filter on the trashed flag of the task or anything containing it:
    /// its project, its heading, or its heading's project. Areas cannot be
    /// trashed and are not consulted.
    pub const fn context_trashed(mut self, trashed: bool) -> Self {
        self.slots.context_trashed = Some(trashed);
        self
    }

    /// Filter on whether an overdue deadline was dismissed.
    pub const fn deadline_suppressed(mut self, suppressed: bool) -> Self {
        self.slots.deadline_suppressed = Some(suppressed);
        self
    }

    /// Substring match on title, notes and area title.
    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.slots.search = Some(query.into());
        self
    }

    /// Tasks created strictly after `time`.
    pub fn created_after<Tz: TimeZone>(mut self, time: &DateTime<Tz>) -> Self {
        self.slots.created_after = Some(time.with_timezone(&Utc));
        self
    }

    pub const fn order_by(mut self, order: TaskOrder) -> Self {
        self.order = order;
        self
    }

    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    const fn with_type(mut self, task_type: Option<TaskType>) -> Self {
        self.slots.task_type = task_type;
        self
    }

    const fn with_status(mut self, status: Option<Status>) -> Self {
        self.slots.status = status;
        self
    }

    const fn with_start(mut self, start: Option<StartBucket>) -> Self {
        self.slots.start = start;
        self
    }

    fn with_date(mut self, slot: DateSlot, value: Option<DateFilter>) -> Self {
        match slot {
            DateSlot::StartDate => self.slots.start_date = value,
            DateSlot::StopDate => self.slots.stop_date = value,
            DateSlot::Deadline => self.slots.deadline = value,
        }
        self
    }

    // -- assembly -----------------------------------------------------------

    /// The filter list the populated slots assemble into.
    #[must_use]
    pub fn filters(&self) -> Filters {
        let s = &self.slots;
        let mut filters = Filters::new();

        filters.push(Filter::equal_opt(TASK_TYPE, s.task_type.map(TaskType::code)));
        filters.push(Filter::equal_opt(TASK_STATUS, s.status.map(Status::code)));
        filters.push(Filter::equal_opt(TASK_START, s.start.map(StartBucket::code)));

        for (slot, value) in [
            (DateSlot::StartDate, &s.start_date),
            (DateSlot::StopDate, &s.stop_date),
            (DateSlot::Deadline, &s.deadline),
        ] {
            if let Some(value) = value {
                filters.push(slot.filter(value));
            }
        }

        filters.push(Filter::equal_opt(TASK_UUID, s.uuid.clone()));

        match &s.area {
            Some(Relation::Is(uuid)) => filters.push(Filter::equal(TASK_AREA, uuid.as_str())),
            Some(Relation::Present(has)) => filters.push(Filter::equal(TASK_AREA, *has)),
            None => {}
        }

        match &s.project {
            Some(Relation::Is(uuid)) => filters.push(Filter::or([
                Filter::equal(TASK_PROJECT, uuid.as_str()),
                Filter::equal(HEADING_PROJECT, uuid.as_str()),
            ])),
            Some(Relation::Present(true)) => filters.push(Filter::or([
                Filter::equal(TASK_PROJECT, true),
                Filter::equal(HEADING_PROJECT, true),
            ])),
            Some(Relation::Present(false)) => filters.extend([
                Filter::equal(TASK_PROJECT, false),
                Filter::equal(HEADING_PROJECT, false),
            ]),
            None => {}
        }

        match &s.heading {
            Some(Relation::Is(uuid)) => filters.push(Filter::equal(TASK_HEADING, uuid.as_str())),
            Some(Relation::Present(has)) => filters.push(Filter::equal(TASK_HEADING, *has)),
            None => {}
        }

        if let Some(relation) = &s.tag {
            filters.push(tagged(schema::TASK_TAG_TABLE, "tasks", TASK_UUID, relation));
        }

        filters.push(Filter::truthy(TASK_TRASHED, s.trashed));

        let context = [
            TASK_TRASHED,
            PROJECT_TRASHED,
            HEADING_TRASHED,
            PROJECT_OF_HEADING_TRASHED,
        ];
        match s.context_trashed {
            Some(false) => {
                filters.extend(context.map(|column| Filter::truthy(column, Some(false))));
            }
            Some(true) => {
                filters.push(Filter::or(
                    context.map(|column| Filter::truthy(column, Some(true))),
                ));
            }
            None => {}
        }

        filters.push(Filter::truthy(
            TASK_DEADLINE_SUPPRESSION,
            s.deadline_suppressed,
        ));
        if let Some(query) = &s.search {
            filters.push(Filter::search(query.as_str()));
        }
        filters.push(Filter::created_after(
            TASK_CREATION_DATE,
            s.created_after.as_ref(),
        ));

        filters
    }

    /// The full `SELECT` statement [`TaskQuery::all`] would run.
    #[must_use]
    pub fn sql(&self) -> String {
        format!(
            "SELECT {}\nFROM {}\nWHERE {}\nORDER BY {}{}",
            schema::task_columns(),
            schema::TASK_FROM,
            self.filters().sql(),
            self.order.sql(),
            limit_sql(self.limit)
        )
    }

    // -- terminals ----------------------------------------------------------

    /// Every matching task. Zero rows is an empty vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be scanned.
    pub fn all(self) -> Result<Vec<Task>> {
        self.db.query_rows(&self.sql(), scan::task)
    }

    /// The first matching task in query order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when nothing matches, or any error from
    /// [`TaskQuery::all`].
    pub fn first(self) -> Result<Task> {
        self.limit(1)
            .all()?
            .into_iter()
            .next()
            .ok_or(Error::NotFound { entity: "task" })
    }

    /// Number of matching tasks, ignoring any limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(self) -> Result<u64> {
        let sql = format!(
            "SELECT COUNT(*)\nFROM {}\nWHERE {}",
            schema::TASK_FROM,
            self.filters().sql()
        );
        self.db.query_count(&sql)
    }
}

// ---------------------------------------------------------------------------
// Sub-builders
// ---------------------------------------------------------------------------

/// Writes the task type slot. Returned by [`TaskQuery::type_`].
#[derive(Debug, Clone)]
#[must_use = "a type filter does nothing until a setter returns the query"]
pub struct TypeFilter<'db>(TaskQuery<'db>);

impl<'db> TypeFilter<'db> {
    pub fn is(self, task_type: TaskType) -> TaskQuery<'db> {
        self.0.with_type(Some(task_type))
    }

    pub fn todo(self) -> TaskQuery<'db> {
        self.is(TaskType::Todo)
    }

    pub fn project(self) -> TaskQuery<'db> {
        self.is(TaskType::Project)
    }

    pub fn heading(self) -> TaskQuery<'db> {
        self.is(TaskType::Heading)
    }
}

/// Writes the status slot. Returned by [`TaskQuery::status`].
#[derive(Debug, Clone)]
#[must_use = "a status filter does nothing until a setter returns the query"]
pub struct StatusFilter<'db>(TaskQuery<'db>);

impl<'db> StatusFilter<'db> {
    pub fn is(self, status: Status) -> TaskQuery<'db> {
        self.0.with_status(Some(status))
    }

    pub fn incomplete(self) -> TaskQuery<'db> {
        self.is(Status::Incomplete)
    }

    pub fn completed(self) -> TaskQuery<'db> {
        self.is(Status::Completed)
    }

    pub fn canceled(self) -> TaskQuery<'db> {
        self.is(Status::Canceled)
    }

    /// Clear the slot so every status matches.
    pub fn any(self) -> TaskQuery<'db> {
        self.0.with_status(None)
    }
}

/// Writes the start bucket slot. Returned by [`TaskQuery::start`].
#[derive(Debug, Clone)]
#[must_use = "a start filter does nothing until a setter returns the query"]
pub struct StartFilter<'db>(TaskQuery<'db>);

impl<'db> StartFilter<'db> {
    pub fn is(self, start: StartBucket) -> TaskQuery<'db> {
        self.0.with_start(Some(start))
    }

    pub fn inbox(self) -> TaskQuery<'db> {
        self.is(StartBucket::Inbox)
    }

    pub fn anytime(self) -> TaskQuery<'db> {
        self.is(StartBucket::Anytime)
    }

    pub fn someday(self) -> TaskQuery<'db> {
        self.is(StartBucket::Someday)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ALWAYS_TRUE;
    use chrono::NaiveDate;

    fn db() -> Database {
        Database::open_in_memory().expect("open in-memory db")
    }

    #[test]
    fn empty_query_matches_everything() {
        let db = db();
        let query = db.tasks();
        assert!(query.filters().is_empty());
        assert_eq!(query.filters().sql(), ALWAYS_TRUE);
        assert!(query.sql().contains("WHERE TRUE\n"));
    }

    #[test]
    fn sub_builders_write_their_own_slot() {
        let db = db();
        let sql = db
            .tasks()
            .type_()
            .todo()
            .status()
            .incomplete()
            .start()
            .anytime()
            .filters()
            .sql();
        assert_eq!(
            sql,
            "TASK.type = '0'\n    AND TASK.status = '0'\n    AND TASK.start = '1'"
        );
    }

    #[test]
    fn last_write_wins() {
        let db = db();
        let sql = db
            .tasks()
            .status()
            .completed()
            .status()
            .canceled()
            .with_uuid("a")
            .with_uuid("b")
            .filters()
            .sql();
        assert_eq!(sql, "TASK.status = '2'\n    AND TASK.uuid = 'b'");
    }

    #[test]
    fn status_any_clears_slot() {
        let db = db();
        let query = db.tasks().status().completed().status().any();
        assert!(query.filters().is_empty());
    }

    #[test]
    fn date_slots_are_independent() {
        let db = db();
        let pivot = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let sql = db
            .tasks()
            .start_date()
            .before(pivot)
            .deadline()
            .exists(true)
            .stop_date()
            .on_or_after(pivot)
            .filters()
            .sql();
        assert_eq!(
            sql,
            "TASK.startDate < 132649088\n    AND \
             date(TASK.stopDate, 'unixepoch', 'localtime') >= date('2024-01-01')\n    AND \
             TASK.deadline IS NOT NULL"
        );
    }

    #[test]
    fn invalid_date_literal_keeps_chain_intact() {
        let db = db();
        let sql = db
            .tasks()
            .status()
            .incomplete()
            .deadline()
            .compare(crate::filter::DateOp::Equal, "2024-13-40")
            .type_()
            .todo()
            .filters()
            .sql();
        assert_eq!(sql, "TASK.type = '0'\n    AND TASK.status = '0'");
    }

    #[test]
    fn project_membership_includes_headings() {
        let db = db();
        assert_eq!(
            db.tasks().in_project("P").filters().sql(),
            "(TASK.project = 'P' OR HEADING.project = 'P')"
        );
        assert_eq!(
            db.tasks().has_project(true).filters().sql(),
            "(TASK.project IS NOT NULL OR HEADING.project IS NOT NULL)"
        );
        assert_eq!(
            db.tasks().has_project(false).filters().sql(),
            "TASK.project IS NULL\n    AND HEADING.project IS NULL"
        );
    }

    #[test]
    fn context_trashed_covers_every_container() {
        let db = db();
        assert_eq!(
            db.tasks().context_trashed(false).filters().sql(),
            "NOT IFNULL(TASK.trashed, 0)\n    AND NOT IFNULL(PROJECT.trashed, 0)\n    AND \
             NOT IFNULL(HEADING.trashed, 0)\n    AND NOT IFNULL(PROJECT_OF_HEADING.trashed, 0)"
        );
        assert_eq!(
            db.tasks().context_trashed(true).filters().sql(),
            "(TASK.trashed OR PROJECT.trashed OR HEADING.trashed OR PROJECT_OF_HEADING.trashed)"
        );
    }

    #[test]
    fn tag_filter_escapes_title() {
        let db = db();
        let sql = db.tasks().in_tag("Mom's").filters().sql();
        assert!(sql.starts_with("EXISTS (SELECT 1 FROM TMTaskTag AS LINK"));
        assert!(sql.ends_with("AND TG.title = 'Mom''s')"));
        assert!(db.tasks().in_tag("").filters().is_empty());
        assert!(
            db.tasks()
                .has_tag(false)
                .filters()
                .sql()
                .starts_with("NOT EXISTS")
        );
    }

    #[test]
    fn search_and_created_after() {
        let db = db();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("utc");
        let sql = db.tasks().search("it's").created_after(&at).filters().sql();
        assert_eq!(
            sql,
            "(TASK.title LIKE '%it''s%' OR TASK.notes LIKE '%it''s%' OR AREA.title LIKE \
             '%it''s%')\n    AND TASK.creationDate > 1704067200"
        );
    }

    #[test]
    fn order_and_limit_render() {
        let db = db();
        let sql = db
            .tasks()
            .order_by(TaskOrder::StopDateDesc)
            .limit(5)
            .sql();
        assert!(sql.ends_with("ORDER BY TASK.stopDate IS NULL, TASK.stopDate DESC, TASK.uuid\nLIMIT 5"));
    }

    #[test]
    fn every_filter_prepares_against_schema() {
        let db = db();
        let pivot = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let query = db
            .tasks()
            .type_()
            .project()
            .status()
            .completed()
            .start()
            .someday()
            .start_date()
            .future()
            .stop_date()
            .on(pivot)
            .deadline()
            .past()
            .with_uuid("u")
            .in_area("a")
            .in_project("p")
            .has_heading(true)
            .in_tag("t")
            .trashed(false)
            .context_trashed(false)
            .deadline_suppressed(false)
            .search("s")
            .created_after(&Utc::now());
        assert!(query.clone().all().expect("runs").is_empty());
        assert_eq!(query.count().expect("counts"), 0);
    }

    #[test]
    fn first_on_empty_is_not_found() {
        let db = db();
        let err = db.tasks().first().expect_err("no rows");
        assert!(err.is_not_found());
    }
}
