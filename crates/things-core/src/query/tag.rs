use super::limit_sql;
use crate::db::schema::{self, AREA_TAG_TABLE, TASK_TAG_TABLE};
use crate::db::{Database, scan};
use crate::error::{Error, Result};
use crate::filter::{Filter, Filters, quote};
use crate::model::Tag;

/// Query over `TMTag`, ordered by the tag list order.
#[derive(Debug, Clone)]
#[must_use = "queries do nothing until `all`, `first` or `count` runs them"]
pub struct TagQuery<'db> {
    db: &'db Database,
    uuid: Option<String>,
    title: Option<String>,
    area: Option<String>,
    task: Option<String>,
    limit: Option<u32>,
}

impl<'db> TagQuery<'db> {
    pub(crate) const fn new(db: &'db Database) -> Self {
        Self {
            db,
            uuid: None,
            title: None,
            area: None,
            task: None,
            limit: None,
        }
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    /// Exact title match.
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Tags attached to the area `uuid`.
    pub fn in_area(mut self, uuid: impl Into<String>) -> Self {
        self.area = Some(uuid.into());
        self
    }

    /// Tags attached to the task `uuid`.
    pub fn in_task(mut self, uuid: impl Into<String>) -> Self {
        self.task = Some(uuid.into());
        self
    }

    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn filters(&self) -> Filters {
        let linked = |table: &str, column: &str, owner: &Option<String>| {
            owner.as_ref().map_or_else(
                || Filter::raw(""),
                |uuid| {
                    Filter::raw(format!(
                        "EXISTS (SELECT 1 FROM {table} AS LINK \
                         WHERE LINK.tags = TAG.uuid AND LINK.{column} = {})",
                        quote(uuid)
                    ))
                },
            )
        };

        Filters::new()
            .with(Filter::equal_opt("TAG.uuid", self.uuid.clone()))
            .with(Filter::equal_opt("TAG.title", self.title.clone()))
            .with(linked(AREA_TAG_TABLE, "areas", &self.area))
            .with(linked(TASK_TAG_TABLE, "tasks", &self.task))
    }

    #[must_use]
    pub fn sql(&self) -> String {
        format!(
            "SELECT {}\nFROM {}\nWHERE {}\nORDER BY TAG.\"index\", TAG.uuid{}",
            schema::TAG_COLUMNS,
            schema::TAG_FROM,
            self.filters().sql(),
            limit_sql(self.limit)
        )
    }

    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be scanned.
    pub fn all(self) -> Result<Vec<Tag>> {
        self.db.query_rows(&self.sql(), scan::tag)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when nothing matches.
    pub fn first(self) -> Result<Tag> {
        self.limit(1)
            .all()?
            .into_iter()
            .next()
            .ok_or(Error::NotFound { entity: "tag" })
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(self) -> Result<u64> {
        let sql = format!(
            "SELECT COUNT(*)\nFROM {}\nWHERE {}",
            schema::TAG_FROM,
            self.filters().sql()
        );
        self.db.query_count(&sql)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::filter::ALWAYS_TRUE;

    #[test]
    fn filters_render() {
        let db = Database::open_in_memory().expect("open in-memory db");
        assert_eq!(db.tags().filters().sql(), ALWAYS_TRUE);
        assert_eq!(
            db.tags().titled("Errand").filters().sql(),
            "TAG.title = 'Errand'"
        );
        assert_eq!(
            db.tags().in_task("T'1").filters().sql(),
            "EXISTS (SELECT 1 FROM TMTaskTag AS LINK WHERE LINK.tags = TAG.uuid \
             AND LINK.tasks = 'T''1')"
        );
    }

    #[test]
    fn terminals_run_on_empty_db() {
        let db = Database::open_in_memory().expect("open in-memory db");
        assert!(db.tags().in_area("A").all().expect("all").is_empty());
        assert_eq!(db.tags().count().expect("count"), 0);
        let err = db.tags().with_uuid("missing").first().expect_err("no rows");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "tag not found");
    }
}
