use super::{Relation, limit_sql, tagged};
use crate::db::schema::{self, AREA_TITLE};
use crate::db::{Database, scan};
use crate::error::{Error, Result};
use crate::filter::{Filter, Filters};
use crate::model::Area;

/// Query over `TMArea`, ordered by the sidebar order.
#[derive(Debug, Clone)]
#[must_use = "queries do nothing until `all`, `first` or `count` runs them"]
pub struct AreaQuery<'db> {
    db: &'db Database,
    uuid: Option<String>,
    tag: Option<Relation>,
    search: Option<String>,
    limit: Option<u32>,
}

impl<'db> AreaQuery<'db> {
    pub(crate) const fn new(db: &'db Database) -> Self {
        Self {
            db,
            uuid: None,
            tag: None,
            search: None,
            limit: None,
        }
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    /// Areas carrying the tag titled `title`.
    pub fn in_tag(mut self, title: impl Into<String>) -> Self {
        self.tag = Some(Relation::Is(title.into()));
        self
    }

    pub fn has_tag(mut self, has: bool) -> Self {
        self.tag = Some(Relation::Present(has));
        self
    }

    /// Substring match on the area title.
    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn filters(&self) -> Filters {
        let mut filters = Filters::new();
        filters.push(Filter::equal_opt("AREA.uuid", self.uuid.clone()));
        if let Some(relation) = &self.tag {
            filters.push(tagged(
                schema::AREA_TAG_TABLE,
                "areas",
                "AREA.uuid",
                relation,
            ));
        }
        if let Some(query) = &self.search {
            filters.push(Filter::search_in(query.as_str(), [AREA_TITLE]));
        }
        filters
    }

    #[must_use]
    pub fn sql(&self) -> String {
        format!(
            "SELECT {}\nFROM {}\nWHERE {}\nORDER BY AREA.\"index\", AREA.uuid{}",
            schema::area_columns(),
            schema::AREA_FROM,
            self.filters().sql(),
            limit_sql(self.limit)
        )
    }

    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be scanned.
    pub fn all(self) -> Result<Vec<Area>> {
        self.db.query_rows(&self.sql(), scan::area)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when nothing matches.
    pub fn first(self) -> Result<Area> {
        self.limit(1)
            .all()?
            .into_iter()
            .next()
            .ok_or(Error::NotFound { entity: "area" })
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(self) -> Result<u64> {
        let sql = format!(
            "SELECT COUNT(*)\nFROM {}\nWHERE {}",
            schema::AREA_FROM,
            self.filters().sql()
        );
        self.db.query_count(&sql)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[test]
    fn filters_render() {
        let db = Database::open_in_memory().expect("open in-memory db");
        assert_eq!(
            db.areas().with_uuid("A").search("Wo'rk").filters().sql(),
            "AREA.uuid = 'A'\n    AND (AREA.title LIKE '%Wo''rk%')"
        );
        let tagged = db.areas().in_tag("Home").filters().sql();
        assert!(tagged.starts_with("EXISTS (SELECT 1 FROM TMAreaTag AS LINK"));
        assert!(tagged.contains("LINK.areas = AREA.uuid"));
    }

    #[test]
    fn terminals_run_on_empty_db() {
        let db = Database::open_in_memory().expect("open in-memory db");
        assert!(db.areas().has_tag(true).all().expect("all").is_empty());
        assert_eq!(db.areas().count().expect("count"), 0);
        let err = db.areas().first().expect_err("no rows");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "area not found");
    }
}
