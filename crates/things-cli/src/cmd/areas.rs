//! `things-query areas`: list areas.

use crate::output::{OutputMode, render, render_list};
use clap::Args;
use things_core::Database;
use things_core::query::AreaQuery;

#[derive(Args, Debug)]
pub struct AreasArgs {
    /// Only areas carrying this tag title.
    #[arg(short, long, conflicts_with = "untagged")]
    pub tag: Option<String>,

    /// Only areas without tags.
    #[arg(long)]
    pub untagged: bool,

    /// Substring of the area title.
    #[arg(short = 'q', long)]
    pub search: Option<String>,

    /// Maximum areas to show.
    #[arg(short = 'n', long)]
    pub limit: Option<u32>,

    /// Print only the number of matching areas.
    #[arg(long, conflicts_with = "limit")]
    pub count: bool,
}

impl AreasArgs {
    pub fn query<'db>(&self, db: &'db Database) -> AreaQuery<'db> {
        let mut query = db.areas();
        if let Some(ref tag) = self.tag {
            query = query.in_tag(tag.as_str());
        } else if self.untagged {
            query = query.has_tag(false);
        }
        if let Some(ref text) = self.search {
            query = query.search(text.as_str());
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        query
    }
}

/// Run `things-query areas`.
///
/// # Errors
///
/// Returns an error if the query fails or output cannot be written.
pub fn run_areas(args: &AreasArgs, db: &Database, output: OutputMode) -> anyhow::Result<()> {
    let query = args.query(db);
    if args.count {
        let count = query.count()?;
        return render(
            output,
            &serde_json::json!({ "list": "areas", "count": count }),
            |_, w| writeln!(w, "{count}"),
        );
    }
    render_list(&query.all()?, output)?;
    Ok(())
}
