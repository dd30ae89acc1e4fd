use super::context::AppContext;
use crate::output::{or_dash, table, Output};
use catalog_sync_models::{MediaKind, SearchHit};
use color_eyre::eyre::eyre;
use color_eyre::Result;

pub async fn run_ratings(ctx: &AppContext, kind: &str, trakt_id: u64, output: &Output) -> Result<()> {
    let kind: MediaKind = kind.parse().map_err(|e: String| eyre!(e))?;
    let record = ctx.ratings_cache().ratings(kind, trakt_id).await?;
    ctx.persist().await?;

    output.result(&record, || {
        let mut t = table(["Kind", "Trakt", "Rating", "Votes", "Fetched"]);
        t.add_row(vec![
            record.kind.to_string(),
            record.trakt_id.to_string(),
            format!("{:.2}", record.rating),
            record.votes.to_string(),
            record.fetched_at.to_rfc3339(),
        ]);
        t
    });
    Ok(())
}

fn hit_rows(t: &mut comfy_table::Table, label: &str, hits: &[SearchHit]) {
    for hit in hits {
        t.add_row(vec![
            label.to_string(),
            hit.title.clone(),
            or_dash(hit.year),
            or_dash(hit.trakt_id),
            or_dash(hit.tmdb_id),
            format!("{:?}", hit.source).to_lowercase(),
        ]);
    }
}

pub async fn run_search(ctx: &AppContext, query: &str, output: &Output) -> Result<()> {
    let results = ctx.search().search(query).await;
    if output.is_human() && results.is_empty() {
        output.info(format!("No results for '{}'", query));
        return Ok(());
    }

    output.result(&results, || {
        let mut t = table(["Type", "Name", "Year", "Trakt", "TMDB", "Source"]);
        hit_rows(&mut t, "movie", &results.movies);
        hit_rows(&mut t, "show", &results.shows);
        for person in &results.people {
            t.add_row(vec![
                "person".to_string(),
                person.name.clone(),
                or_dash(person.known_for.as_deref()),
                or_dash(person.trakt_id),
                or_dash(person.tmdb_id),
                format!("{:?}", person.source).to_lowercase(),
            ]);
        }
        t
    });
    Ok(())
}
