use super::context::AppContext;
use crate::output::{or_dash, table, Output};
use catalog_sync_models::ContinueWatchingEntry;
use color_eyre::Result;

fn describe(entry: &ContinueWatchingEntry) -> (&'static str, String) {
    match entry {
        ContinueWatchingEntry::MovieInProgress { .. } => ("In progress", String::new()),
        ContinueWatchingEntry::EpisodeInProgress { episode, .. } => {
            ("In progress", format!("S{:02}E{:02}", episode.season, episode.number))
        }
        ContinueWatchingEntry::EpisodeNextUp { episode, .. } => {
            ("Next up", format!("S{:02}E{:02}", episode.season, episode.number))
        }
    }
}

pub async fn run_continue_watching(ctx: &AppContext, cached: bool, output: &Output) -> Result<()> {
    let feed = if cached {
        ctx.store.continue_watching().await
    } else {
        let feed = ctx.continue_watching().resolve().await?;
        ctx.persist().await?;
        feed
    };

    if output.is_human() && feed.is_empty() {
        output.info("Nothing to continue watching");
        return Ok(());
    }

    output.result(&feed, || {
        let mut t = table(["Title", "Episode", "State", "Progress", "Last watched"]);
        for entry in &feed {
            let (state, episode) = describe(entry);
            t.add_row(vec![
                entry.title().to_string(),
                episode,
                state.to_string(),
                or_dash(entry.progress().map(|p| format!("{:.0}%", p))),
                entry.last_watched_at().to_string(),
            ]);
        }
        t
    });
    Ok(())
}
