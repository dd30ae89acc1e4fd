use super::context::AppContext;
use crate::output::{or_dash, table, Output};
use catalog_sync_core::SyncReport;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use owo_colors::OwoColorize;
use serde_json::json;

fn report_table(reports: &[SyncReport]) -> comfy_table::Table {
    let mut t = table(["List", "Page", "Fetched", "Written", "Re-ranked", "Skipped"]);
    for r in reports {
        t.add_row(vec![
            r.list_id.clone(),
            r.page.to_string(),
            r.fetched.to_string(),
            r.written.to_string(),
            r.reranked.to_string(),
            r.skipped.to_string(),
        ]);
    }
    t
}

pub async fn run_sync(ctx: &AppContext, list_id: &str, page: u32, output: &Output) -> Result<()> {
    let report = ctx.sync_orchestrator().sync_page(list_id, page).await?;
    ctx.persist().await?;

    if report.is_exhausted() {
        output.info(format!("{} page {} is empty: end of list", list_id, page));
    }
    output.result(&report, || report_table(std::slice::from_ref(&report)));
    Ok(())
}

pub async fn run_refresh(ctx: &AppContext, list_id: Option<String>, output: &Output) -> Result<()> {
    let orchestrator = ctx.sync_orchestrator();
    let results = match list_id {
        Some(id) => {
            let result = orchestrator.refresh_list(&id).await;
            vec![(id, result)]
        }
        None => orchestrator.refresh_all().await,
    };
    ctx.persist().await?;

    let mut reports = Vec::new();
    let mut failures = Vec::new();
    for (id, result) in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                output.error(format!("{}: {}", id, e));
                failures.push(json!({ "list_id": id, "error": e.to_string() }));
            }
        }
    }

    output.result(&json!({ "reports": reports, "failures": failures }), || {
        report_table(&reports)
    });
    if failures.is_empty() {
        Ok(())
    } else {
        Err(eyre!("{} list(s) failed to refresh", failures.len()))
    }
}

pub async fn run_show(ctx: &AppContext, list_id: &str, limit: usize, output: &Output) -> Result<()> {
    let source = ctx.registry().resolve(list_id)?;
    let mut items = ctx.store.ordered(source.kind, &source.cache_key).await;
    items.truncate(limit);

    if output.is_human() && items.is_empty() {
        output.warn(format!("{} is empty; run `catalogsync refresh {}` first", list_id, list_id));
        return Ok(());
    }

    output.result(&items, || {
        let mut t = table(["#", "Title", "Year", "Rating", "Trakt", "Logo", "Enriched"]);
        for item in &items {
            t.add_row(vec![
                or_dash(item.order_in(&source.cache_key)),
                item.title.clone(),
                or_dash(item.year),
                or_dash(item.rating.map(|r| format!("{:.1}", r))),
                or_dash(item.catalog_rating.map(|r| format!("{:.1}", r))),
                if item.logo_url.is_some() {
                    "✓".green().to_string()
                } else {
                    "-".to_string()
                },
                item.last_enriched.format("%Y-%m-%d").to_string(),
            ]);
        }
        t
    });
    Ok(())
}
