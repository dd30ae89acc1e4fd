use super::context::AppContext;
use crate::output::{or_dash, table, Output};
use catalog_sync_core::ViewRequest;
use catalog_sync_models::{ItemRef, ViewKey, ViewType};
use color_eyre::eyre::eyre;
use color_eyre::Result;

pub enum VirtualAction {
    Get {
        data_url: String,
        name: Option<String>,
        background: Option<String>,
    },
    More { data_url: String },
    Invalidate,
}

async fn print_refs(ctx: &AppContext, refs: &[ItemRef], output: &Output) {
    let mut rows = Vec::with_capacity(refs.len());
    for r in refs {
        let title = ctx.store.get(r.kind, r.tmdb_id).await.map(|item| item.title);
        rows.push((r, title));
    }
    output.result(&refs, || {
        let mut t = table(["Kind", "TMDB", "Title"]);
        for (r, title) in &rows {
            t.add_row(vec![r.kind.to_string(), r.tmdb_id.to_string(), or_dash(title.as_deref())]);
        }
        t
    });
}

pub async fn run_virtual(
    ctx: &AppContext,
    view_type: &str,
    item_id: &str,
    action: VirtualAction,
    output: &Output,
) -> Result<()> {
    let view_type: ViewType = view_type.parse().map_err(|e: String| eyre!(e))?;
    let key = ViewKey::new(view_type, item_id);
    let cache = ctx.virtual_lists();

    match action {
        VirtualAction::Get { data_url, name, background } => {
            let mut request = ViewRequest::new(key, data_url);
            if let Some(name) = name {
                request = request.with_name(name);
            }
            if let Some(url) = background {
                request = request.with_background(url);
            }
            let refs = cache.get(&request).await?;
            ctx.persist().await?;
            print_refs(ctx, &refs, output).await;
        }
        VirtualAction::More { data_url } => {
            let request = ViewRequest::new(key, data_url);
            let refs = cache.load_more(&request).await?;
            ctx.persist().await?;
            if refs.is_empty() {
                output.info("No more items");
            }
            print_refs(ctx, &refs, output).await;
        }
        VirtualAction::Invalidate => {
            let removed = cache.invalidate(&key).await;
            ctx.persist().await?;
            if removed {
                output.success(format!("Invalidated {}", key));
            } else {
                output.warn(format!("{} was not cached", key));
            }
        }
    }
    Ok(())
}

pub async fn run_sweep(ctx: &AppContext, output: &Output) -> Result<()> {
    let report = ctx.virtual_lists().sweep_expired().await;
    ctx.persist().await?;
    output.result(&report, || {
        let mut t = table(["Expired entries", "Orphaned reference sets"]);
        t.add_row(vec![report.expired.to_string(), report.orphans.to_string()]);
        t
    });
    Ok(())
}
