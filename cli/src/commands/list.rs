//! List one page of an entity table.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use tracing::instrument;

use netdeck_business::table::{QueryOutcome, TableController, TableEffect, TableError};

use crate::{
    args::parse_sort,
    cli::TableArgs,
    commands::{check_outcome, live, open_table, print_table},
    context::AppContext,
};

#[derive(Debug, Default)]
pub struct ListRequest {
    pub table: TableArgs,
    pub page: usize,
    pub page_size: Option<usize>,
    pub sort: Option<String>,
    pub query: Option<String>,
    pub count: bool,
    pub export: Option<PathBuf>,
    pub copy: bool,
    pub link: Option<String>,
}

/// Waits out the search debounce, then runs the search once.
pub(crate) async fn settle_search(
    table: &mut TableController,
) -> Result<Option<QueryOutcome>, TableError> {
    while let Some(deadline) = table.search_deadline() {
        let wait = (deadline - Utc::now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;
        if let Some(outcome) = table.poll(Utc::now()).await? {
            return Ok(Some(outcome));
        }
    }
    Ok(None)
}

#[instrument(skip_all, name = "list", fields(entity = %request.table.entity, page = request.page))]
pub async fn run_list(ctx: &mut AppContext, request: ListRequest) -> Result<()> {
    let sort = request.sort.as_deref().map(parse_sort).transpose()?;
    let id = open_table(ctx, &request.table, |mut options| {
        options = options.page(request.page);
        if let Some(size) = request.page_size {
            options = options.page_size(size);
        }
        if let Some((key, direction)) = sort {
            options = options.sort(key, direction);
        }
        if request.count {
            options = options.display_pagination();
        }
        options
    })
    .await?;

    if let Some(query) = &request.query {
        let table = live(&mut ctx.registry, id)?;
        table.serialized_search(query, Utc::now())?;
        if let Some(outcome) = settle_search(table).await? {
            check_outcome(ctx, id, &outcome)?;
        }
    }

    if let Some(dir) = &request.export {
        let outcome = live(&mut ctx.registry, id)?.export_csv().await?;
        check_outcome(ctx, id, &outcome)?;
        if ctx.apply_effects(&outcome, Some(dir))?.is_empty() {
            ctx.out.warning("The server sent no export");
        }
    }

    if request.copy {
        let outcome = live(&mut ctx.registry, id)?.copy_to_clipboard().await?;
        check_outcome(ctx, id, &outcome)?;
        if outcome.effects().is_empty() {
            ctx.out.warning("The server sent nothing to copy");
        }
        ctx.apply_effects(&outcome, None)?;
    }

    if let Some(origin) = &request.link {
        let effect = live(&mut ctx.registry, id)?.copy_search_link(origin)?;
        if let TableEffect::CopyToClipboard(link) = effect {
            ctx.copy(&link)?;
            ctx.out.labeled("Search link", link);
        }
    }

    print_table(ctx, id)
}
