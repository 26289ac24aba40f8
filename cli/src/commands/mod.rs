//! Command implementations for the netdeck CLI.
//!
//! Each subcommand is implemented in its own module. The helpers here open
//! tables and print them the same way for every command.

pub mod bulk;
pub mod changelog;
pub mod columns;
pub mod completions;
pub mod entities;
pub mod list;
pub mod scope;
pub mod watch;

use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use ustr::Ustr;

use netdeck_business::table::{
    EntityConfig, Opened, QueryOutcome, TableController, TableOptions, TableRegistry,
};

use crate::{args::table_options, cli::TableArgs, context::AppContext, render};

pub use bulk::{run_delete, run_edit, run_remove};
pub use changelog::run_changelog;
pub use columns::run_columns;
pub use completions::generate_completions;
pub use entities::run_entities;
pub use list::{ListRequest, run_list};
pub use scope::run_scope;
pub use watch::run_watch;

pub(crate) fn entity_config(ctx: &AppContext, entity: &str) -> Result<Arc<EntityConfig>> {
    ctx.registry.catalog().get(entity).ok_or_else(|| {
        anyhow!(
            "Unknown entity type `{entity}`; run `netdeck entities` for the list"
        )
    })
}

pub(crate) fn live(registry: &mut TableRegistry, id: Ustr) -> Result<&mut TableController> {
    registry
        .get_mut(&id)
        .ok_or_else(|| anyhow!("Table {id} is not open"))
}

/// Fails once the notifications explaining a failed query have been shown.
pub(crate) fn check_outcome(ctx: &AppContext, id: Ustr, outcome: &QueryOutcome) -> Result<()> {
    ctx.flush_notifications();
    match outcome {
        QueryOutcome::Failed { .. } => bail!("Query for table {id} failed"),
        _ => Ok(()),
    }
}

/// Opens the table `args` describe, with `extend` applied to its options.
pub(crate) async fn open_table(
    ctx: &mut AppContext,
    args: &TableArgs,
    extend: impl FnOnce(TableOptions) -> TableOptions,
) -> Result<Ustr> {
    let config = entity_config(ctx, &args.entity)?;
    let options = extend(table_options(args, &config)?);
    let (id, opened) = ctx.registry.open(&args.entity, options).await?;
    if let Opened::Created(Some(outcome)) = &opened {
        check_outcome(ctx, id, outcome)?;
    }
    Ok(id)
}

pub(crate) fn print_table(ctx: &AppContext, id: Ustr) -> Result<()> {
    let table = ctx
        .registry
        .get(&id)
        .ok_or_else(|| anyhow!("Table {id} is not open"))?;
    ctx.out.header(format!("{} ({id})", table.entity_type()));
    if table.rows().is_empty() {
        ctx.out.dim("No rows.");
    } else {
        ctx.out.print(render::rows_table(table));
    }
    ctx.out.dim(render::footer(table));
    ctx.out.dim(render::controls_line(&table.controls()));
    Ok(())
}
