//! Show or change which columns a table displays.

use anyhow::Result;
use tracing::instrument;

use crate::{
    cli::TableArgs,
    commands::{check_outcome, live, open_table},
    context::AppContext,
    render,
};

#[instrument(skip_all, name = "columns", fields(entity = %entity))]
pub async fn run_columns(
    ctx: &mut AppContext,
    entity: &str,
    show: Option<Vec<String>>,
) -> Result<()> {
    let args = TableArgs {
        entity: entity.to_owned(),
        ..TableArgs::default()
    };
    let id = open_table(ctx, &args, |options| options).await?;

    if let Some(keys) = show {
        let outcome = live(&mut ctx.registry, id)?
            .set_column_visibility(&keys)
            .await?;
        check_outcome(ctx, id, &outcome)?;
        ctx.out.success(format!("Saved the column display of {entity}"));
    }

    let table = live(&mut ctx.registry, id)?;
    ctx.out.print(render::columns_table(table));
    Ok(())
}
