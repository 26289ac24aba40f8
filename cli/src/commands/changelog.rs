//! The changelog of one entity type.

use anyhow::Result;
use tracing::instrument;

use netdeck_business::table::Opened;

use crate::{
    commands::{check_outcome, entity_config, print_table},
    context::AppContext,
};

#[instrument(skip_all, name = "changelog", fields(entity = %entity))]
pub async fn run_changelog(ctx: &mut AppContext, entity: &str) -> Result<()> {
    entity_config(ctx, entity)?;
    let (id, opened) = ctx.registry.open_changelog(entity).await?;
    if let Opened::Created(Some(outcome)) = &opened {
        check_outcome(ctx, id, outcome)?;
    }
    print_table(ctx, id)
}
