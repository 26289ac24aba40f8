mod args;
mod cli;
mod commands;
mod config;
mod context;
mod output;
mod render;
mod timing;

use std::{process::ExitCode, sync::Arc};

use anyhow::{Context as _, Result};
use clap::Parser as _;
use tracing::{debug, instrument};

use netdeck_business::table::EntityCatalog;
use netdeck_clipboard::SystemClipboard;
use netdeck_states::FileStorage;

use crate::{
    cli::{Cli, Commands},
    commands::ListRequest,
    config::Config,
    context::AppContext,
    output::Output,
    timing::init_tracing,
};

/// File settings, then `NETDECK_*` variables, then `--server`.
#[instrument(skip_all, name = "build_context")]
fn build_context(server: Option<String>) -> Result<AppContext> {
    let file = Config::load()?;
    let mut business = file.business_config()?.apply_env()?;
    if let Some(url) = server {
        business.server_url = url;
    }
    debug!("Using server {}", business.server_url);

    let mut catalog = EntityCatalog::builtin();
    if let Some(properties) = file.table_properties()? {
        catalog
            .apply_table_properties(&properties)
            .context("Failed to apply table properties")?;
    }

    let storage_path = Config::storage_path()?;
    let storage = FileStorage::open(&storage_path)
        .with_context(|| format!("Failed to open {}", storage_path.display()))?;

    Ok(AppContext::new(
        business,
        catalog,
        Arc::new(storage),
        Box::new(SystemClipboard),
    ))
}

async fn dispatch(ctx: &mut AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Entities => commands::run_entities(ctx),
        Commands::List {
            table,
            page,
            page_size,
            sort,
            query,
            count,
            export,
            copy,
            link,
        } => {
            commands::run_list(
                ctx,
                ListRequest {
                    table,
                    page,
                    page_size,
                    sort,
                    query,
                    count,
                    export,
                    copy,
                    link,
                },
            )
            .await?;
        }
        Commands::Columns { entity, show } => commands::run_columns(ctx, &entity, show).await?,
        Commands::Scope { entity } => commands::run_scope(ctx, &entity).await?,
        Commands::Delete { table, yes } => commands::run_delete(ctx, table, yes).await?,
        Commands::Remove { table, yes } => commands::run_remove(ctx, table, yes).await?,
        Commands::Edit {
            table,
            changes,
            modes,
            yes,
        } => commands::run_edit(ctx, table, &changes, &modes, yes).await?,
        Commands::Watch { table, interval } => {
            commands::run_watch(ctx, table, interval, None).await?;
        }
        Commands::Changelog { entity } => commands::run_changelog(ctx, &entity).await?,
        Commands::Completions { shell } => commands::generate_completions(shell),
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        commands::generate_completions(shell);
        return Ok(());
    }

    let mut ctx = build_context(cli.server)?;
    let result = dispatch(&mut ctx, cli.command).await;
    ctx.flush_notifications();
    ctx.registry.dispose_all();
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.timing);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            Output::new().error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
