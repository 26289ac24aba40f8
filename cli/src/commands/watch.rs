//! Periodic refresh of one table until Ctrl-C.

use std::time::Duration;

use anyhow::Result;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, instrument};

use netdeck_business::table::QueryOutcome;

use crate::{
    cli::TableArgs,
    commands::{open_table, print_table},
    context::AppContext,
};

pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(10);

/// `--interval`, then the configured rate for the entity, then the default.
pub fn watch_interval(ctx: &AppContext, entity: &str, seconds: Option<u64>) -> Duration {
    seconds
        .filter(|seconds| *seconds > 0)
        .map(Duration::from_secs)
        .or_else(|| ctx.registry.env().config().refresh_rate(entity))
        .unwrap_or(DEFAULT_WATCH_INTERVAL)
}

/// Refreshes `args`' table every tick until the table's token is cancelled,
/// either by Ctrl-C or by disposal. Returns the number of refreshes.
#[instrument(skip_all, name = "watch", fields(entity = %args.entity))]
pub async fn run_watch(
    ctx: &mut AppContext,
    args: TableArgs,
    seconds: Option<u64>,
    max_refreshes: Option<usize>,
) -> Result<usize> {
    let period = watch_interval(ctx, &args.entity, seconds);
    let id = open_table(ctx, &args, |options| options).await?;
    let token = ctx
        .registry
        .get(&id)
        .map(|table| table.cancellation_token())
        .ok_or_else(|| anyhow::anyhow!("Table {id} is not open"))?;

    let signal = tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        }
    });

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    let mut refreshes = 0;
    loop {
        ctx.out.clear();
        print_table(ctx, id)?;
        ctx.out
            .dim(format!("Refreshing every {}s, Ctrl-C to stop", period.as_secs()));
        if max_refreshes.is_some_and(|max| refreshes >= max) {
            break;
        }

        tokio::select! {
            () = token.cancelled() => break,
            _ = ticker.tick() => {
                let outcome = ctx.registry.refresh(&id, false).await?;
                ctx.flush_notifications();
                if matches!(outcome, QueryOutcome::Discarded) {
                    break;
                }
                refreshes += 1;
            }
        }
    }

    signal.abort();
    debug!("Stopped watching {id} after {refreshes} refresh(es)");
    ctx.registry.dispose(&id);
    Ok(refreshes)
}
