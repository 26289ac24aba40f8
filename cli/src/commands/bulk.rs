//! Bulk deletion, removal and edit over everything a search matches.

use anyhow::{Result, bail};
use inquire::Confirm;
use tracing::instrument;
use ustr::Ustr;

use crate::{
    args::bulk_changes,
    cli::TableArgs,
    commands::{open_table, print_table},
    context::AppContext,
};

/// Asks before touching every matching row. `yes` skips the prompt.
fn confirm(ctx: &AppContext, id: Ustr, action: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    let total = ctx
        .registry
        .get(&id)
        .and_then(|table| table.record_count())
        .map(|count| format!("{count} "))
        .unwrap_or_default();
    let proceed = Confirm::new(&format!(
        "{action} all {total}rows matching the current search in {id}?"
    ))
    .with_default(false)
    .prompt()?;
    if !proceed {
        ctx.out.dim("Cancelled.");
    }
    Ok(proceed)
}

#[instrument(skip_all, name = "delete", fields(entity = %args.entity))]
pub async fn run_delete(ctx: &mut AppContext, args: TableArgs, yes: bool) -> Result<()> {
    let id = open_table(ctx, &args, |options| options.display_pagination()).await?;
    if !confirm(ctx, id, "Delete", yes)? {
        return Ok(());
    }

    let result = ctx.registry.bulk_deletion(&id).await;
    ctx.flush_notifications();
    result?;
    print_table(ctx, id)
}

#[instrument(skip_all, name = "remove", fields(entity = %args.entity))]
pub async fn run_remove(ctx: &mut AppContext, args: TableArgs, yes: bool) -> Result<()> {
    if args.parent.is_none() {
        bail!("Bulk removal needs --parent, --from and --to");
    }
    let id = open_table(ctx, &args, |options| options.display_pagination()).await?;
    if !confirm(ctx, id, "Remove", yes)? {
        return Ok(());
    }

    let result = ctx.registry.bulk_removal(&id).await;
    ctx.flush_notifications();
    result?;
    print_table(ctx, id)
}

#[instrument(skip_all, name = "edit", fields(entity = %args.entity))]
pub async fn run_edit(
    ctx: &mut AppContext,
    args: TableArgs,
    changes: &[String],
    modes: &[String],
    yes: bool,
) -> Result<()> {
    let changes = bulk_changes(changes, modes)?;
    let id = open_table(ctx, &args, |options| options.display_pagination()).await?;
    if !confirm(ctx, id, "Edit", yes)? {
        return Ok(());
    }

    let result = ctx.registry.bulk_edit(&id, &changes).await;
    ctx.flush_notifications();
    result?;
    print_table(ctx, id)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, ResponseTemplate,
        matchers::{body_partial_json, method, path},
    };

    use super::*;
    use crate::commands::test_support::{bodies, mock_context, respond};

    #[tokio::test]
    async fn delete_sends_the_search() {
        let (mock, mut ctx) = mock_context().await;
        respond(&mock, "/filtering/device", json!({"data": []})).await;
        respond(&mock, "/bulk_deletion/device", json!(3)).await;

        let args = TableArgs {
            entity: "device".to_owned(),
            searches: vec!["vendor=Arista".to_owned()],
            ..TableArgs::default()
        };
        run_delete(&mut ctx, args, true).await.unwrap();

        let sent = bodies(&mock, "/bulk_deletion/device").await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["form"]["vendor"], "Arista");
    }

    #[tokio::test]
    async fn removal_targets_the_parent_relation() {
        let (mock, mut ctx) = mock_context().await;
        respond(&mock, "/filtering/device", json!({"data": []})).await;
        respond(&mock, "/bulk_removal/device/pool/3/devices", json!(2)).await;

        let args = TableArgs {
            entity: "device".to_owned(),
            parent: Some("pool:3:core".to_owned()),
            from: Some("pools".to_owned()),
            to: Some("devices".to_owned()),
            ..TableArgs::default()
        };
        run_remove(&mut ctx, args, true).await.unwrap();

        let sent = bodies(&mock, "/bulk_removal/device/pool/3/devices").await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["constraints"]["pools"], json!(["core"]));
    }

    #[tokio::test]
    async fn removal_without_parent_is_refused() {
        let (mock, mut ctx) = mock_context().await;
        let args = TableArgs {
            entity: "device".to_owned(),
            ..TableArgs::default()
        };
        assert!(run_remove(&mut ctx, args, true).await.is_err());
        assert!(bodies(&mock, "/filtering/device").await.is_empty());
    }

    #[tokio::test]
    async fn edit_posts_the_changed_properties() {
        let (mock, mut ctx) = mock_context().await;
        Mock::given(method("POST"))
            .and(path("/filtering/device"))
            .and(body_partial_json(json!({"bulk": "id"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([4, 5])))
            .with_priority(1)
            .mount(&mock)
            .await;
        respond(&mock, "/filtering/device", json!({"data": []})).await;
        respond(&mock, "/bulk_edit/device", json!(2)).await;

        let args = TableArgs {
            entity: "device".to_owned(),
            ..TableArgs::default()
        };
        run_edit(
            &mut ctx,
            args,
            &["vendor=Juniper".to_owned()],
            &[],
            true,
        )
        .await
        .unwrap();

        let sent = bodies(&mock, "/bulk_edit/device").await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["id"], "4-5");
        assert_eq!(sent[0]["vendor"], "Juniper");
        assert_eq!(sent[0]["bulk-edit-vendor"], true);
    }
}
