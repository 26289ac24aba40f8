//! Flip a user-scoped table between "mine" and "everyone".

use anyhow::Result;
use tracing::instrument;

use netdeck_business::table::UserScope;

use crate::{
    cli::TableArgs,
    commands::{check_outcome, live, open_table, print_table},
    context::AppContext,
};

#[instrument(skip_all, name = "scope", fields(entity = %entity))]
pub async fn run_scope(ctx: &mut AppContext, entity: &str) -> Result<()> {
    let args = TableArgs {
        entity: entity.to_owned(),
        ..TableArgs::default()
    };
    let id = open_table(ctx, &args, |options| options).await?;

    let table = live(&mut ctx.registry, id)?;
    let outcome = table.toggle_user_filtering().await?;
    let scope = table.state().user_scope;
    check_outcome(ctx, id, &outcome)?;

    ctx.out.success(match scope {
        UserScope::Mine => format!("{entity} tables now show only your rows"),
        UserScope::Everyone => format!("{entity} tables now show every user's rows"),
    });
    print_table(ctx, id)
}

#[cfg(test)]
mod tests {
    use netdeck_business::BusinessConfig;
    use serde_json::json;
    use wiremock::MockServer;

    use super::*;
    use crate::commands::test_support::{bodies, context, mock_context, respond};

    #[tokio::test]
    async fn toggling_persists_and_scopes_the_query() {
        let mock = MockServer::start().await;
        let mut config = BusinessConfig::new(mock.uri());
        config.current_user = Some("admin".to_owned());
        let mut ctx = context(config);
        respond(&mock, "/filtering/service", json!({"data": []})).await;

        run_scope(&mut ctx, "service").await.unwrap();

        assert_eq!(
            ctx.registry
                .env()
                .storage()
                .get("userFiltering-service")
                .as_deref(),
            Some("user")
        );
        let sent = bodies(&mock, "/filtering/service").await;
        assert_eq!(sent.len(), 2);
        assert!(sent[0]["constraints"].get("creator").is_none());
        assert_eq!(sent[1]["constraints"]["creator"], "admin");
    }

    #[tokio::test]
    async fn tables_without_user_scope_refuse() {
        let (mock, mut ctx) = mock_context().await;
        respond(&mock, "/filtering/device", json!({"data": []})).await;

        assert!(run_scope(&mut ctx, "device").await.is_err());
        assert!(ctx.registry.env().storage().get("userFiltering-device").is_none());
    }
}
