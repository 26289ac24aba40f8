//! The entity types that have a table.

use tabled::{builder::Builder, settings::Style};

use netdeck_business::table::EntityCatalog;

use crate::context::AppContext;

fn entities_table(catalog: &EntityCatalog) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Type", "Model", "Columns", "Scopes"]);
    for entity_type in catalog.entity_types() {
        let Some(config) = catalog.get(&entity_type) else {
            continue;
        };
        let mut scopes = Vec::new();
        if config.user_filtering {
            scopes.push("user");
        }
        if config.parent_filtering {
            scopes.push("parent");
        }
        if config.serialized_search {
            scopes.push("query");
        }
        builder.push_record([
            entity_type.to_string(),
            config.model().to_string(),
            config.columns.len().to_string(),
            scopes.join(", "),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

pub fn run_entities(ctx: &AppContext) {
    ctx.out.print(entities_table(ctx.registry.catalog()));
}
