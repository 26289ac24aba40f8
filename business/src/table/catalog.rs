//! Built-in entity tables of the automation console.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use log::{debug, info};
use serde_json::{Map, Value, json};
use ustr::Ustr;

use crate::{
    filtering::SortDirection,
    table::{
        ActionKind, Cell, ColumnSet, ColumnSpec, ConstraintContext, ControlKind, DecorateContext,
        EntityConfig, RelationLink, RowIdentity, TableError, Tone,
    },
};

/// Entity configurations keyed by entity type.
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    entries: HashMap<Ustr, Arc<EntityConfig>>,
}

impl EntityCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        for config in [
            device(),
            network(),
            configuration(),
            link(),
            pool(),
            service(),
            run(),
            result(),
            full_result(),
            device_result(),
            task(),
            user(),
            credential(),
            server(),
            changelog(),
            session(),
            file(),
            worker(),
        ] {
            catalog.register(config);
        }
        catalog
    }

    pub fn register(&mut self, config: EntityConfig) {
        self.entries.insert(config.entity_type, Arc::new(config));
    }

    pub fn get(&self, entity_type: &str) -> Option<Arc<EntityConfig>> {
        self.entries.get(&Ustr::from(entity_type)).cloned()
    }

    pub fn entity_types(&self) -> Vec<Ustr> {
        let mut types: Vec<_> = self.entries.keys().copied().collect();
        types.sort_unstable_by(|a, b| a.as_str().cmp(b.as_str()));
        types
    }

    /// Replaces column lists from a `{type: [column, ...]}` document.
    /// Types the catalog does not know are skipped. Returns how many were replaced.
    pub fn apply_table_properties(&mut self, document: &str) -> Result<usize, TableError> {
        let properties: BTreeMap<String, Vec<ColumnSpec>> = serde_json::from_str(document)
            .map_err(|e| TableError::TableProperties(e.to_string()))?;

        let mut replaced = 0;
        for (entity_type, columns) in properties {
            let key = Ustr::from(&entity_type);
            let Some(existing) = self.entries.get(&key) else {
                debug!("Skipping table properties for unknown entity {entity_type}");
                continue;
            };
            ColumnSet::new(key, columns.clone())?;

            let mut config = EntityConfig::clone(existing);
            if config.ordering.0 >= columns.len() {
                config.ordering.0 = 0;
            }
            config.columns = columns;
            self.entries.insert(key, Arc::new(config));
            replaced += 1;
        }

        info!("Applied table properties to {replaced} entity table(s)");
        Ok(replaced)
    }
}

const INVENTORY_ACTIONS: [ActionKind; 4] = [
    ActionKind::Changelog,
    ActionKind::Edit,
    ActionKind::Duplicate,
    ActionKind::Delete,
];

const RESULT_CONTROLS: [ControlKind; 4] = [
    ControlKind::ColumnDisplay,
    ControlKind::Refresh,
    ControlKind::CopyLink,
    ControlKind::ClearSearch,
];

fn relation_cell(
    cells: &mut BTreeMap<String, Cell>,
    key: &str,
    label: &str,
    entity_type: &str,
    from: &str,
    to: &str,
) {
    cells.insert(
        key.to_owned(),
        Cell::Link(RelationLink {
            label: label.to_owned(),
            entity_type: Ustr::from(entity_type),
            from: from.to_owned(),
            to: to.to_owned(),
        }),
    );
}

fn nested_name(cells: &BTreeMap<String, Cell>, key: &str) -> Option<String> {
    match cells.get(key) {
        Some(Cell::Value(Value::Object(properties))) => properties
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_owned),
        _ => None,
    }
}

fn value_str<'a>(cells: &'a BTreeMap<String, Cell>, key: &str) -> Option<&'a str> {
    match cells.get(key) {
        Some(Cell::Value(Value::String(text))) => Some(text),
        _ => None,
    }
}

fn top_level_filter(ctx: &ConstraintContext<'_>) -> Value {
    Value::String(if ctx.state.parent_filtering { "empty" } else { "union" }.to_owned())
}

fn network_constraints(ctx: &ConstraintContext<'_>) -> Map<String, Value> {
    let mut constraints = Map::new();
    constraints.insert("networks_filter".to_owned(), top_level_filter(ctx));
    constraints.insert("type".to_owned(), json!("network"));
    constraints
}

fn service_constraints(ctx: &ConstraintContext<'_>) -> Map<String, Value> {
    let mut constraints = Map::new();
    constraints.insert("soft_deleted".to_owned(), json!("bool-false"));
    constraints.insert("workflows_filter".to_owned(), top_level_filter(ctx));
    constraints
}

fn file_constraints(ctx: &ConstraintContext<'_>) -> Map<String, Value> {
    let mut constraints = Map::new();
    if let (true, Some(path)) = (ctx.state.parent_filtering, ctx.folder_path) {
        constraints.insert("folder_path".to_owned(), json!(path));
        constraints.insert("folder_path_filter".to_owned(), json!("equality"));
    }
    constraints
}

fn decorate_device(
    _: &RowIdentity,
    cells: &mut BTreeMap<String, Cell>,
    _: &DecorateContext<'_>,
) {
    relation_cell(cells, "services", "Services", "service", "target_devices", "target_services");
    relation_cell(cells, "tasks", "Tasks", "task", "devices", "tasks");
    relation_cell(cells, "pools", "Pools", "pool", "devices", "pools");
}

fn decorate_network(
    _: &RowIdentity,
    cells: &mut BTreeMap<String, Cell>,
    _: &DecorateContext<'_>,
) {
    relation_cell(cells, "links", "Links", "link", "networks", "links");
    relation_cell(cells, "devices", "Devices", "device", "networks", "devices");
}

/// Turns `success` / `failure` strings into badges.
fn decorate_configuration(
    _: &RowIdentity,
    cells: &mut BTreeMap<String, Cell>,
    _: &DecorateContext<'_>,
) {
    for cell in cells.values_mut() {
        let Cell::Value(Value::String(text)) = cell else {
            continue;
        };
        let badge = match text.to_lowercase().as_str() {
            "success" => Some(("Success", Tone::Success)),
            "failure" => Some(("Failure", Tone::Danger)),
            _ => None,
        };
        if let Some((label, tone)) = badge {
            *cell = Cell::Badge {
                label: label.to_owned(),
                tone,
            };
        }
    }
}

fn decorate_link(_: &RowIdentity, cells: &mut BTreeMap<String, Cell>, _: &DecorateContext<'_>) {
    relation_cell(cells, "pools", "Pools", "pool", "links", "pools");
}

fn decorate_pool(_: &RowIdentity, cells: &mut BTreeMap<String, Cell>, _: &DecorateContext<'_>) {
    let count = |key: &str| {
        cells
            .get(key)
            .map(Cell::display)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| "0".to_owned())
    };
    let summary = format!(
        "{} devices - {} links",
        count("device_number"),
        count("link_number")
    );
    cells.insert("objectNumber".to_owned(), Cell::Text(summary));
    relation_cell(cells, "devices", "Devices", "device", "pools", "devices");
    relation_cell(cells, "links", "Links", "link", "pools", "links");
}

fn decorate_service(
    _: &RowIdentity,
    cells: &mut BTreeMap<String, Cell>,
    _: &DecorateContext<'_>,
) {
    relation_cell(cells, "devices", "Devices", "device", "target_services", "target_devices");
    relation_cell(cells, "pools", "Pools", "pool", "target_services", "target_pools");
    relation_cell(cells, "runs", "Runs", "run", "services", "runs");
}

fn decorate_run(_: &RowIdentity, cells: &mut BTreeMap<String, Cell>, _: &DecorateContext<'_>) {
    relation_cell(cells, "devices", "Devices", "device", "runs", "target_devices");
    relation_cell(cells, "pools", "Pools", "pool", "runs", "target_pools");
    relation_cell(cells, "services", "Services", "service", "runs", "services");
    for (source, target) in [
        ("server_properties", "server_name"),
        ("worker_properties", "worker_name"),
    ] {
        if let Some(name) = nested_name(cells, source) {
            cells.insert(target.to_owned(), Cell::Text(name));
        }
    }
}

fn decorate_result(
    _: &RowIdentity,
    cells: &mut BTreeMap<String, Cell>,
    _: &DecorateContext<'_>,
) {
    cells.remove("result");
    let success = matches!(cells.get("success"), Some(Cell::Value(Value::Bool(true))));
    cells.insert("status".to_owned(), Cell::Value(Value::Bool(success)));
    cells.insert(
        "success".to_owned(),
        if success {
            Cell::Badge {
                label: "Success".to_owned(),
                tone: Tone::Success,
            }
        } else {
            Cell::Badge {
                label: "Failure".to_owned(),
                tone: Tone::Danger,
            }
        },
    );
}

fn decorate_task(_: &RowIdentity, cells: &mut BTreeMap<String, Cell>, _: &DecorateContext<'_>) {
    let periodicity = if value_str(cells, "scheduling_mode") == Some("standard") {
        let frequency = cells.get("frequency").map(Cell::display).unwrap_or_default();
        let unit = cells
            .get("frequency_unit")
            .map(Cell::display)
            .unwrap_or_default();
        format!("{frequency} {unit}")
    } else {
        cells
            .get("crontab_expression")
            .map(Cell::display)
            .unwrap_or_default()
    };
    cells.insert("periodicity".to_owned(), Cell::Text(periodicity));
    relation_cell(cells, "devices", "Devices", "device", "tasks", "devices");
    relation_cell(cells, "pools", "Pools", "pool", "tasks", "pools");
    relation_cell(cells, "runs", "Runs", "run", "task", "runs");
    if let Some(name) = nested_name(cells, "service_properties") {
        cells.insert("service_name".to_owned(), Cell::Text(name));
    }
}

fn decorate_user(_: &RowIdentity, cells: &mut BTreeMap<String, Cell>, _: &DecorateContext<'_>) {
    relation_cell(cells, "groups", "Groups", "group", "users", "groups");
}

fn decorate_server(
    _: &RowIdentity,
    cells: &mut BTreeMap<String, Cell>,
    _: &DecorateContext<'_>,
) {
    relation_cell(cells, "runs", "Runs", "run", "server", "runs");
    relation_cell(cells, "sessions", "Sessions", "session", "server", "sessions");
    relation_cell(cells, "workers", "Workers", "worker", "server", "workers");
}

fn decorate_file(
    identity: &RowIdentity,
    cells: &mut BTreeMap<String, Cell>,
    _: &DecorateContext<'_>,
) {
    let filename = cells.get("filename").map(Cell::display).unwrap_or_default();
    let label = if identity.entity_type.as_str() == "folder" {
        format!("{filename}/")
    } else {
        filename
    };
    cells.insert("filename".to_owned(), Cell::Text(label));
}

fn decorate_worker(
    _: &RowIdentity,
    cells: &mut BTreeMap<String, Cell>,
    _: &DecorateContext<'_>,
) {
    relation_cell(cells, "runs", "Runs", "run", "worker", "runs");
    if let Some(name) = nested_name(cells, "server_properties") {
        cells.insert("server_name".to_owned(), Cell::Text(name));
    }
}

fn device() -> EntityConfig {
    EntityConfig::new(
        "device",
        vec![
            ColumnSpec::text("name", "Name"),
            ColumnSpec::text("description", "Description").hidden(),
            ColumnSpec::text("subtype", "Subtype"),
            ColumnSpec::text("model", "Model"),
            ColumnSpec::text("location", "Location"),
            ColumnSpec::text("vendor", "Vendor"),
            ColumnSpec::text("operating_system", "Operating System").hidden(),
            ColumnSpec::text("os_version", "OS Version").hidden(),
            ColumnSpec::text("ip_address", "IP Address"),
            ColumnSpec::text("last_runtime", "Last Runtime").hidden(),
            ColumnSpec::plain("services", "Services").unsortable().not_exported(),
            ColumnSpec::plain("tasks", "Tasks").unsortable().not_exported(),
            ColumnSpec::plain("pools", "Pools").unsortable().not_exported(),
            ColumnSpec::buttons(),
        ],
    )
    .with_decorator(decorate_device)
    .with_derived(&["last_runtime"])
    .with_actions(&[
        ActionKind::Changelog,
        ActionKind::NetworkData,
        ActionKind::Results,
        ActionKind::Connect,
        ActionKind::Edit,
        ActionKind::Duplicate,
        ActionKind::Run,
        ActionKind::Delete,
    ])
    .serialized_search()
}

fn network() -> EntityConfig {
    EntityConfig::new(
        "network",
        vec![
            ColumnSpec::text("name", "Name"),
            ColumnSpec::text("description", "Description"),
            ColumnSpec::text("path", "Path").hidden(),
            ColumnSpec::plain("links", "Links").unsortable().not_exported(),
            ColumnSpec::plain("devices", "Devices").unsortable().not_exported(),
            ColumnSpec::buttons(),
        ],
    )
    .with_constraints(network_constraints)
    .with_decorator(decorate_network)
    .with_actions(&INVENTORY_ACTIONS)
    .with_controls(&[
        ControlKind::ColumnDisplay,
        ControlKind::Changelog,
        ControlKind::Refresh,
        ControlKind::BulkFilter,
        ControlKind::CopyLink,
        ControlKind::ClearSearch,
        ControlKind::CopySelection,
        ControlKind::CreateNew,
        ControlKind::BulkEdit,
        ControlKind::BulkDeletion,
        ControlKind::PaginationCount,
    ])
    .parent_filtering()
}

fn configuration() -> EntityConfig {
    EntityConfig::new(
        "configuration",
        vec![
            ColumnSpec::text("name", "Name"),
            ColumnSpec::text("ip_address", "IP Address"),
            ColumnSpec::text("last_status", "Last Status"),
            ColumnSpec::text("last_failure", "Last Failure").hidden(),
            ColumnSpec::text("last_runtime", "Last Runtime"),
            ColumnSpec::text("last_update", "Last Update").hidden(),
            ColumnSpec::text("configuration", "Configuration").hidden(),
            ColumnSpec::buttons(),
        ],
    )
    .with_model("device")
    .with_rbac("configuration")
    .with_decorator(decorate_configuration)
    .with_derived(&["last_runtime"])
    .with_actions(&[
        ActionKind::Changelog,
        ActionKind::NetworkData,
        ActionKind::Results,
        ActionKind::Edit,
    ])
    .with_controls(&[
        ControlKind::ColumnDisplay,
        ControlKind::Refresh,
        ControlKind::BulkFilter,
        ControlKind::CopyLink,
        ControlKind::ClearSearch,
        ControlKind::CopySelection,
        ControlKind::Export,
        ControlKind::PaginationCount,
    ])
    .serialized_search()
}

fn link() -> EntityConfig {
    EntityConfig::new(
        "link",
        vec![
            ColumnSpec::text("name", "Name"),
            ColumnSpec::text("description", "Description"),
            ColumnSpec::text("subtype", "Subtype"),
            ColumnSpec::text("source_name", "Source"),
            ColumnSpec::text("destination_name", "Destination"),
            ColumnSpec::plain("pools", "Pools").unsortable().not_exported(),
            ColumnSpec::buttons(),
        ],
    )
    .with_decorator(decorate_link)
    .with_actions(&INVENTORY_ACTIONS)
}

fn pool() -> EntityConfig {
    EntityConfig::new(
        "pool",
        vec![
            ColumnSpec::text("name", "Name"),
            ColumnSpec::text("description", "Description"),
            ColumnSpec::boolean("manually_defined", "Manually Defined").labels("Manual", "Automatic"),
            ColumnSpec::plain("objectNumber", "Objects").unsortable(),
            ColumnSpec::plain("devices", "Devices").unsortable().not_exported(),
            ColumnSpec::plain("links", "Links").unsortable().not_exported(),
            ColumnSpec::buttons(),
        ],
    )
    .with_decorator(decorate_pool)
    .with_actions(&INVENTORY_ACTIONS)
    .add_relation_disabled()
}

fn service() -> EntityConfig {
    EntityConfig::new(
        "service",
        vec![
            ColumnSpec::text("name", "Name"),
            ColumnSpec::text("type", "Type"),
            ColumnSpec::text("description", "Description").hidden(),
            ColumnSpec::text("creator", "Creator").hidden(),
            ColumnSpec::text("last_modified", "Last Modified"),
            ColumnSpec::boolean("shared", "Shared").labels("Shared", "Not Shared"),
            ColumnSpec::plain("devices", "Devices").unsortable().not_exported(),
            ColumnSpec::plain("pools", "Pools").unsortable().not_exported(),
            ColumnSpec::plain("runs", "Runs").unsortable().not_exported(),
            ColumnSpec::buttons(),
        ],
    )
    .with_constraints(service_constraints)
    .with_decorator(decorate_service)
    .with_actions(&[
        ActionKind::Changelog,
        ActionKind::Edit,
        ActionKind::Duplicate,
        ActionKind::Run,
        ActionKind::Export,
        ActionKind::Delete,
    ])
    .user_filtering()
    .parent_filtering()
}

fn run() -> EntityConfig {
    EntityConfig::new(
        "run",
        vec![
            ColumnSpec::text("runtime", "Runtime"),
            ColumnSpec::text("name", "Name"),
            ColumnSpec::text("creator", "User"),
            ColumnSpec::text("trigger", "Trigger"),
            ColumnSpec::text("status", "Status"),
            ColumnSpec::text("server_name", "Server").hidden(),
            ColumnSpec::text("worker_name", "Worker").hidden(),
            ColumnSpec::plain("devices", "Devices").unsortable().not_exported(),
            ColumnSpec::plain("pools", "Pools").unsortable().not_exported(),
            ColumnSpec::plain("services", "Services").unsortable().not_exported(),
            ColumnSpec::buttons(),
        ],
    )
    .ordered_by(0, SortDirection::Desc)
    .with_decorator(decorate_run)
    .with_actions(&[ActionKind::Results, ActionKind::Logs])
    .with_controls(&[
        ControlKind::ColumnDisplay,
        ControlKind::Refresh,
        ControlKind::BulkFilter,
        ControlKind::CopyLink,
        ControlKind::ClearSearch,
        ControlKind::Export,
        ControlKind::PaginationCount,
    ])
    .user_filtering()
}

fn result_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::text("runtime", "Runtime"),
        ColumnSpec::text("duration", "Duration"),
        ColumnSpec::text("service_name", "Service"),
        ColumnSpec::text("device_name", "Device"),
        ColumnSpec::boolean("success", "Success").labels("Success", "Failure"),
        ColumnSpec::buttons(),
    ]
}

fn result() -> EntityConfig {
    EntityConfig::new("result", result_columns())
        .ordered_by(0, SortDirection::Desc)
        .with_decorator(decorate_result)
        .with_derived(&["service_name", "device_name"])
        .with_actions(&[ActionKind::Results, ActionKind::CopyName])
        .with_controls(&RESULT_CONTROLS)
}

fn full_result() -> EntityConfig {
    EntityConfig {
        entity_type: Ustr::from("full_result"),
        ..result()
    }
    .with_model("result")
    .with_filtering_data("full_result", Value::Bool(true))
}

fn device_result() -> EntityConfig {
    EntityConfig {
        entity_type: Ustr::from("device_result"),
        ..result()
    }
    .with_model("result")
}

fn task() -> EntityConfig {
    EntityConfig::new(
        "task",
        vec![
            ColumnSpec::text("name", "Name"),
            ColumnSpec::text("description", "Description").hidden(),
            ColumnSpec::text("service_name", "Service"),
            ColumnSpec::text("scheduling_mode", "Scheduling Mode"),
            ColumnSpec::plain("periodicity", "Periodicity").unsortable(),
            ColumnSpec::text("next_run_time", "Next Run Time"),
            ColumnSpec::text("time_before_next_run", "Time Left").hidden(),
            ColumnSpec::boolean("is_active", "Status").labels("Active", "Inactive"),
            ColumnSpec::plain("devices", "Devices").unsortable().not_exported(),
            ColumnSpec::plain("pools", "Pools").unsortable().not_exported(),
            ColumnSpec::plain("runs", "Runs").unsortable().not_exported(),
            ColumnSpec::buttons(),
        ],
    )
    .with_decorator(decorate_task)
    .with_actions(&INVENTORY_ACTIONS)
    .user_filtering()
}

fn user() -> EntityConfig {
    EntityConfig::new(
        "user",
        vec![
            ColumnSpec::text("name", "Username"),
            ColumnSpec::text("email", "Email"),
            ColumnSpec::boolean("is_admin", "Admin"),
            ColumnSpec::plain("groups", "Groups").unsortable().not_exported(),
            ColumnSpec::buttons(),
        ],
    )
    .with_decorator(decorate_user)
    .with_actions(&INVENTORY_ACTIONS)
}

fn credential() -> EntityConfig {
    EntityConfig::new(
        "credential",
        vec![
            ColumnSpec::text("name", "Name"),
            ColumnSpec::text("description", "Description"),
            ColumnSpec::text("role", "Role"),
            ColumnSpec::text("subtype", "Subtype"),
            ColumnSpec::text("device_pools", "Device Pools").unsortable(),
            ColumnSpec::text("priority", "Priority"),
            ColumnSpec::buttons(),
        ],
    )
    .with_actions(&INVENTORY_ACTIONS)
}

fn server() -> EntityConfig {
    EntityConfig::new(
        "server",
        vec![
            ColumnSpec::text("name", "Name"),
            ColumnSpec::text("description", "Description"),
            ColumnSpec::text("ip_address", "IP Address"),
            ColumnSpec::text("weight", "Weight"),
            ColumnSpec::text("status", "Status"),
            ColumnSpec::plain("runs", "Runs").unsortable().not_exported(),
            ColumnSpec::plain("sessions", "Sessions").unsortable().not_exported(),
            ColumnSpec::plain("workers", "Workers").unsortable().not_exported(),
            ColumnSpec::buttons(),
        ],
    )
    .with_decorator(decorate_server)
    .with_actions(&[ActionKind::Changelog, ActionKind::Edit, ActionKind::Delete])
}

fn changelog() -> EntityConfig {
    EntityConfig::new(
        "changelog",
        vec![
            ColumnSpec::text("time", "Time"),
            ColumnSpec::text("author", "Author"),
            ColumnSpec::text("severity", "Severity"),
            ColumnSpec::text("content", "Content"),
            ColumnSpec::text("target_type", "Target Type").hidden(),
            ColumnSpec::buttons(),
        ],
    )
    .ordered_by(0, SortDirection::Desc)
    .with_actions(&[ActionKind::Compare, ActionKind::Edit])
    .with_controls(&[
        ControlKind::ColumnDisplay,
        ControlKind::Refresh,
        ControlKind::BulkFilter,
        ControlKind::CopyLink,
        ControlKind::ClearSearch,
        ControlKind::CreateNew,
        ControlKind::Export,
    ])
    .add_relation_disabled()
}

fn session() -> EntityConfig {
    EntityConfig::new(
        "session",
        vec![
            ColumnSpec::text("timestamp", "Timestamp"),
            ColumnSpec::text("name", "Name"),
            ColumnSpec::text("device_name", "Device"),
            ColumnSpec::text("user", "User"),
            ColumnSpec::buttons(),
        ],
    )
    .ordered_by(0, SortDirection::Desc)
    .with_actions(&[ActionKind::Logs, ActionKind::Edit])
    .with_controls(&[
        ControlKind::ColumnDisplay,
        ControlKind::Refresh,
        ControlKind::BulkFilter,
    ])
}

fn file() -> EntityConfig {
    EntityConfig::new(
        "file",
        vec![
            ColumnSpec::text("filename", "Filename"),
            ColumnSpec::text("path", "Path").hidden(),
            ColumnSpec::text("last_modified", "Last Modified"),
            ColumnSpec::text("last_updated", "Last Updated").hidden(),
            ColumnSpec::text("status", "Status"),
            ColumnSpec::buttons(),
        ],
    )
    .with_constraints(file_constraints)
    .with_decorator(decorate_file)
    .with_actions(&[
        ActionKind::Download,
        ActionKind::CopyName,
        ActionKind::Edit,
        ActionKind::Delete,
    ])
    .parent_filtering()
}

fn worker() -> EntityConfig {
    EntityConfig::new(
        "worker",
        vec![
            ColumnSpec::text("name", "Name"),
            ColumnSpec::text("subtype", "Type"),
            ColumnSpec::text("server_name", "Server"),
            ColumnSpec::text("last_update", "Last Update"),
            ColumnSpec::plain("runs", "Runs").unsortable().not_exported(),
            ColumnSpec::buttons(),
        ],
    )
    .with_decorator(decorate_worker)
    .with_actions(&[ActionKind::Changelog, ActionKind::Delete])
    .with_controls(&[
        ControlKind::ColumnDisplay,
        ControlKind::Refresh,
        ControlKind::ClearSearch,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{TableState, UserScope, decorate_row};

    const ALL_TYPES: [&str; 18] = [
        "device",
        "network",
        "configuration",
        "link",
        "pool",
        "service",
        "run",
        "result",
        "full_result",
        "device_result",
        "task",
        "user",
        "credential",
        "server",
        "changelog",
        "session",
        "file",
        "worker",
    ];

    fn ctx_for<'a>(state: &'a TableState, folder: Option<&'a str>) -> ConstraintContext<'a> {
        ConstraintContext {
            state,
            relation: None,
            current_user: Some("admin"),
            folder_path: folder,
        }
    }

    fn row(value: Value) -> crate::filtering::Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("row must be an object"),
        }
    }

    #[test]
    fn builtin_catalog_has_every_entity_with_valid_columns() {
        let catalog = EntityCatalog::builtin();
        assert_eq!(catalog.entity_types().len(), ALL_TYPES.len());

        for entity_type in ALL_TYPES {
            let config = catalog.get(entity_type).expect(entity_type);
            assert_eq!(config.entity_type.as_str(), entity_type);
            assert!(ColumnSet::new(config.entity_type, config.columns.clone()).is_ok());
            assert!(config.ordering.0 < config.columns.len());
        }
    }

    #[test]
    fn models_and_rbac() {
        let catalog = EntityCatalog::builtin();
        let configuration = catalog.get("configuration").unwrap();
        assert_eq!(configuration.model(), Ustr::from("device"));
        assert_eq!(configuration.rbac, "configuration");

        let full = catalog.get("full_result").unwrap();
        assert_eq!(full.model(), Ustr::from("result"));
        assert_eq!(full.filtering_data.get("full_result"), Some(&json!(true)));

        let device_result = catalog.get("device_result").unwrap();
        assert_eq!(device_result.model(), Ustr::from("result"));
        assert!(device_result.filtering_data.is_empty());
    }

    #[test]
    fn descending_defaults() {
        let catalog = EntityCatalog::builtin();
        for entity_type in ["run", "result", "changelog"] {
            assert_eq!(
                catalog.get(entity_type).unwrap().ordering,
                (0, SortDirection::Desc)
            );
        }
        assert_eq!(
            catalog.get("device").unwrap().ordering,
            (0, SortDirection::Asc)
        );
    }

    #[test]
    fn network_constraints_follow_parent_filtering() {
        let config = EntityCatalog::builtin().get("network").unwrap();
        let mut state = TableState::new(Ustr::from("network"), None, 10);

        let merged = config.merged_constraints(&ctx_for(&state, None));
        assert_eq!(
            Value::Object(merged),
            json!({"networks_filter": "empty", "type": "network"})
        );

        state.parent_filtering = false;
        let merged = config.merged_constraints(&ctx_for(&state, None));
        assert_eq!(merged.get("networks_filter"), Some(&json!("union")));
    }

    #[test]
    fn service_constraints_include_user_scope() {
        let config = EntityCatalog::builtin().get("service").unwrap();
        let mut state = TableState::new(Ustr::from("service"), None, 10);
        state.user_scope = UserScope::Mine;

        let merged = config.merged_constraints(&ctx_for(&state, None));
        assert_eq!(
            Value::Object(merged),
            json!({
                "soft_deleted": "bool-false",
                "workflows_filter": "empty",
                "creator": "admin",
                "creator_filter": "equality"
            })
        );
    }

    #[test]
    fn run_and_task_only_scope_by_user() {
        let catalog = EntityCatalog::builtin();
        for entity_type in ["run", "task"] {
            let config = catalog.get(entity_type).unwrap();
            let mut state = TableState::new(config.entity_type, None, 10);
            assert!(config.merged_constraints(&ctx_for(&state, None)).is_empty());

            state.user_scope = UserScope::Mine;
            let merged = config.merged_constraints(&ctx_for(&state, None));
            assert_eq!(merged.get("creator"), Some(&json!("admin")));
        }
    }

    #[test]
    fn file_constraints_need_a_folder() {
        let config = EntityCatalog::builtin().get("file").unwrap();
        let state = TableState::new(Ustr::from("file"), None, 10);

        assert!(config.merged_constraints(&ctx_for(&state, None)).is_empty());
        let merged = config.merged_constraints(&ctx_for(&state, Some("/configs")));
        assert_eq!(
            Value::Object(merged),
            json!({"folder_path": "/configs", "folder_path_filter": "equality"})
        );
    }

    #[test]
    fn device_decoration_keeps_identity_and_adds_relation_links() {
        let config = EntityCatalog::builtin().get("device").unwrap();
        let ctx = DecorateContext {
            table_id: Ustr::from("device"),
            entity_type: Ustr::from("device"),
            relation: None,
        };

        let decorated = decorate_row(
            row(json!({"id": 1, "name": "r1", "last_runtime": "2024-01-01"})),
            &config,
            &ctx,
        )
        .unwrap();

        assert_eq!(decorated.identity.id, 1);
        assert_eq!(decorated.identity.name, "r1");
        assert_eq!(decorated.identity.entity_type, Ustr::from("device"));
        assert_eq!(
            decorated.identity.extras.get("last_runtime"),
            Some(&json!("2024-01-01"))
        );
        match decorated.cell("services") {
            Some(Cell::Link(link)) => {
                assert_eq!(link.entity_type, Ustr::from("service"));
                assert_eq!(link.from, "target_devices");
                assert_eq!(link.to, "target_services");
            }
            other => panic!("expected relation link, got {other:?}"),
        }
        assert!(decorated.actions.iter().all(|a| a.target.id == 1));
    }

    #[test]
    fn result_decoration_turns_success_into_badge() {
        let config = EntityCatalog::builtin().get("result").unwrap();
        let ctx = DecorateContext {
            table_id: Ustr::from("result"),
            entity_type: Ustr::from("result"),
            relation: None,
        };

        let decorated = decorate_row(
            row(json!({"id": 9, "name": "res", "success": false, "result": {"big": true},
                "service_name": "backup", "device_name": "r1"})),
            &config,
            &ctx,
        )
        .unwrap();

        assert!(decorated.cell("result").is_none());
        assert_eq!(decorated.cell("status"), Some(&Cell::Value(json!(false))));
        assert_eq!(decorated.cell("success").unwrap().display(), "[Failure]");
        assert_eq!(decorated.identity.extras.len(), 2);
    }

    #[test]
    fn pool_and_task_summaries() {
        let catalog = EntityCatalog::builtin();
        let ctx = DecorateContext {
            table_id: Ustr::from("pool"),
            entity_type: Ustr::from("pool"),
            relation: None,
        };
        let pool = decorate_row(
            row(json!({"id": 2, "name": "core", "device_number": 4, "link_number": 1})),
            &catalog.get("pool").unwrap(),
            &ctx,
        )
        .unwrap();
        assert_eq!(
            pool.cell("objectNumber").unwrap().display(),
            "4 devices - 1 links"
        );

        let task = decorate_row(
            row(json!({"id": 3, "name": "nightly", "scheduling_mode": "standard",
                "frequency": 10, "frequency_unit": "minutes",
                "service_properties": {"name": "backup"}})),
            &catalog.get("task").unwrap(),
            &ctx,
        )
        .unwrap();
        assert_eq!(task.cell("periodicity").unwrap().display(), "10 minutes");
        assert_eq!(task.cell("service_name").unwrap().display(), "backup");
    }

    #[test]
    fn configuration_badges() {
        let config = EntityCatalog::builtin().get("configuration").unwrap();
        let ctx = DecorateContext {
            table_id: Ustr::from("configuration"),
            entity_type: Ustr::from("configuration"),
            relation: None,
        };
        let decorated = decorate_row(
            row(json!({"id": 1, "name": "r1", "last_status": "FAILURE"})),
            &config,
            &ctx,
        )
        .unwrap();
        assert_eq!(
            decorated.cell("last_status"),
            Some(&Cell::Badge {
                label: "Failure".to_owned(),
                tone: Tone::Danger
            })
        );
        assert_eq!(decorated.cell("name").unwrap().display(), "r1");
    }

    #[test]
    fn table_properties_replace_known_columns() {
        let mut catalog = EntityCatalog::builtin();
        let replaced = catalog
            .apply_table_properties(
                r#"{
                    "device": [{"data": "name", "title": "Name", "search": "text"},
                               {"data": "buttons", "orderable": false, "export": false}],
                    "unknown_thing": [{"data": "x"}]
                }"#,
            )
            .unwrap();

        assert_eq!(replaced, 1);
        let device = catalog.get("device").unwrap();
        assert_eq!(device.columns.len(), 2);
        assert!(!device.columns[1].exportable);
        assert!(device.decorator.is_some());
    }

    #[test]
    fn table_properties_reject_duplicates_and_garbage() {
        let mut catalog = EntityCatalog::builtin();
        assert!(matches!(
            catalog.apply_table_properties("[]"),
            Err(TableError::TableProperties(_))
        ));
        assert!(matches!(
            catalog.apply_table_properties(r#"{"device": [{"data": "a"}, {"data": "a"}]}"#),
            Err(TableError::DuplicateColumn { .. })
        ));
    }
}
