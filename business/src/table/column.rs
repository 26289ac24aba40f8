//! Column definitions and the persisted visible-column set.

use std::collections::HashSet;

use log::debug;
use serde::Deserialize;
use ustr::Ustr;

use netdeck_states::{ClientStorage, StorageError};

use crate::{filtering::RequestedColumn, table::TableError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    #[default]
    None,
    Text,
    #[serde(alias = "bool")]
    Boolean,
}

impl SearchKind {
    pub fn is_searchable(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Display text for the two states of a boolean search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoolLabels {
    #[serde(rename = "true")]
    pub on: String,
    #[serde(rename = "false")]
    pub off: String,
}

/// One column of a table, as declared by the entity or a table-properties document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnSpec {
    #[serde(rename = "data")]
    pub key: String,
    #[serde(rename = "title", default)]
    pub display_name: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub search: SearchKind,
    #[serde(rename = "orderable", default = "default_true")]
    pub sortable: bool,
    #[serde(rename = "export", default = "default_true")]
    pub exportable: bool,
    #[serde(default)]
    pub search_labels: Option<BoolLabels>,
}

fn default_true() -> bool {
    true
}

impl ColumnSpec {
    pub fn new(key: &str, display_name: &str, search: SearchKind) -> Self {
        Self {
            key: key.to_owned(),
            display_name: display_name.to_owned(),
            visible: true,
            search,
            sortable: true,
            exportable: true,
            search_labels: None,
        }
    }

    pub fn text(key: &str, display_name: &str) -> Self {
        Self::new(key, display_name, SearchKind::Text)
    }

    pub fn boolean(key: &str, display_name: &str) -> Self {
        Self::new(key, display_name, SearchKind::Boolean)
    }

    pub fn plain(key: &str, display_name: &str) -> Self {
        Self::new(key, display_name, SearchKind::None)
    }

    /// The per-row action column.
    pub fn buttons() -> Self {
        Self::plain("buttons", "").unsortable().not_exported()
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn not_exported(mut self) -> Self {
        self.exportable = false;
        self
    }

    pub fn labels(mut self, on: &str, off: &str) -> Self {
        self.search_labels = Some(BoolLabels {
            on: on.to_owned(),
            off: off.to_owned(),
        });
        self
    }

    /// Header text; falls back to the key.
    pub fn title(&self) -> &str {
        if self.display_name.is_empty() {
            &self.key
        } else {
            &self.display_name
        }
    }
}

/// The columns of one table with their live visibility.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSet {
    entity_type: Ustr,
    columns: Vec<ColumnSpec>,
}

impl ColumnSet {
    pub fn new(entity_type: Ustr, columns: Vec<ColumnSpec>) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.key.as_str()) {
                return Err(TableError::DuplicateColumn {
                    entity: entity_type,
                    column: column.key.clone(),
                });
            }
        }

        Ok(Self {
            entity_type,
            columns,
        })
    }

    pub fn storage_key(entity_type: &str) -> String {
        format!("{entity_type}_table")
    }

    /// Applies the visible set persisted for this entity type, if any.
    /// Keys that no longer name a column are ignored.
    pub fn load_visibility(&mut self, storage: &dyn ClientStorage) {
        let Some(stored) = storage.get(&Self::storage_key(&self.entity_type)) else {
            return;
        };

        let keys: HashSet<&str> = stored
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .collect();
        let unknown = keys.iter().filter(|key| self.get(key).is_none()).count();
        if unknown > 0 {
            debug!(
                "Ignoring {unknown} stored column key(s) unknown to {}",
                self.entity_type
            );
        }

        for column in &mut self.columns {
            column.visible = keys.contains(column.key.as_str());
        }
    }

    pub fn persist_visibility(&self, storage: &dyn ClientStorage) -> Result<(), StorageError> {
        let visible = self
            .visible()
            .map(|column| column.key.as_str())
            .collect::<Vec<_>>()
            .join(",");
        storage.set(&Self::storage_key(&self.entity_type), &visible)
    }

    /// Makes exactly `keys` visible. Unknown keys are skipped and returned.
    pub fn set_visible<S: AsRef<str>>(&mut self, keys: &[S]) -> Vec<String> {
        let wanted: HashSet<&str> = keys.iter().map(AsRef::as_ref).collect();
        let unknown = keys
            .iter()
            .map(AsRef::as_ref)
            .filter(|key| self.get(key).is_none())
            .map(str::to_owned)
            .collect();

        for column in &mut self.columns {
            column.visible = wanted.contains(column.key.as_str());
        }
        unknown
    }

    pub fn all(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn visible(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|column| column.visible)
    }

    pub fn get(&self, key: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|column| column.key == key)
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.key == key)
    }

    /// Position of the declared column `index` among the visible ones.
    pub fn visible_position(&self, index: usize) -> Option<usize> {
        let column = self.columns.get(index)?;
        if !column.visible {
            return None;
        }
        Some(self.columns[..index].iter().filter(|c| c.visible).count())
    }

    /// The column list sent with every query: visible columns only, in order.
    pub fn requested_columns(&self) -> Vec<RequestedColumn> {
        self.visible()
            .map(|column| RequestedColumn {
                data: column.key.clone(),
                name: column.key.clone(),
                orderable: column.sortable,
                searchable: column.search.is_searchable(),
            })
            .collect()
    }

    /// Visible columns that belong in a CSV export.
    pub fn export_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.visible().filter(|column| column.exportable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netdeck_states::MemoryStorage;

    fn device_columns() -> ColumnSet {
        ColumnSet::new(
            Ustr::from("device"),
            vec![
                ColumnSpec::text("name", "Name"),
                ColumnSpec::text("ip_address", "IP Address"),
                ColumnSpec::text("vendor", "Vendor").hidden(),
                ColumnSpec::buttons(),
            ],
        )
        .unwrap()
    }

    fn visible_keys(columns: &ColumnSet) -> Vec<&str> {
        columns.visible().map(|c| c.key.as_str()).collect()
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = ColumnSet::new(
            Ustr::from("device"),
            vec![ColumnSpec::text("name", "Name"), ColumnSpec::text("name", "Again")],
        )
        .unwrap_err();
        assert!(matches!(err, TableError::DuplicateColumn { .. }));
    }

    #[test]
    fn stored_visibility_ignores_unknown_keys() {
        let storage = MemoryStorage::new();
        storage
            .set("device_table", "vendor,name,gone_column")
            .unwrap();

        let mut columns = device_columns();
        columns.load_visibility(&storage);

        assert_eq!(visible_keys(&columns), vec!["name", "vendor"]);
    }

    #[test]
    fn missing_storage_keeps_declared_defaults() {
        let mut columns = device_columns();
        columns.load_visibility(&MemoryStorage::new());
        assert_eq!(visible_keys(&columns), vec!["name", "ip_address", "buttons"]);
    }

    #[test]
    fn set_visible_then_persist_round_trips_through_storage() {
        let storage = MemoryStorage::new();
        let mut columns = device_columns();

        let unknown = columns.set_visible(&["vendor", "ip_address", "nope"]);
        assert_eq!(unknown, vec!["nope".to_owned()]);
        columns.persist_visibility(&storage).unwrap();
        assert_eq!(
            storage.get("device_table").as_deref(),
            Some("ip_address,vendor")
        );

        let mut reloaded = device_columns();
        reloaded.load_visibility(&storage);
        assert_eq!(visible_keys(&reloaded), vec!["ip_address", "vendor"]);
    }

    #[test]
    fn requested_columns_are_the_visible_ones() {
        let mut columns = device_columns();
        columns.set_visible(&["name", "buttons"]);

        let requested = columns.requested_columns();
        assert_eq!(requested.len(), 2);
        assert_eq!(requested[0].data, "name");
        assert!(requested[0].searchable);
        assert_eq!(requested[1].data, "buttons");
        assert!(!requested[1].orderable);
        assert!(!requested[1].searchable);
    }

    #[test]
    fn visible_position_skips_hidden_columns() {
        let mut columns = device_columns();
        columns.set_visible(&["name", "vendor"]);

        assert_eq!(columns.visible_position(0), Some(0));
        assert_eq!(columns.visible_position(1), None);
        assert_eq!(columns.visible_position(2), Some(1));
        assert_eq!(columns.visible_position(9), None);
    }

    #[test]
    fn export_columns_skip_buttons() {
        let columns = device_columns();
        let keys: Vec<_> = columns.export_columns().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["name", "ip_address"]);
    }

    #[test]
    fn column_spec_deserializes_table_properties_shape() {
        let column: ColumnSpec = serde_json::from_value(serde_json::json!({
            "data": "is_active",
            "title": "Active",
            "search": "bool",
            "visible": false,
            "search_labels": {"true": "Active", "false": "Inactive"}
        }))
        .unwrap();

        assert_eq!(column.key, "is_active");
        assert_eq!(column.search, SearchKind::Boolean);
        assert!(!column.visible);
        assert!(column.sortable);
        assert!(column.exportable);
        assert_eq!(column.search_labels.unwrap().off, "Inactive");

        let bare: ColumnSpec =
            serde_json::from_value(serde_json::json!({"data": "notes"})).unwrap();
        assert_eq!(bare.title(), "notes");
        assert_eq!(bare.search, SearchKind::None);
    }
}
