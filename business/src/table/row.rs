//! Server rows turned into displayable rows with a stable identity.

use std::collections::BTreeMap;

use log::warn;
use serde_json::Value;
use ustr::Ustr;

use crate::{
    filtering::Row,
    table::{BoundAction, EntityConfig, Tone, bind_actions},
};

/// What action buttons act on. Decorators can read it but never change it.
#[derive(Debug, Clone, PartialEq)]
pub struct RowIdentity {
    pub id: i64,
    pub name: String,
    pub entity_type: Ustr,
    /// Entity-declared derived properties copied from the record.
    pub extras: BTreeMap<String, Value>,
}

impl RowIdentity {
    pub fn new(id: i64, name: impl Into<String>, entity_type: Ustr) -> Self {
        Self {
            id,
            name: name.into(),
            entity_type,
            extras: BTreeMap::new(),
        }
    }

    /// `None` when the record has no integer `id`. A missing `type` falls
    /// back to the table's entity type.
    pub fn from_row(row: &Row, fallback_type: Ustr, derived: &[&str]) -> Option<Self> {
        let id = row.get("id").and_then(Value::as_i64)?;
        let name = match row.get("name") {
            Some(Value::String(name)) => name.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let entity_type = row
            .get("type")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(Ustr::from)
            .unwrap_or(fallback_type);
        let extras = derived
            .iter()
            .filter_map(|key| row.get(*key).map(|value| ((*key).to_owned(), value.clone())))
            .collect();

        Some(Self {
            id,
            name,
            entity_type,
            extras,
        })
    }
}

/// Link that opens a relation table scoped to one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationLink {
    pub label: String,
    /// Entity type listed by the relation table.
    pub entity_type: Ustr,
    /// Property of the listed entity pointing back at the row.
    pub from: String,
    /// Property of the row holding the listed entities.
    pub to: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Value(Value),
    Text(String),
    Badge { label: String, tone: Tone },
    Link(RelationLink),
}

impl Cell {
    pub fn display(&self) -> String {
        match self {
            Self::Value(Value::String(text)) | Self::Text(text) => text.clone(),
            Self::Value(Value::Null) => String::new(),
            Self::Value(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            Self::Value(other) => other.to_string(),
            Self::Badge { label, .. } => format!("[{label}]"),
            Self::Link(link) => link.label.clone(),
        }
    }
}

/// The parent row a relation table is scoped to.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationScope {
    pub parent_table: Ustr,
    pub parent: RowIdentity,
    /// Property of the listed rows pointing at the parent.
    pub from: String,
    /// Property of the parent holding the listed rows.
    pub to: String,
}

pub struct DecorateContext<'a> {
    pub table_id: Ustr,
    pub entity_type: Ustr,
    pub relation: Option<&'a RelationScope>,
}

/// Rewrites display cells for one row.
pub type RowDecorator = fn(&RowIdentity, &mut BTreeMap<String, Cell>, &DecorateContext<'_>);

#[derive(Debug, Clone, PartialEq)]
pub struct DecoratedRow {
    pub identity: RowIdentity,
    pub cells: BTreeMap<String, Cell>,
    pub actions: Vec<BoundAction>,
}

impl DecoratedRow {
    pub fn cell(&self, key: &str) -> Option<&Cell> {
        self.cells.get(key)
    }
}

pub fn decorate_row(
    row: Row,
    config: &EntityConfig,
    ctx: &DecorateContext<'_>,
) -> Option<DecoratedRow> {
    let Some(identity) = RowIdentity::from_row(&row, ctx.entity_type, &config.derived_properties)
    else {
        warn!("Dropping {} row without an integer id", ctx.table_id);
        return None;
    };

    let mut cells: BTreeMap<String, Cell> = row
        .into_iter()
        .map(|(key, value)| (key, Cell::Value(value)))
        .collect();
    if let Some(decorator) = config.decorator {
        decorator(&identity, &mut cells, ctx);
    }
    let actions = bind_actions(&config.row_actions, &identity, ctx.relation);

    Some(DecoratedRow {
        identity,
        cells,
        actions,
    })
}
