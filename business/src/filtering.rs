//! Wire types for the filtering and bulk endpoints.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An opaque server record.
pub type Row = Map<String, Value>;

/// How a per-column term is matched on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Inclusion,
    Equality,
    Regex,
    Empty,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inclusion => "inclusion",
            Self::Equality => "equality",
            Self::Regex => "regex",
            Self::Empty => "empty",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inclusion" => Ok(Self::Inclusion),
            "equality" => Ok(Self::Equality),
            "regex" => Ok(Self::Regex),
            "empty" => Ok(Self::Empty),
            other => Err(format!(
                "unknown search mode `{other}` (expected inclusion, equality, regex or empty)"
            )),
        }
    }
}

/// A per-column search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchValue {
    Text(String),
    Bool(bool),
}

impl SearchValue {
    /// Value as it appears in the request form. Booleans travel as
    /// `bool-true` / `bool-false`.
    pub fn to_form_value(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Bool(true) => Value::String("bool-true".to_owned()),
            Self::Bool(false) => Value::String("bool-false".to_owned()),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }
}

impl From<&str> for SearchValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<bool> for SearchValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction `{other}` (expected asc or desc)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub column: usize,
    pub dir: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedColumn {
    pub data: String,
    pub name: String,
    pub orderable: bool,
    pub searchable: bool,
}

/// The filter description shared by the filtering query and the bulk endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilteringPayload {
    pub form: Map<String, Value>,
    pub constraints: Map<String, Value>,
    pub columns: Vec<RequestedColumn>,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub rbac: String,
}

/// `POST /filtering/{model}` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteringRequest {
    pub draw: u64,
    pub start: usize,
    pub length: usize,
    pub order: Vec<OrderSpec>,
    #[serde(flatten)]
    pub payload: FilteringPayload,
    pub export: bool,
    pub clipboard: bool,
    pub pagination: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of the id-only variant used before a bulk edit.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct IdsRequest<'a> {
    #[serde(flatten)]
    pub payload: &'a FilteringPayload,
    pub bulk: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteringResponse {
    #[serde(default)]
    pub draw: Option<u64>,
    #[serde(default, rename = "recordsTotal")]
    pub records_total: Option<u64>,
    #[serde(default, rename = "recordsFiltered")]
    pub records_filtered: Option<u64>,
    #[serde(default)]
    pub data: Vec<Row>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub clipboard: Option<String>,
    #[serde(default)]
    pub full_result: Option<Vec<Row>>,
}

/// Count the server reports when real counts were not asked for.
pub const UNCOUNTED_RECORDS: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    Set,
    Append,
    Remove,
}

impl FromStr for EditMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "set" => Ok(Self::Set),
            "append" => Ok(Self::Append),
            "remove" => Ok(Self::Remove),
            other => Err(format!("unknown edit mode `{other}` (expected set, append or remove)")),
        }
    }
}

/// One property changed by a bulk edit. `mode` applies to list properties.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkEditChange {
    pub property: String,
    pub value: Value,
    pub mode: Option<EditMode>,
}

impl BulkEditChange {
    pub fn set(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            mode: None,
        }
    }

    pub fn with_mode(mut self, mode: EditMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

/// Flat `POST /bulk_edit/{model}` form: `id` is the dash-joined id list,
/// every changed property is flagged with `bulk-edit-{property}`.
pub fn bulk_edit_form(ids: &[i64], changes: &[BulkEditChange]) -> Map<String, Value> {
    let mut form = Map::new();
    let joined = ids
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join("-");
    form.insert("id".to_owned(), Value::String(joined));

    for change in changes {
        form.insert(change.property.clone(), change.value.clone());
        form.insert(format!("bulk-edit-{}", change.property), Value::Bool(true));
        if let Some(mode) = change.mode {
            form.insert(
                format!("{}-edit-mode", change.property),
                serde_json::to_value(mode).unwrap_or(Value::Null),
            );
        }
    }

    form
}
