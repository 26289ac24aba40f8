use std::collections::BTreeMap;

use serde_json::{Map, Value};
use ustr::Ustr;

use crate::{
    filtering::{SearchMode, SearchValue, SortDirection},
    table::{ColumnSet, SearchKind},
};

/// Lifecycle of a table instance. Nothing leaves `Disposed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableStatus {
    Uninitialized,
    Loading,
    Ready,
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SearchOptions {
    pub mode: SearchMode,
    pub invert: bool,
}

/// Whose rows a user-scoped table shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UserScope {
    Mine,
    #[default]
    Everyone,
}

impl UserScope {
    pub fn storage_key(entity_type: &str) -> String {
        format!("userFiltering-{entity_type}")
    }

    pub fn storage_value(&self) -> &'static str {
        match self {
            Self::Mine => "user",
            Self::Everyone => "users",
        }
    }

    pub fn from_storage(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::Mine),
            "users" => Some(Self::Everyone),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Mine => Self::Everyone,
            Self::Everyone => Self::Mine,
        }
    }
}

/// `{type}` or `{type}-{instance}`.
pub fn table_id(entity_type: &str, instance_id: Option<&str>) -> Ustr {
    match instance_id {
        Some(instance) => Ustr::from(&format!("{entity_type}-{instance}")),
        None => Ustr::from(entity_type),
    }
}

/// Everything the next query is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct TableState {
    pub table_type: Ustr,
    pub instance_id: Option<String>,
    /// Per-instance constraints given at open time.
    pub constraints: Map<String, Value>,
    pub current_page: usize,
    pub page_size: usize,
    /// Index into the declared column list.
    pub sort_column: usize,
    pub sort_direction: SortDirection,
    pub search_terms: BTreeMap<String, SearchValue>,
    pub search_options: BTreeMap<String, SearchOptions>,
    pub serialized_search: Option<String>,
    pub user_scope: UserScope,
    pub parent_filtering: bool,
    pub display_pagination: bool,
}

impl TableState {
    pub fn new(table_type: Ustr, instance_id: Option<String>, page_size: usize) -> Self {
        Self {
            table_type,
            instance_id,
            constraints: Map::new(),
            current_page: 0,
            page_size,
            sort_column: 0,
            sort_direction: SortDirection::Asc,
            search_terms: BTreeMap::new(),
            search_options: BTreeMap::new(),
            serialized_search: None,
            user_scope: UserScope::Everyone,
            parent_filtering: true,
            display_pagination: false,
        }
    }

    pub fn table_id(&self) -> Ustr {
        table_id(&self.table_type, self.instance_id.as_deref())
    }

    pub fn start(&self) -> usize {
        self.current_page.saturating_mul(self.page_size)
    }

    /// Row offset of `page`, or `None` when it does not fit in a `usize`.
    pub fn offset(page: usize, page_size: usize) -> Option<usize> {
        page.checked_mul(page_size)
    }

    pub fn has_search(&self) -> bool {
        !self.search_terms.is_empty()
            || !self.search_options.is_empty()
            || self.serialized_search.is_some()
    }

    pub fn clear_search(&mut self) {
        self.search_terms.clear();
        self.search_options.clear();
        self.serialized_search = None;
    }

    /// The `form` part of the filtering payload.
    pub fn search_form(&self, columns: &ColumnSet) -> Map<String, Value> {
        let mut form = Map::new();

        for column in columns.all() {
            let key = column.key.as_str();
            let term = self.search_terms.get(key).filter(|term| !term.is_blank());
            match column.search {
                SearchKind::None => {}
                SearchKind::Boolean => {
                    if let Some(term) = term {
                        form.insert(key.to_owned(), term.to_form_value());
                    }
                }
                SearchKind::Text => {
                    let options = self.search_options.get(key).copied().unwrap_or_default();
                    if let Some(term) = term {
                        form.insert(key.to_owned(), term.to_form_value());
                    }
                    if term.is_some() || options.mode != SearchMode::Inclusion {
                        form.insert(
                            format!("{key}_filter"),
                            Value::String(options.mode.as_str().to_owned()),
                        );
                    }
                    if options.invert {
                        form.insert(format!("{key}_invert"), Value::Bool(true));
                    }
                }
            }
        }

        if let Some(serialized) = self.serialized_search.as_deref().filter(|s| !s.is_empty()) {
            form.insert("serialized".to_owned(), Value::String(serialized.to_owned()));
        }

        form
    }
}
