use thiserror::Error;
use ustr::Ustr;

use netdeck_states::StorageError;

use crate::api::ApiError;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Table {0} has been disposed")]
    Disposed(Ustr),
    #[error("Unknown entity type: {0}")]
    UnknownEntity(String),
    #[error("Unknown column `{column}` in table {table}")]
    UnknownColumn { table: Ustr, column: String },
    #[error("Column `{column}` in table {table} is not sortable")]
    NotSortable { table: Ustr, column: String },
    #[error("Column `{column}` in table {table} does not accept {kind} search")]
    NotSearchable {
        table: Ustr,
        column: String,
        kind: &'static str,
    },
    #[error("Duplicate column key `{column}` for entity {entity}")]
    DuplicateColumn { entity: Ustr, column: String },
    #[error("Page size must be greater than zero")]
    InvalidPageSize,
    #[error("Page {page} is out of range for a page size of {page_size}")]
    InvalidPage { page: usize, page_size: usize },
    #[error("Table {table} does not support {feature}")]
    Unsupported { table: Ustr, feature: &'static str },
    #[error("No live table with id {0}")]
    NotOpen(Ustr),
    #[error("Invalid table properties: {0}")]
    TableProperties(String),
    #[error("Failed to build CSV export: {0}")]
    Export(String),
    #[error("Failed to encode search link: {0}")]
    SearchLink(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl TableError {
    pub fn unknown_column(table: Ustr, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            table,
            column: column.into(),
        }
    }

    pub fn unsupported(table: Ustr, feature: &'static str) -> Self {
        Self::Unsupported { table, feature }
    }
}
