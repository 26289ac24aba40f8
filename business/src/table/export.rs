use csv::{QuoteStyle, WriterBuilder};
use serde_json::Value;

use crate::{
    filtering::Row,
    table::{ColumnSet, TableError},
};

/// A CSV file the host should hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvDownload {
    pub file_name: String,
    pub contents: String,
}

fn field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

/// Exportable visible columns of `rows`, every field quoted.
pub fn csv_export(columns: &ColumnSet, rows: &[Row]) -> Result<String, TableError> {
    let exported: Vec<_> = columns.export_columns().collect();
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    writer
        .write_record(exported.iter().map(|column| column.key.as_str()))
        .map_err(|e| TableError::Export(e.to_string()))?;
    for row in rows {
        writer
            .write_record(exported.iter().map(|column| field(row.get(&column.key))))
            .map_err(|e| TableError::Export(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TableError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| TableError::Export(e.to_string()))
}

pub fn csv_download(entity_type: &str, columns: &ColumnSet, rows: &[Row]) -> Result<CsvDownload, TableError> {
    Ok(CsvDownload {
        file_name: format!("{entity_type}.csv"),
        contents: csv_export(columns, rows)?,
    })
}
