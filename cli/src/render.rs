//! Terminal rendering of a live table.

use tabled::{builder::Builder, settings::Style};

use netdeck_business::table::{ColumnSpec, ControlView, DecoratedRow, TableController};

/// The action column is replaced by the action names of each row.
fn cell_text(row: &DecoratedRow, column: &ColumnSpec) -> String {
    if column.key == "buttons" {
        return row
            .actions
            .iter()
            .map(|action| action.kind().descriptor().tooltip)
            .collect::<Vec<_>>()
            .join(" ");
    }
    row.cell(&column.key)
        .map(|cell| cell.display())
        .unwrap_or_default()
}

/// The visible columns of `table` as a terminal table.
pub fn rows_table(table: &TableController) -> String {
    let columns: Vec<&ColumnSpec> = table.columns().visible().collect();
    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|column| {
        if column.key == "buttons" {
            "Actions".to_owned()
        } else {
            column.title().to_owned()
        }
    }));
    for row in table.rows() {
        builder.push_record(columns.iter().map(|column| cell_text(row, column)));
    }

    let mut rendered = builder.build();
    rendered.with(Style::rounded());
    rendered.to_string()
}

/// One line under the table: page and, when counted, the record total.
pub fn footer(table: &TableController) -> String {
    let page = table.state().current_page + 1;
    match table.record_count() {
        Some(total) => format!(
            "Page {page}, {} of {total} record(s)",
            table.rows().len()
        ),
        None => format!("Page {page}, {} row(s); pass --count for the total", table.rows().len()),
    }
}

/// All columns with their visibility.
pub fn columns_table(table: &TableController) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Key", "Title", "Visible", "Search", "Sortable", "Exported"]);
    for column in table.columns().all() {
        builder.push_record([
            column.key.clone(),
            column.title().to_owned(),
            yes_no(column.visible),
            format!("{:?}", column.search).to_lowercase(),
            yes_no(column.sortable),
            yes_no(column.exportable),
        ]);
    }

    let mut rendered = builder.build();
    rendered.with(Style::rounded());
    rendered.to_string()
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_owned()
}

/// Control names, with the state of toggles in brackets.
pub fn controls_line(controls: &[ControlView]) -> String {
    controls
        .iter()
        .map(|control| match control.active {
            Some(active) => format!("{} [{}]", control.tooltip, if active { "on" } else { "off" }),
            None => control.tooltip.to_owned(),
        })
        .collect::<Vec<_>>()
        .join(" · ")
}
