//! The server-backed table engine.
//!
//! Entity tables are data: an [`EntityConfig`] from the [`EntityCatalog`]
//! says which columns a table has, which constraints it always sends and
//! how its rows are decorated. A [`TableController`] drives one live table
//! and the [`TableRegistry`] owns all of them.

mod catalog;
mod column;
mod controller;
mod entity;
mod error;
mod export;
mod registry;
mod row;
mod state;
mod view;

pub use catalog::EntityCatalog;
pub use column::{BoolLabels, ColumnSet, ColumnSpec, SearchKind};
pub use controller::{
    PendingQuery, QueryOutcome, SearchTrigger, TableController, TableEffect, TableEnv,
    TableOptions,
};
pub use entity::{
    ConstraintContext, ConstraintFn, EntityConfig, STANDARD_CONTROLS, user_scope_constraints,
};
pub use error::TableError;
pub use export::{CsvDownload, csv_download, csv_export};
pub use registry::{Opened, TableRegistry};
pub use row::{
    Cell, DecorateContext, DecoratedRow, RelationLink, RelationScope, RowDecorator, RowIdentity,
    decorate_row,
};
pub use state::{SearchOptions, TableState, TableStatus, UserScope, table_id};
pub use view::{
    ActionDescriptor, ActionKind, BoundAction, ControlKind, ControlView, Tone, bind_actions,
};
