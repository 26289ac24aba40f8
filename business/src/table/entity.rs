//! Per-entity table configuration.

use serde_json::{Map, Value};
use ustr::Ustr;

use crate::{
    filtering::SortDirection,
    table::{
        ActionKind, ColumnSpec, ControlKind, ControlView, RelationScope, RowDecorator,
        TableState, UserScope,
    },
};

/// What default constraints may depend on.
pub struct ConstraintContext<'a> {
    pub state: &'a TableState,
    pub relation: Option<&'a RelationScope>,
    pub current_user: Option<&'a str>,
    pub folder_path: Option<&'a str>,
}

pub type ConstraintFn = fn(&ConstraintContext<'_>) -> Map<String, Value>;

#[derive(Debug, Clone)]
pub struct EntityConfig {
    pub entity_type: Ustr,
    /// Model the filtering endpoint is called with. Defaults to the entity type.
    pub model: Option<Ustr>,
    pub columns: Vec<ColumnSpec>,
    /// Initial sort: declared column index and direction.
    pub ordering: (usize, SortDirection),
    pub rbac: &'static str,
    pub default_constraints: Option<ConstraintFn>,
    /// Merged into every filtering request.
    pub filtering_data: Map<String, Value>,
    pub decorator: Option<RowDecorator>,
    pub row_actions: Vec<ActionKind>,
    pub controls: Vec<ControlKind>,
    pub derived_properties: Vec<&'static str>,
    pub user_filtering: bool,
    pub parent_filtering: bool,
    pub serialized_search: bool,
    pub add_relation_disabled: bool,
}

/// Controls of an inventory-style table.
pub const STANDARD_CONTROLS: [ControlKind; 12] = [
    ControlKind::ColumnDisplay,
    ControlKind::Changelog,
    ControlKind::Refresh,
    ControlKind::BulkFilter,
    ControlKind::CopyLink,
    ControlKind::ClearSearch,
    ControlKind::CopySelection,
    ControlKind::CreateNew,
    ControlKind::BulkEdit,
    ControlKind::Export,
    ControlKind::BulkDeletion,
    ControlKind::PaginationCount,
];

impl EntityConfig {
    pub fn new(entity_type: &str, columns: Vec<ColumnSpec>) -> Self {
        Self {
            entity_type: Ustr::from(entity_type),
            model: None,
            columns,
            ordering: (0, SortDirection::Asc),
            rbac: "read",
            default_constraints: None,
            filtering_data: Map::new(),
            decorator: None,
            row_actions: Vec::new(),
            controls: STANDARD_CONTROLS.to_vec(),
            derived_properties: Vec::new(),
            user_filtering: false,
            parent_filtering: false,
            serialized_search: false,
            add_relation_disabled: false,
        }
    }

    pub fn model(&self) -> Ustr {
        self.model.unwrap_or(self.entity_type)
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(Ustr::from(model));
        self
    }

    pub fn ordered_by(mut self, column: usize, direction: SortDirection) -> Self {
        self.ordering = (column, direction);
        self
    }

    pub fn with_rbac(mut self, rbac: &'static str) -> Self {
        self.rbac = rbac;
        self
    }

    pub fn with_constraints(mut self, constraints: ConstraintFn) -> Self {
        self.default_constraints = Some(constraints);
        self
    }

    pub fn with_filtering_data(mut self, key: &str, value: Value) -> Self {
        self.filtering_data.insert(key.to_owned(), value);
        self
    }

    pub fn with_decorator(mut self, decorator: RowDecorator) -> Self {
        self.decorator = Some(decorator);
        self
    }

    pub fn with_actions(mut self, actions: &[ActionKind]) -> Self {
        self.row_actions = actions.to_vec();
        self
    }

    /// Replaces the control set. Toggle controls follow the entity flags.
    pub fn with_controls(mut self, controls: &[ControlKind]) -> Self {
        self.controls = controls.to_vec();
        self
    }

    pub fn with_derived(mut self, properties: &[&'static str]) -> Self {
        self.derived_properties = properties.to_vec();
        self
    }

    pub fn user_filtering(mut self) -> Self {
        self.user_filtering = true;
        self
    }

    pub fn parent_filtering(mut self) -> Self {
        self.parent_filtering = true;
        self
    }

    pub fn serialized_search(mut self) -> Self {
        self.serialized_search = true;
        self
    }

    pub fn add_relation_disabled(mut self) -> Self {
        self.add_relation_disabled = true;
        self
    }

    /// Per-instance constraints, then entity defaults, then the user scope.
    /// Later sources win on key conflicts.
    pub fn merged_constraints(&self, ctx: &ConstraintContext<'_>) -> Map<String, Value> {
        let mut merged = ctx.state.constraints.clone();
        if let Some(defaults) = self.default_constraints {
            merged.extend(defaults(ctx));
        }
        if self.user_filtering {
            merged.extend(user_scope_constraints(ctx));
        }
        merged
    }

    /// Table-level controls, adjusted for relation tables and current toggles.
    pub fn control_views(
        &self,
        state: &TableState,
        relation: Option<&RelationScope>,
    ) -> Vec<ControlView> {
        let mut views = Vec::new();
        for kind in &self.controls {
            let kind = match (kind, relation) {
                (ControlKind::BulkDeletion, Some(_)) => ControlKind::BulkRemoval,
                (ControlKind::CreateNew, Some(_)) if self.add_relation_disabled => continue,
                (ControlKind::CreateNew, Some(_)) => ControlKind::AddRelation,
                (kind, _) => *kind,
            };
            views.push(match kind {
                ControlKind::PaginationCount => {
                    ControlView::toggle(kind, state.display_pagination)
                }
                _ => ControlView::new(kind),
            });
        }

        if self.user_filtering {
            views.push(ControlView::toggle(
                ControlKind::UserFiltering,
                state.user_scope == UserScope::Mine,
            ));
        }
        if self.parent_filtering {
            views.push(ControlView::toggle(
                ControlKind::ParentFiltering,
                state.parent_filtering,
            ));
        }
        if self.serialized_search {
            views.push(ControlView::new(ControlKind::SerializedSearch));
        }
        views
    }
}

/// `{creator, creator_filter: "equality"}` while the table shows only the
/// current user's rows.
pub fn user_scope_constraints(ctx: &ConstraintContext<'_>) -> Map<String, Value> {
    let mut constraints = Map::new();
    if let (UserScope::Mine, Some(user)) = (ctx.state.user_scope, ctx.current_user) {
        constraints.insert("creator".to_owned(), Value::String(user.to_owned()));
        constraints.insert(
            "creator_filter".to_owned(),
            Value::String("equality".to_owned()),
        );
    }
    constraints
}
