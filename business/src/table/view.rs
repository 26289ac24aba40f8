//! Declarative view descriptors for row actions and table controls.

use crate::table::{RelationScope, RowIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Primary,
    Info,
    Success,
    Warning,
    Danger,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Changelog,
    Edit,
    Duplicate,
    Delete,
    /// Detach from the parent of a relation table.
    Remove,
    Connect,
    NetworkData,
    Results,
    Logs,
    Run,
    Export,
    Download,
    CopyName,
    Compare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionDescriptor {
    pub kind: ActionKind,
    pub icon: &'static str,
    pub tooltip: &'static str,
    pub tone: Tone,
}

impl ActionKind {
    pub const fn descriptor(self) -> ActionDescriptor {
        let (icon, tooltip, tone) = match self {
            Self::Changelog => ("history", "Changelog", Tone::Info),
            Self::Edit => ("edit", "Edit", Tone::Primary),
            Self::Duplicate => ("copy", "Duplicate", Tone::Primary),
            Self::Delete => ("trash", "Delete", Tone::Danger),
            Self::Remove => ("remove", "Remove", Tone::Danger),
            Self::Connect => ("console", "Connection", Tone::Success),
            Self::NetworkData => ("cog", "Network Data", Tone::Info),
            Self::Results => ("list-alt", "Results", Tone::Info),
            Self::Logs => ("file", "Logs", Tone::Info),
            Self::Run => ("play", "Run", Tone::Success),
            Self::Export => ("export", "Export", Tone::Neutral),
            Self::Download => ("download", "Download", Tone::Neutral),
            Self::CopyName => ("clipboard", "Copy to clipboard", Tone::Neutral),
            Self::Compare => ("adjust", "Compare", Tone::Primary),
        };
        ActionDescriptor {
            kind: self,
            icon,
            tooltip,
            tone,
        }
    }
}

/// An action bound to the row it acts on.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundAction {
    pub descriptor: ActionDescriptor,
    pub target: RowIdentity,
    /// Set for removals: the relation the row is detached from.
    pub relation: Option<RelationScope>,
}

impl BoundAction {
    pub fn kind(&self) -> ActionKind {
        self.descriptor.kind
    }
}

/// Binds row actions to `identity`. In a relation table, deleting becomes
/// removing from the parent.
pub fn bind_actions(
    kinds: &[ActionKind],
    identity: &RowIdentity,
    relation: Option<&RelationScope>,
) -> Vec<BoundAction> {
    kinds
        .iter()
        .map(|kind| {
            let kind = match (kind, relation) {
                (ActionKind::Delete, Some(_)) => ActionKind::Remove,
                (kind, _) => *kind,
            };
            BoundAction {
                descriptor: kind.descriptor(),
                target: identity.clone(),
                relation: match kind {
                    ActionKind::Remove => relation.cloned(),
                    _ => None,
                },
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    ColumnDisplay,
    Refresh,
    Changelog,
    BulkFilter,
    CopyLink,
    ClearSearch,
    CopySelection,
    CreateNew,
    /// Attach existing rows to the parent of a relation table.
    AddRelation,
    BulkEdit,
    Export,
    BulkDeletion,
    BulkRemoval,
    UserFiltering,
    ParentFiltering,
    PaginationCount,
    SerializedSearch,
}

impl ControlKind {
    fn icon_and_tooltip(self) -> (&'static str, &'static str) {
        match self {
            Self::ColumnDisplay => ("th-list", "Column Display"),
            Self::Refresh => ("refresh", "Refresh"),
            Self::Changelog => ("history", "Changelog"),
            Self::BulkFilter => ("filter", "Advanced Search"),
            Self::CopyLink => ("link", "Copy Search Link"),
            Self::ClearSearch => ("remove-circle", "Clear Search"),
            Self::CopySelection => ("clipboard", "Copy Selection to Clipboard"),
            Self::CreateNew => ("plus", "Create New"),
            Self::AddRelation => ("plus", "Add to Relation"),
            Self::BulkEdit => ("edit", "Bulk Edit"),
            Self::Export => ("download", "Export as CSV"),
            Self::BulkDeletion => ("trash", "Bulk Deletion"),
            Self::BulkRemoval => ("remove", "Bulk Removal"),
            Self::UserFiltering => ("user", "Display only my instances"),
            Self::ParentFiltering => ("folder-open", "Display only top-level instances"),
            Self::PaginationCount => ("sort-by-order", "Load count"),
            Self::SerializedSearch => ("search", "Search across all properties"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlView {
    pub kind: ControlKind,
    pub icon: &'static str,
    pub tooltip: &'static str,
    /// Current state for toggle controls.
    pub active: Option<bool>,
}

impl ControlView {
    pub fn new(kind: ControlKind) -> Self {
        let (icon, tooltip) = kind.icon_and_tooltip();
        Self {
            kind,
            icon,
            tooltip,
            active: None,
        }
    }

    pub fn toggle(kind: ControlKind, active: bool) -> Self {
        Self {
            active: Some(active),
            ..Self::new(kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ustr::Ustr;

    fn identity() -> RowIdentity {
        RowIdentity::new(1, "r1", Ustr::from("device"))
    }

    #[test]
    fn actions_target_the_row() {
        let actions = bind_actions(
            &[ActionKind::Edit, ActionKind::Delete],
            &identity(),
            None,
        );

        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|a| a.target.id == 1));
        assert_eq!(actions[1].kind(), ActionKind::Delete);
        assert_eq!(actions[1].descriptor.tooltip, "Delete");
        assert_eq!(actions[1].relation, None);
    }

    #[test]
    fn delete_becomes_remove_in_relation_tables() {
        let scope = RelationScope {
            parent_table: Ustr::from("pool"),
            parent: RowIdentity::new(3, "core", Ustr::from("pool")),
            from: "pools".to_owned(),
            to: "devices".to_owned(),
        };

        let actions = bind_actions(&[ActionKind::Delete], &identity(), Some(&scope));
        assert_eq!(actions[0].kind(), ActionKind::Remove);
        assert_eq!(actions[0].descriptor.tone, Tone::Danger);
        assert_eq!(actions[0].relation.as_ref(), Some(&scope));
    }

    #[test]
    fn toggle_controls_carry_state() {
        let view = ControlView::toggle(ControlKind::UserFiltering, true);
        assert_eq!(view.active, Some(true));
        assert_eq!(view.tooltip, "Display only my instances");
        assert_eq!(ControlView::new(ControlKind::Refresh).active, None);
    }
}
