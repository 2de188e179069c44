use crate::domain::FieldKind;

use super::patch::FieldPatch;

/// Structural edit requested by a builder surface.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldCommand {
    AddField {
        kind: FieldKind,
        row: Option<usize>,
    },
    AddDivider,
    EditField {
        index: usize,
        patch: FieldPatch,
    },
    EditRow {
        row: usize,
        patches: Vec<FieldPatch>,
    },
    EditAll {
        patches: Vec<FieldPatch>,
    },
    DeleteField {
        row: usize,
        position: usize,
    },
    DeleteRow {
        row: usize,
    },
    ClearFields,
    MoveField {
        from_row: usize,
        from_position: usize,
        to_row: usize,
        to_position: usize,
    },
    MoveRow {
        from: usize,
        to: usize,
    },
}
