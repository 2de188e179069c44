use crate::domain::{FieldDescriptor, FieldGroup};

use super::{
    actions::FieldCommand,
    error::StoreError,
    store::{EditOutcome, FormStore, KeyRename},
};

/// What a command changed, for callers that need to follow up on it.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Added(FieldDescriptor),
    DividerAdded { row: usize },
    Edited(Vec<EditOutcome>),
    Removed(Vec<FieldDescriptor>),
    Cleared,
    Moved,
    /// The addressed field or row no longer exists.
    Ignored,
}

impl CommandOutcome {
    /// Key migrations performed by the command, in application order.
    pub fn renames(&self) -> impl Iterator<Item = &KeyRename> {
        let edits: &[EditOutcome] = match self {
            CommandOutcome::Edited(edits) => edits,
            _ => &[],
        };
        edits.iter().filter_map(|edit| edit.rename.as_ref())
    }
}

pub fn apply_command(
    store: &mut FormStore,
    command: FieldCommand,
) -> Result<CommandOutcome, StoreError> {
    let outcome = match command {
        FieldCommand::AddField { kind, row } => CommandOutcome::Added(store.add_field(kind, row)?),
        FieldCommand::AddDivider => CommandOutcome::DividerAdded {
            row: store.add_divider()?,
        },
        FieldCommand::EditField { index, patch } => {
            CommandOutcome::Edited(vec![store.edit_field(index, &patch)?])
        }
        FieldCommand::EditRow { row, patches } => {
            CommandOutcome::Edited(store.edit_row(row, &patches)?)
        }
        FieldCommand::EditAll { patches } => CommandOutcome::Edited(store.edit_all(&patches)?),
        FieldCommand::DeleteField { row, position } => match store.delete_field(row, position) {
            Some(field) => CommandOutcome::Removed(vec![field]),
            None => CommandOutcome::Ignored,
        },
        FieldCommand::DeleteRow { row } => match store.delete_row(row) {
            Some(FieldGroup { fields }) => CommandOutcome::Removed(fields),
            None => CommandOutcome::Ignored,
        },
        FieldCommand::ClearFields => {
            store.clear_fields()?;
            CommandOutcome::Cleared
        }
        FieldCommand::MoveField {
            from_row,
            from_position,
            to_row,
            to_position,
        } => {
            store.move_field(from_row, from_position, to_row, to_position)?;
            CommandOutcome::Moved
        }
        FieldCommand::MoveRow { from, to } => {
            store.move_row(from, to)?;
            CommandOutcome::Moved
        }
    };
    Ok(outcome)
}
