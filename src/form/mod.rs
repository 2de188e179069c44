mod actions;
mod columns;
mod controls;
mod error;
mod index;
mod keys;
mod patch;
mod reducers;
mod store;

pub use actions::FieldCommand;
pub use columns::{DisplayColumn, display_columns};
pub use controls::{Control, ControlSet, REQUIRED_MESSAGE, ValidationOutcome};
pub use error::StoreError;
pub use index::{global_index, locate, reindex, validate_schema};
pub use keys::{next_field_key, next_form_name};
pub use patch::{FieldPatch, parse_options};
pub use reducers::{CommandOutcome, apply_command};
pub use store::{EditOutcome, EditorState, FormStore, KeyRename};
