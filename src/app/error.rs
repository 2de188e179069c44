use thiserror::Error;

use crate::{
    domain::EntryId,
    form::{StoreError, ValidationOutcome},
    gateway::GatewayError,
};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("no form is open")]
    NoFormOpen,
    #[error("form name cannot be empty")]
    EmptyFormName,
    #[error("a form named `{0}` already exists")]
    DuplicateFormName(String),
    #[error("save the form before submitting data")]
    UnsavedChanges,
    #[error("the form has no fields")]
    EmptyForm,
    #[error("no entry is being edited")]
    NotEditing,
    #[error("entry {0} is not loaded")]
    UnknownEntry(EntryId),
    #[error("validator could not be built: {0}")]
    Validator(String),
    #[error("{issues} issue(s) remaining")]
    Invalid { issues: usize, outcome: ValidationOutcome },
}

impl EditorError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, EditorError::Gateway(err) if err.is_not_found())
    }
}
