use thiserror::Error;

/// Rejections raised by the schema store. A rejected operation leaves the
/// store exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no form is open")]
    NoFormOpen,
    #[error("row {row} does not exist")]
    RowOutOfBounds { row: usize },
    #[error("row {row} is full ({capacity} fields per row)")]
    RowFull { row: usize, capacity: usize },
    #[error("row {row} holds {count} fields ({capacity} fields per row)")]
    RowOverflow {
        row: usize,
        count: usize,
        capacity: usize,
    },
    #[error("no field at index {index}")]
    FieldNotFound { index: usize },
    #[error("no field at row {row}, position {position}")]
    PositionNotFound { row: usize, position: usize },
    #[error("field key is required")]
    EmptyKey,
    #[error("field label is required")]
    EmptyLabel,
    #[error("field key `{key}` is already used in this form")]
    DuplicateKey { key: String },
    #[error("field `{key}` needs at least one option")]
    MissingOptions { key: String },
    #[error("{given} patches for {fields} fields")]
    PatchCountMismatch { given: usize, fields: usize },
}
