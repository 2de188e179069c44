mod entry;
mod schema;

pub use entry::{DataEntry, EntryData, EntryId};
pub use schema::{
    DEFAULT_COLUMN_CLASS, FieldDescriptor, FieldGroup, FieldKind, FieldOption, FormSchema,
    StyleMap, UnknownFieldKind, UnknownWrapper, Wrapper,
};

pub(crate) use entry::rename_in_place;
