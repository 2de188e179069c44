#![deny(rust_2018_idioms)]

//! Core of a form builder: an editable schema of field rows, the controls
//! that validate data entered through it, and the gateways that persist
//! forms and their entries.

pub mod app;
pub mod domain;
pub mod form;
pub mod gateway;
pub mod io;

pub use app::{EditorError, EditorOptions, EntryTable, FormEditor, Notice, RenameReport};
pub use domain::{
    DataEntry, EntryData, EntryId, FieldDescriptor, FieldGroup, FieldKind, FieldOption,
    FormSchema, Wrapper,
};
pub use form::{EditorState, FieldCommand, FieldPatch, FormStore, StoreError};
pub use gateway::{
    FormGateway, GatewayError, LocalStorageGateway, MemoryGateway, RestGateway, RestOptions,
};
pub use io::{
    DocumentFormat, ExportOptions, ExportTarget, export_form, parse_document_str,
    schema_document, schema_from_document,
};

pub mod prelude {
    pub use super::{
        EditorOptions, FieldCommand, FieldKind, FieldPatch, FormEditor, FormGateway, FormSchema,
        Wrapper,
    };
}
