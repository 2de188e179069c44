mod format;
mod input;
mod output;

use schemars::schema_for;
use serde_json::Value;

use crate::domain::FormSchema;

pub use format::DocumentFormat;
pub use input::{parse_document_str, schema_from_document, schema_from_value};
pub use output::{ExportOptions, ExportTarget, export_form, render};

/// JSON Schema describing the form export document.
pub fn schema_document() -> Value {
    serde_json::to_value(schema_for!(FormSchema)).unwrap_or(Value::Null)
}
