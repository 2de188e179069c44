use anyhow::{Context, Result, bail};
use serde_json::Value;

use crate::{
    domain::FormSchema,
    form::{reindex, validate_schema},
    gateway::wire::{FormRecord, schema_from_rows},
};

use super::DocumentFormat;

/// Parse structured data in any supported format into a `serde_json::Value`.
pub fn parse_document_str(contents: &str, format: DocumentFormat) -> Result<Value> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str::<Value>(contents).with_context(|| "failed to parse JSON document")
        }
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => {
            serde_yaml::from_str::<Value>(contents).with_context(|| "failed to parse YAML document")
        }
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => contents
            .parse::<toml::Value>()
            .with_context(|| "failed to parse TOML document")
            .and_then(|value| {
                serde_json::to_value(value).context("failed to convert TOML to JSON")
            }),
    }
}

/// Reads a form from an exported document. Both the export layout
/// (`{name, rows, wrapper}`) and the stored row layout (`{name, fields}`)
/// are accepted.
pub fn schema_from_document(contents: &str, format: DocumentFormat) -> Result<FormSchema> {
    let value = parse_document_str(contents, format)?;
    schema_from_value(value)
}

pub fn schema_from_value(value: Value) -> Result<FormSchema> {
    if !value.is_object() {
        bail!("form document must be an object");
    }
    let mut schema = if value.get("rows").is_some() {
        serde_json::from_value::<FormSchema>(value).context("invalid form document")?
    } else {
        let record =
            serde_json::from_value::<FormRecord>(value).context("invalid stored form document")?;
        schema_from_rows(record.name, record.fields, None)
    };
    if schema.name.trim().is_empty() {
        bail!("form document has no name");
    }
    validate_schema(&schema).context("inconsistent form document")?;
    let wrapper = schema.wrapper;
    schema.apply_wrapper(wrapper);
    reindex(&mut schema.rows);
    Ok(schema)
}
