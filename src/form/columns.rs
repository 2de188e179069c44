use crate::domain::{DataEntry, FormSchema};

/// A column of the entry table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayColumn {
    pub key: String,
    pub label: String,
}

/// Columns for the current fields, followed by keys that only survive in
/// stored entries (labelled by their key).
pub fn display_columns(schema: Option<&FormSchema>, entries: &[DataEntry]) -> Vec<DisplayColumn> {
    let mut columns: Vec<DisplayColumn> = schema
        .into_iter()
        .flat_map(FormSchema::fields)
        .map(|field| DisplayColumn {
            key: field.key.clone(),
            label: field.column_label().to_string(),
        })
        .collect();
    for entry in entries {
        for key in entry.data.keys() {
            if key == "id" || columns.iter().any(|column| &column.key == key) {
                continue;
            }
            columns.push(DisplayColumn {
                key: key.clone(),
                label: key.clone(),
            });
        }
    }
    columns
}
