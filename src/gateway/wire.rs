//! JSON layout of persisted forms, shared by the local-storage file and the
//! REST backend.
//!
//! A form is stored as an array of rows:
//!
//! ```json
//! [{ "fieldGroupClassName": "row",
//!    "fieldGroup": [{ "key": "input1", "type": "input", "className": "col-12",
//!                     "wrappers": ["form-field-horizontal"],
//!                     "props": { "label": "input1", "required": true } }] }]
//! ```
//!
//! Older saves hold a flat array of field configs; each one loads as a row
//! of its own.

use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        DEFAULT_COLUMN_CLASS, DataEntry, EntryData, EntryId, FieldDescriptor, FieldGroup,
        FieldKind, FieldOption, FormSchema, StyleMap, Wrapper,
    },
    form::reindex,
};

pub const ROW_CLASS: &str = "row";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub wrappers: Vec<String>,
    #[serde(default)]
    pub props: FieldProps,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldProps {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub label_class: String,
    #[serde(default)]
    pub label_for: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionConfig>,
    #[serde(default)]
    pub style: StyleMap,
    #[serde(default)]
    pub label_style: StyleMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionConfig {
    pub label: String,
    #[serde(default)]
    pub value: String,
    /// Placeholder entries such as "Select..." are disabled and dropped on load.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowConfig {
    #[serde(default = "row_class")]
    pub field_group_class_name: String,
    pub field_group: Vec<FieldConfig>,
}

fn row_class() -> String {
    ROW_CLASS.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredRow {
    Row(RowConfig),
    Field(FieldConfig),
}

/// Form as exchanged with the REST backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default)]
    pub fields: Vec<StoredRow>,
}

/// Entry as kept in local storage: the id next to the submitted values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalEntry {
    pub id: EntryId,
    #[serde(flatten)]
    pub data: EntryData,
}

impl From<LocalEntry> for DataEntry {
    fn from(entry: LocalEntry) -> Self {
        DataEntry::new(entry.id, entry.data)
    }
}

impl From<&DataEntry> for LocalEntry {
    fn from(entry: &DataEntry) -> Self {
        Self {
            id: entry.id,
            data: entry.data.clone(),
        }
    }
}

/// Wrapper tag vocabulary a backend stores. Both are accepted on load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagStyle {
    /// `form-field-*`, kept in local storage.
    #[default]
    Plain,
    /// `ngform-field-*`, kept by the REST backend.
    Skin,
}

impl TagStyle {
    pub fn tag(self, wrapper: Wrapper) -> &'static str {
        match self {
            TagStyle::Plain => wrapper.tag(),
            TagStyle::Skin => wrapper.skin_tag(),
        }
    }
}

impl FieldConfig {
    pub fn from_descriptor(field: &FieldDescriptor, style: TagStyle) -> Self {
        let options = field
            .options
            .iter()
            .map(|option| OptionConfig {
                label: option.label.clone(),
                value: option.value.clone(),
                disabled: false,
            })
            .collect();
        Self {
            key: field.key.clone(),
            kind: field.kind,
            class_name: field.column_class.clone(),
            wrappers: vec![style.tag(field.wrapper).to_string()],
            props: FieldProps {
                label: field.label.clone(),
                id: field.key.clone(),
                placeholder: field.placeholder.clone(),
                class: field.css_class.clone(),
                label_class: field.label_css_class.clone(),
                label_for: field.key.clone(),
                required: field.required,
                options,
                style: field.style.clone(),
                label_style: field.label_style.clone(),
            },
        }
    }

    fn first_wrapper(&self) -> Option<Wrapper> {
        self.wrappers.first().and_then(|tag| Wrapper::from_tag(tag))
    }

    pub fn into_descriptor(self, wrapper: Wrapper) -> FieldDescriptor {
        let props = self.props;
        let options = props
            .options
            .into_iter()
            .filter(|option| !option.disabled)
            .map(|option| FieldOption {
                label: option.label,
                value: option.value,
            })
            .collect();
        let column_class = if self.class_name.trim().is_empty() {
            DEFAULT_COLUMN_CLASS.to_string()
        } else {
            self.class_name
        };
        FieldDescriptor {
            key: self.key,
            kind: self.kind,
            label: props.label,
            placeholder: props.placeholder,
            css_class: props.class,
            label_css_class: props.label_class,
            column_class,
            required: props.required,
            options,
            style: props.style,
            label_style: props.label_style,
            wrapper,
            display_index: 0,
        }
    }
}

impl StoredRow {
    fn first_field(&self) -> Option<&FieldConfig> {
        match self {
            StoredRow::Row(row) => row.field_group.first(),
            StoredRow::Field(field) => Some(field),
        }
    }

    fn into_group(self, wrapper: Wrapper) -> FieldGroup {
        let fields = match self {
            StoredRow::Row(row) => row.field_group,
            StoredRow::Field(field) => vec![field],
        };
        FieldGroup {
            fields: fields
                .into_iter()
                .map(|field| field.into_descriptor(wrapper))
                .collect(),
        }
    }
}

pub fn rows_to_wire(schema: &FormSchema, style: TagStyle) -> Vec<StoredRow> {
    schema
        .rows
        .iter()
        .map(|group| {
            StoredRow::Row(RowConfig {
                field_group_class_name: row_class(),
                field_group: group
                    .fields
                    .iter()
                    .map(|field| FieldConfig::from_descriptor(field, style))
                    .collect(),
            })
        })
        .collect()
}

/// Rebuilds a schema from stored rows. The form wrapper is `preference` when
/// set, else the first field's first wrapper, else the default; every field
/// is normalized to it and display indices are recomputed.
pub fn schema_from_rows(
    name: impl Into<String>,
    rows: Vec<StoredRow>,
    preference: Option<Wrapper>,
) -> FormSchema {
    let wrapper = preference
        .or_else(|| {
            rows.iter()
                .find_map(|row| row.first_field().and_then(FieldConfig::first_wrapper))
        })
        .unwrap_or_default();
    let mut rows: Vec<FieldGroup> = rows.into_iter().map(|row| row.into_group(wrapper)).collect();
    reindex(&mut rows);
    FormSchema {
        name: name.into(),
        rows,
        wrapper,
    }
}
