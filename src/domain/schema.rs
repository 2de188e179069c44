use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// CSS property name to value, in declaration order.
pub type StyleMap = IndexMap<String, String>;

pub const DEFAULT_COLUMN_CLASS: &str = "col-12";

const INPUT_STYLE_KEYS: [&str; 6] = [
    "borderRadius",
    "color",
    "backgroundColor",
    "fontFamily",
    "fontSize",
    "fontWeight",
];
const LABEL_STYLE_KEYS: [&str; 5] = [
    "backgroundColor",
    "color",
    "fontFamily",
    "fontSize",
    "fontWeight",
];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown field kind `{0}` (expected input, textarea, select or radio)")]
pub struct UnknownFieldKind(pub String);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown wrapper `{0}` (expected horizontal or vertical)")]
pub struct UnknownWrapper(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Input,
    Textarea,
    Select,
    Radio,
}

impl FieldKind {
    pub const ALL: [FieldKind; 4] = [
        FieldKind::Input,
        FieldKind::Textarea,
        FieldKind::Select,
        FieldKind::Radio,
    ];

    /// Type tag, also used as the prefix of generated keys.
    pub fn tag(self) -> &'static str {
        match self {
            FieldKind::Input => "input",
            FieldKind::Textarea => "textarea",
            FieldKind::Select => "select",
            FieldKind::Radio => "radio",
        }
    }

    pub fn requires_options(self) -> bool {
        matches!(self, FieldKind::Select | FieldKind::Radio)
    }

    fn default_css_class(self) -> &'static str {
        match self {
            FieldKind::Select => "form-select",
            FieldKind::Radio => "form-check-input",
            FieldKind::Input | FieldKind::Textarea => "form-control",
        }
    }

    fn default_label_css_class(self) -> &'static str {
        match self {
            FieldKind::Radio => "form-check-label",
            _ => "form-label",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for FieldKind {
    type Err = UnknownFieldKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        FieldKind::ALL
            .into_iter()
            .find(|kind| kind.tag().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownFieldKind(s.to_string()))
    }
}

/// Layout tag applied uniformly to every field of a form.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum Wrapper {
    #[default]
    #[serde(rename = "form-field-horizontal", alias = "ngform-field-horizontal")]
    Horizontal,
    #[serde(rename = "form-field-vertical", alias = "ngform-field-vertical")]
    Vertical,
}

impl Wrapper {
    pub fn tag(self) -> &'static str {
        match self {
            Wrapper::Horizontal => "form-field-horizontal",
            Wrapper::Vertical => "form-field-vertical",
        }
    }

    /// Tag written by the design-system skin, which the REST backend's
    /// other clients read.
    pub fn skin_tag(self) -> &'static str {
        match self {
            Wrapper::Horizontal => "ngform-field-horizontal",
            Wrapper::Vertical => "ngform-field-vertical",
        }
    }

    /// Resolves a stored wrapper tag, including the design-system skin tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "form-field-horizontal" | "ngform-field-horizontal" => Some(Wrapper::Horizontal),
            "form-field-vertical" | "ngform-field-vertical" => Some(Wrapper::Vertical),
            _ => None,
        }
    }
}

impl fmt::Display for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Wrapper {
    type Err = UnknownWrapper;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(wrapper) = Wrapper::from_tag(s) {
            return Ok(wrapper);
        }
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Ok(Wrapper::Horizontal),
            "vertical" => Ok(Wrapper::Vertical),
            _ => Err(UnknownWrapper(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

impl FieldOption {
    /// Option whose label doubles as its value.
    pub fn labelled(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            value: label.clone(),
            label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub key: String,
    pub kind: FieldKind,
    pub label: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub css_class: String,
    #[serde(default)]
    pub label_css_class: String,
    #[serde(default = "default_column_class")]
    pub column_class: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub style: StyleMap,
    #[serde(default)]
    pub label_style: StyleMap,
    #[serde(default)]
    pub wrapper: Wrapper,
    /// Position in the row-major flattening of the form; recomputed after
    /// every structural change and never persisted.
    #[serde(skip)]
    pub display_index: usize,
}

impl FieldDescriptor {
    /// A freshly dropped field with the builder's default presentation.
    pub fn new(kind: FieldKind, key: impl Into<String>, wrapper: Wrapper) -> Self {
        let key = key.into();
        let placeholder = match kind {
            FieldKind::Input | FieldKind::Textarea => key.clone(),
            FieldKind::Select | FieldKind::Radio => String::new(),
        };
        let options = if kind.requires_options() {
            vec![
                FieldOption::labelled("Option 1"),
                FieldOption::labelled("Option 2"),
            ]
        } else {
            Vec::new()
        };
        let mut style: StyleMap = INPUT_STYLE_KEYS
            .iter()
            .map(|name| (name.to_string(), String::new()))
            .collect();
        style.insert("width".to_string(), "100%".to_string());
        let label_style = LABEL_STYLE_KEYS
            .iter()
            .map(|name| (name.to_string(), String::new()))
            .collect();

        Self {
            label: key.clone(),
            key,
            kind,
            placeholder,
            css_class: kind.default_css_class().to_string(),
            label_css_class: kind.default_label_css_class().to_string(),
            column_class: default_column_class(),
            required: true,
            options,
            style,
            label_style,
            wrapper,
            display_index: 0,
        }
    }

    /// Label shown in entry tables; falls back to the key.
    pub fn column_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.key
        } else {
            &self.label
        }
    }
}

fn default_column_class() -> String {
    DEFAULT_COLUMN_CLASS.to_string()
}

/// A row of fields rendered side by side. An empty row is a divider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldGroup {
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl FieldGroup {
    pub const CAPACITY: usize = 2;

    pub fn with_field(field: FieldDescriptor) -> Self {
        Self {
            fields: vec![field],
        }
    }

    pub fn is_divider(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.fields.len() >= Self::CAPACITY
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormSchema {
    pub name: String,
    #[serde(default)]
    pub rows: Vec<FieldGroup>,
    #[serde(default)]
    pub wrapper: Wrapper,
}

impl FormSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            wrapper: Wrapper::default(),
        }
    }

    pub fn with_wrapper(mut self, wrapper: Wrapper) -> Self {
        self.wrapper = wrapper;
        self
    }

    pub fn with_row(mut self, row: FieldGroup) -> Self {
        self.rows.push(row);
        self
    }

    /// Fields in row-major order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.rows.iter().flat_map(|row| row.fields.iter())
    }

    pub fn fields_mut(&mut self) -> impl Iterator<Item = &mut FieldDescriptor> {
        self.rows.iter_mut().flat_map(|row| row.fields.iter_mut())
    }

    pub fn field_count(&self) -> usize {
        self.rows.iter().map(|row| row.fields.len()).sum()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields().map(|field| field.key.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.keys().any(|existing| existing == key)
    }

    pub fn field_by_key(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields().find(|field| field.key == key)
    }

    /// Rewrites the wrapper tag of the form and of every field in it.
    pub fn apply_wrapper(&mut self, wrapper: Wrapper) {
        self.wrapper = wrapper;
        for field in self.fields_mut() {
            field.wrapper = wrapper;
        }
    }
}
