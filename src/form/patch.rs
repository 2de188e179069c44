use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{FieldDescriptor, FieldOption, FormSchema, StyleMap};

use super::error::StoreError;

static BARE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").expect("static regex"));

const PIXEL_INPUT_STYLES: [&str; 2] = ["borderRadius", "fontSize"];
const PIXEL_LABEL_STYLES: [&str; 1] = ["fontSize"];

/// Changes requested from the field configuration dialog. `None` leaves the
/// attribute untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    pub key: Option<String>,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub css_class: Option<String>,
    pub label_css_class: Option<String>,
    pub column_class: Option<String>,
    pub required: Option<bool>,
    pub options: Option<Vec<FieldOption>>,
    pub style: Option<StyleMap>,
    pub label_style: Option<StyleMap>,
}

impl FieldPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_css_class(mut self, class: impl Into<String>) -> Self {
        self.css_class = Some(class.into());
        self
    }

    pub fn with_label_css_class(mut self, class: impl Into<String>) -> Self {
        self.label_css_class = Some(class.into());
        self
    }

    pub fn with_column_class(mut self, class: impl Into<String>) -> Self {
        self.column_class = Some(class.into());
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn with_options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = Some(options);
        self
    }

    /// Options typed as a comma separated list.
    pub fn with_options_text(self, text: &str) -> Self {
        self.with_options(parse_options(text))
    }

    pub fn with_style(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.style
            .get_or_insert_with(StyleMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_label_style(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.label_style
            .get_or_insert_with(StyleMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Key the field will carry once the patch is applied.
    pub(crate) fn target_key(&self, field: &FieldDescriptor) -> String {
        self.key
            .as_deref()
            .map(str::trim)
            .unwrap_or(&field.key)
            .to_string()
    }

    /// Checks the patch against `field` and the rest of `schema` without
    /// touching either.
    pub(crate) fn validate(
        &self,
        schema: &FormSchema,
        field: &FieldDescriptor,
    ) -> Result<(), StoreError> {
        let key = self.target_key(field);
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        let label = self.label.as_deref().unwrap_or(&field.label);
        if label.trim().is_empty() {
            return Err(StoreError::EmptyLabel);
        }
        if key != field.key
            && schema
                .fields()
                .any(|other| other.display_index != field.display_index && other.key == key)
        {
            return Err(StoreError::DuplicateKey { key });
        }
        if field.kind.requires_options()
            && let Some(options) = &self.options
            && options.is_empty()
        {
            return Err(StoreError::MissingOptions { key });
        }
        Ok(())
    }

    /// Applies every attribute except the key, which is migrated separately.
    pub(crate) fn apply_attributes(&self, field: &mut FieldDescriptor) {
        if let Some(label) = &self.label {
            field.label = label.clone();
        }
        if let Some(placeholder) = &self.placeholder {
            field.placeholder = placeholder.clone();
        }
        if let Some(class) = &self.css_class {
            field.css_class = class.clone();
        }
        if let Some(class) = &self.label_css_class {
            field.label_css_class = class.clone();
        }
        if let Some(class) = &self.column_class {
            field.column_class = class.clone();
        }
        if let Some(required) = self.required {
            field.required = required;
        }
        if field.kind.requires_options()
            && let Some(options) = &self.options
        {
            field.options = options.clone();
        }
        if let Some(style) = &self.style {
            merge_style(&mut field.style, style, &PIXEL_INPUT_STYLES);
        }
        if let Some(style) = &self.label_style {
            merge_style(&mut field.label_style, style, &PIXEL_LABEL_STYLES);
        }
    }
}

/// Splits `"a, b,,c"` into trimmed, non-empty options.
pub fn parse_options(text: &str) -> Vec<FieldOption> {
    text.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(FieldOption::labelled)
        .collect()
}

// Only properties the field already exposes are editable.
fn merge_style(target: &mut StyleMap, patch: &StyleMap, pixel_keys: &[&str]) {
    for (name, current) in target.iter_mut() {
        let Some(value) = patch.get(name) else {
            continue;
        };
        *current = if pixel_keys.contains(&name.as_str()) {
            with_pixel_unit(value)
        } else {
            value.clone()
        };
    }
}

fn with_pixel_unit(value: &str) -> String {
    let trimmed = value.trim();
    if BARE_NUMBER.is_match(trimmed) {
        format!("{trimmed}px")
    } else {
        value.to_string()
    }
}
