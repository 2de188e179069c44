use indexmap::IndexMap;
use jsonschema::validator_for;
use serde_json::{Map, Value, json};

use crate::domain::{FieldDescriptor, FormSchema};

pub const REQUIRED_MESSAGE: &str = "This field is required!";

/// Input control bound to one field key.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub value: Value,
    pub required: bool,
    pub error: Option<String>,
}

impl Control {
    fn for_field(field: &FieldDescriptor) -> Self {
        Self {
            value: Value::String(String::new()),
            required: field.required,
            error: None,
        }
    }
}

#[derive(Debug)]
pub enum ValidationOutcome {
    Valid(Value),
    Invalid {
        issues: usize,
        errors: IndexMap<String, String>,
        global_errors: Vec<String>,
    },
    BuildError {
        message: String,
    },
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }

    pub fn issue_count(&self) -> usize {
        match self {
            ValidationOutcome::Invalid { issues, .. } => *issues,
            _ => 0,
        }
    }
}

/// Named controls mirroring the keys of the open form, in field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlSet {
    controls: IndexMap<String, Control>,
}

impl ControlSet {
    pub fn from_schema(schema: &FormSchema) -> Self {
        let controls = schema
            .fields()
            .map(|field| (field.key.clone(), Control::for_field(field)))
            .collect();
        Self { controls }
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.controls.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Control> {
        self.controls.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.controls.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Control)> {
        self.controls.iter().map(|(key, control)| (key.as_str(), control))
    }

    pub fn add(&mut self, field: &FieldDescriptor) {
        self.controls
            .entry(field.key.clone())
            .or_insert_with(|| Control::for_field(field));
    }

    pub fn remove(&mut self, key: &str) -> Option<Control> {
        self.controls.shift_remove(key)
    }

    pub fn clear(&mut self) {
        self.controls.clear();
    }

    /// Re-registers the control under `new`, keeping its value, validators
    /// and position.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        if old == new {
            return self.controls.contains_key(old);
        }
        let Some((index, _, control)) = self.controls.shift_remove_full(old) else {
            return false;
        };
        self.controls.shift_remove(new);
        let index = index.min(self.controls.len());
        self.controls.shift_insert(index, new.to_string(), control);
        true
    }

    pub fn set_required(&mut self, key: &str, required: bool) {
        if let Some(control) = self.controls.get_mut(key) {
            control.required = required;
            if !required {
                control.error = None;
            }
        }
    }

    pub fn set_value(&mut self, key: &str, value: Value) -> bool {
        match self.controls.get_mut(key) {
            Some(control) => {
                control.value = value;
                control.error = None;
                true
            }
            None => false,
        }
    }

    /// Clears every value back to an empty input.
    pub fn reset_values(&mut self) {
        for control in self.controls.values_mut() {
            control.value = Value::String(String::new());
            control.error = None;
        }
    }

    pub fn error_count(&self) -> usize {
        self.controls
            .values()
            .filter(|control| control.error.is_some())
            .count()
    }

    pub fn value(&self) -> Value {
        let map: Map<String, Value> = self
            .controls
            .iter()
            .map(|(key, control)| (key.clone(), control.value.clone()))
            .collect();
        Value::Object(map)
    }

    /// JSON Schema equivalent of the controls' validators.
    pub fn validation_schema(&self) -> Value {
        let required: Vec<&str> = self
            .controls
            .iter()
            .filter(|(_, control)| control.required)
            .map(|(key, _)| key.as_str())
            .collect();
        let properties: Map<String, Value> = required
            .iter()
            .map(|key| (key.to_string(), json!({ "not": { "enum": [null, ""] } })))
            .collect();
        json!({
            "type": "object",
            "required": required,
            "properties": properties,
        })
    }

    pub fn validate(&mut self) -> ValidationOutcome {
        for control in self.controls.values_mut() {
            control.error = None;
        }
        let schema = self.validation_schema();
        let validator = match validator_for(&schema) {
            Ok(validator) => validator,
            Err(err) => {
                return ValidationOutcome::BuildError {
                    message: err.to_string(),
                };
            }
        };
        let value = self.value();
        if validator.is_valid(&value) {
            return ValidationOutcome::Valid(value);
        }

        let mut issues = 0usize;
        let mut errors = IndexMap::new();
        let mut global_errors = Vec::new();
        for error in validator.iter_errors(&value) {
            issues += 1;
            let pointer = error.instance_path.to_string();
            let target = key_from_pointer(&pointer)
                .and_then(|key| self.controls.get_mut(&key).map(|control| (key, control)));
            match target {
                Some((key, control)) => {
                    control.error = Some(REQUIRED_MESSAGE.to_string());
                    errors.insert(key, REQUIRED_MESSAGE.to_string());
                }
                None => {
                    let prefix = if pointer.is_empty() {
                        "<root>".to_string()
                    } else {
                        pointer
                    };
                    global_errors.push(format!("{prefix}: {error}"));
                }
            }
        }
        ValidationOutcome::Invalid {
            issues,
            errors,
            global_errors,
        }
    }
}

fn key_from_pointer(pointer: &str) -> Option<String> {
    let segment = pointer.strip_prefix('/')?;
    if segment.is_empty() || segment.contains('/') {
        return None;
    }
    Some(segment.replace("~1", "/").replace("~0", "~"))
}
