use std::{fmt, num::ParseIntError, str::FromStr};

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Submitted values keyed by field key, in submission order.
pub type EntryData = IndexMap<String, Value>;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(EntryId)
    }
}

/// One record submitted through a form. Keys of fields that were renamed or
/// deleted since submission are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DataEntry {
    pub id: EntryId,
    #[serde(default)]
    pub data: EntryData,
}

impl DataEntry {
    pub fn new(id: EntryId, data: EntryData) -> Self {
        Self { id, data }
    }

    /// An entry carrying nothing but its id.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Column lookup used by tables, where `id` addresses the entry id.
    pub fn column_value(&self, column: &str) -> Option<Value> {
        if column == "id" {
            return Some(Value::from(self.id.0));
        }
        self.data.get(column).cloned()
    }

    /// Moves the value stored under `old` to `new`, keeping its position.
    /// Returns false when the entry has no `old` key.
    pub fn rename_key(&mut self, old: &str, new: &str) -> bool {
        rename_in_place(&mut self.data, old, new)
    }
}

pub(crate) fn rename_in_place(map: &mut EntryData, old: &str, new: &str) -> bool {
    if !map.contains_key(old) {
        return false;
    }
    if old == new {
        return true;
    }
    map.shift_remove(new);
    let Some((index, _, value)) = map.shift_remove_full(old) else {
        return false;
    };
    map.shift_insert(index, new.to_string(), value);
    true
}
