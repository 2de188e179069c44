use serde_json::Value;
use tracing::debug;

use crate::domain::{
    DataEntry, EntryData, EntryId, FieldDescriptor, FieldGroup, FieldKind, FormSchema, Wrapper,
    rename_in_place,
};

use super::{
    columns::{DisplayColumn, display_columns},
    controls::{ControlSet, ValidationOutcome},
    error::StoreError,
    index::{global_index, locate, reindex},
    keys::next_field_key,
    patch::FieldPatch,
};

/// Lifecycle of the form open in the editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditorState {
    #[default]
    Unopened,
    /// Matches what was last loaded or saved.
    Clean,
    /// Holds structural changes that have not been saved.
    Dirty,
}

/// A field key change and the cached entries it rewrote.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyRename {
    pub old_key: String,
    pub new_key: String,
    pub affected: Vec<EntryId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    pub index: usize,
    pub key: String,
    pub rename: Option<KeyRename>,
}

/// In-memory owner of the open form: its rows, the controls derived from
/// them, the edit buffer and the cached entries shown beside the form.
#[derive(Debug, Clone, Default)]
pub struct FormStore {
    schema: Option<FormSchema>,
    state: EditorState,
    controls: ControlSet,
    model: EntryData,
    entries: Vec<DataEntry>,
    columns: Vec<DisplayColumn>,
    editing: Option<EntryId>,
}

impl FormStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever was open with `schema`, rebuilding the controls
    /// from scratch.
    pub fn load(&mut self, mut schema: FormSchema) {
        let count = reindex(&mut schema.rows);
        debug!(form = %schema.name, fields = count, "loading form into store");
        self.controls = ControlSet::from_schema(&schema);
        self.model.clear();
        self.entries.clear();
        self.editing = None;
        self.schema = Some(schema);
        self.state = EditorState::Clean;
        self.refresh_columns();
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    pub fn schema(&self) -> Option<&FormSchema> {
        self.schema.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.schema.as_ref().map(|schema| schema.name.as_str())
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == EditorState::Dirty
    }

    pub fn controls(&self) -> &ControlSet {
        &self.controls
    }

    pub fn model(&self) -> &EntryData {
        &self.model
    }

    pub fn entries(&self) -> &[DataEntry] {
        &self.entries
    }

    pub fn entry(&self, id: EntryId) -> Option<&DataEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn columns(&self) -> &[DisplayColumn] {
        &self.columns
    }

    pub fn editing(&self) -> Option<EntryId> {
        self.editing
    }

    /// Field addressed by its display index.
    pub fn field(&self, index: usize) -> Option<&FieldDescriptor> {
        let schema = self.schema.as_ref()?;
        let (row, position) = locate(&schema.rows, index)?;
        schema.rows.get(row)?.fields.get(position)
    }

    /// Called once the schema has been persisted.
    pub fn mark_saved(&mut self) {
        if self.state == EditorState::Dirty {
            self.state = EditorState::Clean;
        }
    }

    pub fn add_field(
        &mut self,
        kind: FieldKind,
        target_row: Option<usize>,
    ) -> Result<FieldDescriptor, StoreError> {
        let schema = self.schema.as_mut().ok_or(StoreError::NoFormOpen)?;
        if let Some(row) = target_row {
            let group = schema
                .rows
                .get(row)
                .ok_or(StoreError::RowOutOfBounds { row })?;
            if group.is_full() {
                return Err(StoreError::RowFull {
                    row,
                    capacity: FieldGroup::CAPACITY,
                });
            }
        }

        let key = next_field_key(kind, schema.keys());
        let field = FieldDescriptor::new(kind, key, schema.wrapper);
        self.controls.add(&field);
        let (row, position) = match target_row {
            Some(row) => {
                let group = &mut schema.rows[row];
                group.fields.push(field);
                (row, group.fields.len() - 1)
            }
            None => {
                schema.rows.push(FieldGroup::with_field(field));
                (schema.rows.len() - 1, 0)
            }
        };
        self.commit();
        let added = self.field_at(row, position)?;
        debug!(key = %added.key, row, "field added");
        Ok(added)
    }

    /// Appends an empty row that fields can later be dropped into.
    pub fn add_divider(&mut self) -> Result<usize, StoreError> {
        let schema = self.schema.as_mut().ok_or(StoreError::NoFormOpen)?;
        schema.rows.push(FieldGroup::default());
        let row = schema.rows.len() - 1;
        self.commit();
        Ok(row)
    }

    pub fn edit_field(
        &mut self,
        index: usize,
        patch: &FieldPatch,
    ) -> Result<EditOutcome, StoreError> {
        let schema = self.schema.as_ref().ok_or(StoreError::NoFormOpen)?;
        let (row, position) =
            locate(&schema.rows, index).ok_or(StoreError::FieldNotFound { index })?;
        let field = &schema.rows[row].fields[position];
        patch.validate(schema, field)?;

        let old_key = field.key.clone();
        let new_key = patch.target_key(field);
        let rename = (new_key != old_key).then(|| self.migrate_key(&old_key, &new_key));

        let Some(schema) = self.schema.as_mut() else {
            return Err(StoreError::NoFormOpen);
        };
        let field = &mut schema.rows[row].fields[position];
        field.key = new_key.clone();
        patch.apply_attributes(field);
        let required = field.required;
        self.controls.set_required(&new_key, required);
        self.commit();
        debug!(index, key = %new_key, renamed = rename.is_some(), "field edited");
        Ok(EditOutcome {
            index,
            key: new_key,
            rename,
        })
    }

    /// Applies one patch per field of `row`, all or nothing.
    pub fn edit_row(
        &mut self,
        row: usize,
        patches: &[FieldPatch],
    ) -> Result<Vec<EditOutcome>, StoreError> {
        let schema = self.schema.as_ref().ok_or(StoreError::NoFormOpen)?;
        let group = schema
            .rows
            .get(row)
            .ok_or(StoreError::RowOutOfBounds { row })?;
        if patches.len() > group.fields.len() {
            return Err(StoreError::PatchCountMismatch {
                given: patches.len(),
                fields: group.fields.len(),
            });
        }
        let Some(first) = global_index(&schema.rows, row, 0) else {
            return Ok(Vec::new());
        };
        self.edit_many(patches.iter().enumerate().map(|(i, patch)| (first + i, patch)))
    }

    /// Applies one patch per field of the form in display order, all or
    /// nothing.
    pub fn edit_all(&mut self, patches: &[FieldPatch]) -> Result<Vec<EditOutcome>, StoreError> {
        let schema = self.schema.as_ref().ok_or(StoreError::NoFormOpen)?;
        let fields = schema.field_count();
        if patches.len() > fields {
            return Err(StoreError::PatchCountMismatch {
                given: patches.len(),
                fields,
            });
        }
        self.edit_many(patches.iter().enumerate())
    }

    fn edit_many<'p>(
        &mut self,
        edits: impl Iterator<Item = (usize, &'p FieldPatch)>,
    ) -> Result<Vec<EditOutcome>, StoreError> {
        let mut staged = self.clone();
        let mut outcomes = Vec::new();
        for (index, patch) in edits {
            outcomes.push(staged.edit_field(index, patch)?);
        }
        *self = staged;
        Ok(outcomes)
    }

    /// Removes the field at `(row, position)`, and the row with it when it
    /// ends up empty. Stale coordinates are ignored.
    pub fn delete_field(&mut self, row: usize, position: usize) -> Option<FieldDescriptor> {
        let schema = self.schema.as_mut()?;
        let group = schema.rows.get_mut(row)?;
        if position >= group.fields.len() {
            return None;
        }
        let field = group.fields.remove(position);
        if group.fields.is_empty() {
            schema.rows.remove(row);
        }
        self.controls.remove(&field.key);
        self.commit();
        debug!(key = %field.key, row, position, "field deleted");
        Some(field)
    }

    /// Removes a whole row together with its fields.
    pub fn delete_row(&mut self, row: usize) -> Option<FieldGroup> {
        let schema = self.schema.as_mut()?;
        if row >= schema.rows.len() {
            return None;
        }
        let group = schema.rows.remove(row);
        for field in &group.fields {
            self.controls.remove(&field.key);
        }
        self.commit();
        Some(group)
    }

    pub fn clear_fields(&mut self) -> Result<(), StoreError> {
        let schema = self.schema.as_mut().ok_or(StoreError::NoFormOpen)?;
        schema.rows.clear();
        self.controls.clear();
        self.model.clear();
        self.commit();
        Ok(())
    }

    /// Moves a field within its row or into another row. The target
    /// position is clamped; a row emptied by the move stays as a divider.
    pub fn move_field(
        &mut self,
        from_row: usize,
        from_position: usize,
        to_row: usize,
        to_position: usize,
    ) -> Result<(), StoreError> {
        let schema = self.schema.as_mut().ok_or(StoreError::NoFormOpen)?;
        for row in [from_row, to_row] {
            if row >= schema.rows.len() {
                return Err(StoreError::RowOutOfBounds { row });
            }
        }
        if from_position >= schema.rows[from_row].fields.len() {
            return Err(StoreError::PositionNotFound {
                row: from_row,
                position: from_position,
            });
        }

        if from_row == to_row {
            let fields = &mut schema.rows[from_row].fields;
            let target = to_position.min(fields.len() - 1);
            let field = fields.remove(from_position);
            fields.insert(target, field);
        } else {
            if schema.rows[to_row].is_full() {
                return Err(StoreError::RowFull {
                    row: to_row,
                    capacity: FieldGroup::CAPACITY,
                });
            }
            let field = schema.rows[from_row].fields.remove(from_position);
            let destination = &mut schema.rows[to_row].fields;
            let target = to_position.min(destination.len());
            destination.insert(target, field);
        }
        self.commit();
        Ok(())
    }

    pub fn move_row(&mut self, from: usize, to: usize) -> Result<(), StoreError> {
        let schema = self.schema.as_mut().ok_or(StoreError::NoFormOpen)?;
        if from >= schema.rows.len() {
            return Err(StoreError::RowOutOfBounds { row: from });
        }
        let target = to.min(schema.rows.len() - 1);
        let group = schema.rows.remove(from);
        schema.rows.insert(target, group);
        self.commit();
        Ok(())
    }

    /// Rewrites the wrapper of every field. The wrapper is persisted on its
    /// own, so this does not mark the form dirty.
    pub fn change_wrapper(&mut self, wrapper: Wrapper) -> Result<(), StoreError> {
        let schema = self.schema.as_mut().ok_or(StoreError::NoFormOpen)?;
        schema.apply_wrapper(wrapper);
        Ok(())
    }

    pub fn set_value(&mut self, key: &str, value: Value) {
        self.controls.set_value(key, value.clone());
        self.model.insert(key.to_string(), value);
    }

    pub fn reset_model(&mut self) {
        self.model.clear();
        self.controls.reset_values();
        self.editing = None;
    }

    /// Loads an entry into the edit buffer, orphan keys included.
    pub fn begin_entry_edit(&mut self, entry: &DataEntry) {
        self.controls.reset_values();
        for (key, value) in &entry.data {
            self.controls.set_value(key, value.clone());
        }
        self.model = entry.data.clone();
        self.editing = Some(entry.id);
    }

    pub fn validate(&mut self) -> ValidationOutcome {
        self.controls.validate()
    }

    pub fn set_entries(&mut self, entries: Vec<DataEntry>) {
        self.entries = entries;
        self.refresh_columns();
    }

    // Moves `old` to `new` in the controls, the edit buffer and every cached
    // entry; columns follow on the next commit.
    fn migrate_key(&mut self, old: &str, new: &str) -> KeyRename {
        self.controls.rename(old, new);
        rename_in_place(&mut self.model, old, new);
        let affected = self
            .entries
            .iter_mut()
            .filter_map(|entry| entry.rename_key(old, new).then_some(entry.id))
            .collect::<Vec<_>>();
        debug!(old, new, entries = affected.len(), "field key migrated");
        KeyRename {
            old_key: old.to_string(),
            new_key: new.to_string(),
            affected,
        }
    }

    // Single place structural edits funnel through.
    fn commit(&mut self) {
        if let Some(schema) = self.schema.as_mut() {
            reindex(&mut schema.rows);
        }
        self.state = EditorState::Dirty;
        self.refresh_columns();
    }

    fn refresh_columns(&mut self) {
        self.columns = display_columns(self.schema.as_ref(), &self.entries);
    }

    fn field_at(&self, row: usize, position: usize) -> Result<FieldDescriptor, StoreError> {
        self.schema
            .as_ref()
            .and_then(|schema| schema.rows.get(row))
            .and_then(|group| group.fields.get(position))
            .cloned()
            .ok_or(StoreError::PositionNotFound { row, position })
    }
}
