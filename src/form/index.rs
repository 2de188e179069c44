use std::collections::HashSet;

use crate::domain::{FieldGroup, FormSchema};

use super::error::StoreError;

/// Renumbers every field in row-major order and returns the field count.
/// After this, indices are exactly `0..count`.
pub fn reindex(rows: &mut [FieldGroup]) -> usize {
    let mut next = 0;
    for row in rows.iter_mut() {
        for field in &mut row.fields {
            field.display_index = next;
            next += 1;
        }
    }
    next
}

/// Checks a schema that arrived from outside the store: keys are non-empty
/// and unique, rows hold at most [`FieldGroup::CAPACITY`] fields, and
/// select or radio fields carry options.
pub fn validate_schema(schema: &FormSchema) -> Result<(), StoreError> {
    let mut seen = HashSet::new();
    for (row, group) in schema.rows.iter().enumerate() {
        if group.fields.len() > FieldGroup::CAPACITY {
            return Err(StoreError::RowOverflow {
                row,
                count: group.fields.len(),
                capacity: FieldGroup::CAPACITY,
            });
        }
        for field in &group.fields {
            let key = field.key.trim();
            if key.is_empty() {
                return Err(StoreError::EmptyKey);
            }
            if !seen.insert(key) {
                return Err(StoreError::DuplicateKey {
                    key: key.to_string(),
                });
            }
            if field.kind.requires_options() && field.options.is_empty() {
                return Err(StoreError::MissingOptions {
                    key: key.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Resolves a display index to `(row, position)` by walking the rows, so a
/// stale index simply resolves to nothing.
pub fn locate(rows: &[FieldGroup], index: usize) -> Option<(usize, usize)> {
    let mut remaining = index;
    for (row_index, row) in rows.iter().enumerate() {
        if remaining < row.fields.len() {
            return Some((row_index, remaining));
        }
        remaining -= row.fields.len();
    }
    None
}

/// Inverse of [`locate`].
pub fn global_index(rows: &[FieldGroup], row: usize, position: usize) -> Option<usize> {
    let target = rows.get(row)?;
    if position >= target.fields.len() {
        return None;
    }
    let before: usize = rows[..row].iter().map(|group| group.fields.len()).sum();
    Some(before + position)
}
