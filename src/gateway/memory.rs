use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::Mutex;

use crate::domain::{DataEntry, EntryData, EntryId, FormSchema, Wrapper};

use super::{FormGateway, GatewayError};

#[derive(Debug, Default)]
struct MemoryState {
    forms: IndexMap<String, FormSchema>,
    entries: IndexMap<String, Vec<DataEntry>>,
    fail_saves: bool,
    fail_entry_updates: bool,
}

impl MemoryState {
    fn entries_mut(&mut self, form: &str) -> Result<&mut Vec<DataEntry>, GatewayError> {
        if !self.forms.contains_key(form) {
            return Err(GatewayError::FormNotFound(form.to_string()));
        }
        Ok(self.entries.entry(form.to_string()).or_default())
    }
}

/// Gateway kept entirely in process. Clones share the same maps, so a test
/// can keep a handle for inspection and fault injection.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_form(&self, schema: FormSchema) {
        let mut state = self.state.lock().await;
        state.entries.entry(schema.name.clone()).or_default();
        state.forms.insert(schema.name.clone(), schema);
    }

    /// Stores `entry` verbatim, id included.
    pub async fn insert_entry(&self, form: &str, entry: DataEntry) {
        let mut state = self.state.lock().await;
        state.entries.entry(form.to_string()).or_default().push(entry);
    }

    pub async fn entries_of(&self, form: &str) -> Vec<DataEntry> {
        let state = self.state.lock().await;
        state.entries.get(form).cloned().unwrap_or_default()
    }

    pub async fn fail_saves(&self, fail: bool) {
        self.state.lock().await.fail_saves = fail;
    }

    pub async fn fail_entry_updates(&self, fail: bool) {
        self.state.lock().await.fail_entry_updates = fail;
    }
}

#[async_trait]
impl FormGateway for MemoryGateway {
    async fn list_form_names(&self) -> Result<Vec<String>, GatewayError> {
        let state = self.state.lock().await;
        Ok(state.forms.keys().cloned().collect())
    }

    async fn load_form(&self, name: &str) -> Result<FormSchema, GatewayError> {
        let state = self.state.lock().await;
        state
            .forms
            .get(name)
            .cloned()
            .ok_or_else(|| GatewayError::FormNotFound(name.to_string()))
    }

    async fn create_form(&self, name: &str) -> Result<(), GatewayError> {
        let mut state = self.state.lock().await;
        if state.forms.contains_key(name) {
            return Err(GatewayError::FormExists(name.to_string()));
        }
        state.forms.insert(name.to_string(), FormSchema::new(name));
        state.entries.insert(name.to_string(), Vec::new());
        Ok(())
    }

    async fn save_form(&self, schema: &FormSchema) -> Result<(), GatewayError> {
        let mut state = self.state.lock().await;
        if state.fail_saves {
            return Err(GatewayError::Unavailable("saves are failing".to_string()));
        }
        state.entries.entry(schema.name.clone()).or_default();
        state.forms.insert(schema.name.clone(), schema.clone());
        Ok(())
    }

    async fn delete_form(&self, name: &str) -> Result<(), GatewayError> {
        let mut state = self.state.lock().await;
        if state.forms.shift_remove(name).is_none() {
            return Err(GatewayError::FormNotFound(name.to_string()));
        }
        state.entries.shift_remove(name);
        Ok(())
    }

    async fn rename_form(
        &self,
        old: &str,
        new: &str,
        wrapper: Wrapper,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock().await;
        if old != new && state.forms.contains_key(new) {
            return Err(GatewayError::FormExists(new.to_string()));
        }
        let Some(index) = state.forms.get_index_of(old) else {
            return Err(GatewayError::FormNotFound(old.to_string()));
        };
        let Some((_, mut schema)) = state.forms.shift_remove_index(index) else {
            return Err(GatewayError::FormNotFound(old.to_string()));
        };
        schema.name = new.to_string();
        schema.apply_wrapper(wrapper);
        state.forms.shift_insert(index, new.to_string(), schema);
        if old != new {
            let entries = state.entries.shift_remove(old).unwrap_or_default();
            state.entries.insert(new.to_string(), entries);
        }
        Ok(())
    }

    async fn list_entries(&self, form: &str) -> Result<Vec<DataEntry>, GatewayError> {
        let mut state = self.state.lock().await;
        Ok(state.entries_mut(form)?.clone())
    }

    async fn get_entry(&self, form: &str, id: EntryId) -> Result<DataEntry, GatewayError> {
        let mut state = self.state.lock().await;
        state
            .entries_mut(form)?
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::EntryNotFound {
                form: form.to_string(),
                id,
            })
    }

    async fn create_entry(&self, form: &str, data: &EntryData) -> Result<DataEntry, GatewayError> {
        let mut state = self.state.lock().await;
        let entries = state.entries_mut(form)?;
        let next = entries.iter().map(|entry| entry.id.0).max().unwrap_or(0) + 1;
        let entry = DataEntry::new(EntryId(next), data.clone());
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn update_entry(&self, form: &str, entry: &DataEntry) -> Result<(), GatewayError> {
        let mut state = self.state.lock().await;
        if state.fail_entry_updates {
            return Err(GatewayError::Unavailable(format!(
                "cannot update entry {}",
                entry.id
            )));
        }
        let slot = state
            .entries_mut(form)?
            .iter_mut()
            .find(|existing| existing.id == entry.id)
            .ok_or_else(|| GatewayError::EntryNotFound {
                form: form.to_string(),
                id: entry.id,
            })?;
        *slot = entry.clone();
        Ok(())
    }

    async fn delete_entry(&self, form: &str, id: EntryId) -> Result<(), GatewayError> {
        let mut state = self.state.lock().await;
        let entries = state.entries_mut(form)?;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            return Err(GatewayError::EntryNotFound {
                form: form.to_string(),
                id,
            });
        }
        Ok(())
    }
}
