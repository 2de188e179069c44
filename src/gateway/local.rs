use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Serialize, de::DeserializeOwned};
use tokio::{fs, sync::Mutex};
use tracing::debug;

use crate::domain::{DataEntry, EntryData, EntryId, FormSchema, Wrapper};

use super::{
    FormGateway, GatewayError,
    wire::{LocalEntry, StoredRow, TagStyle, rows_to_wire, schema_from_rows},
};

pub const FORMS_KEY: &str = "savedForms";
pub const ENTRIES_KEY: &str = "savedFormEntries";
const WRAPPER_PREFIX: &str = "wrapper_";

/// Flat string-to-string map, shaped like a browser's local storage.
type Storage = IndexMap<String, String>;
type FormTable = IndexMap<String, Vec<StoredRow>>;
type EntryTable = IndexMap<String, Vec<LocalEntry>>;

fn wrapper_key(form: &str) -> String {
    format!("{WRAPPER_PREFIX}{form}")
}

/// Gateway backed by a JSON file holding a local-storage dump: `savedForms`
/// and `savedFormEntries` carry JSON text, `wrapper_<form>` a wrapper tag.
#[derive(Debug)]
pub struct LocalStorageGateway {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LocalStorageGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Storage, GatewayError> {
        match fs::read_to_string(&self.path).await {
            Ok(text) if text.trim().is_empty() => Ok(Storage::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Storage::new()),
            Err(err) => Err(err.into()),
        }
    }

    // Written to a sibling `.tmp` file, then renamed over the target.
    async fn write(&self, storage: &Storage) -> Result<(), GatewayError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);
        let text = serde_json::to_string_pretty(storage)?;
        fs::write(&staging, text).await?;
        fs::rename(&staging, &self.path).await?;
        debug!(path = %self.path.display(), "local storage written");
        Ok(())
    }
}

fn decode<T: DeserializeOwned + Default>(storage: &Storage, key: &str) -> Result<T, GatewayError> {
    match storage.get(key) {
        Some(text) if !text.trim().is_empty() => Ok(serde_json::from_str(text)?),
        _ => Ok(T::default()),
    }
}

fn encode<T: Serialize>(storage: &mut Storage, key: &str, value: &T) -> Result<(), GatewayError> {
    storage.insert(key.to_string(), serde_json::to_string(value)?);
    Ok(())
}

fn form_entries<'a>(
    entries: &'a mut EntryTable,
    forms: &FormTable,
    form: &str,
) -> Result<&'a mut Vec<LocalEntry>, GatewayError> {
    if !forms.contains_key(form) {
        return Err(GatewayError::FormNotFound(form.to_string()));
    }
    Ok(entries.entry(form.to_string()).or_default())
}

#[async_trait]
impl FormGateway for LocalStorageGateway {
    async fn list_form_names(&self) -> Result<Vec<String>, GatewayError> {
        let _guard = self.lock.lock().await;
        let storage = self.read().await?;
        let forms: FormTable = decode(&storage, FORMS_KEY)?;
        Ok(forms.into_keys().collect())
    }

    async fn load_form(&self, name: &str) -> Result<FormSchema, GatewayError> {
        let _guard = self.lock.lock().await;
        let storage = self.read().await?;
        let mut forms: FormTable = decode(&storage, FORMS_KEY)?;
        let rows = forms
            .shift_remove(name)
            .ok_or_else(|| GatewayError::FormNotFound(name.to_string()))?;
        let preference = storage
            .get(&wrapper_key(name))
            .and_then(|tag| Wrapper::from_tag(tag));
        Ok(schema_from_rows(name, rows, preference))
    }

    async fn create_form(&self, name: &str) -> Result<(), GatewayError> {
        let _guard = self.lock.lock().await;
        let mut storage = self.read().await?;
        let mut forms: FormTable = decode(&storage, FORMS_KEY)?;
        if forms.contains_key(name) {
            return Err(GatewayError::FormExists(name.to_string()));
        }
        let mut entries: EntryTable = decode(&storage, ENTRIES_KEY)?;
        forms.insert(name.to_string(), Vec::new());
        entries.insert(name.to_string(), Vec::new());
        encode(&mut storage, FORMS_KEY, &forms)?;
        encode(&mut storage, ENTRIES_KEY, &entries)?;
        self.write(&storage).await
    }

    async fn save_form(&self, schema: &FormSchema) -> Result<(), GatewayError> {
        let _guard = self.lock.lock().await;
        let mut storage = self.read().await?;
        let mut forms: FormTable = decode(&storage, FORMS_KEY)?;
        forms.insert(schema.name.clone(), rows_to_wire(schema, TagStyle::Plain));
        encode(&mut storage, FORMS_KEY, &forms)?;
        storage.insert(wrapper_key(&schema.name), schema.wrapper.tag().to_string());
        self.write(&storage).await
    }

    async fn delete_form(&self, name: &str) -> Result<(), GatewayError> {
        let _guard = self.lock.lock().await;
        let mut storage = self.read().await?;
        let mut forms: FormTable = decode(&storage, FORMS_KEY)?;
        if forms.shift_remove(name).is_none() {
            return Err(GatewayError::FormNotFound(name.to_string()));
        }
        let mut entries: EntryTable = decode(&storage, ENTRIES_KEY)?;
        entries.shift_remove(name);
        encode(&mut storage, FORMS_KEY, &forms)?;
        encode(&mut storage, ENTRIES_KEY, &entries)?;
        storage.shift_remove(&wrapper_key(name));
        self.write(&storage).await
    }

    async fn rename_form(
        &self,
        old: &str,
        new: &str,
        wrapper: Wrapper,
    ) -> Result<(), GatewayError> {
        let _guard = self.lock.lock().await;
        let mut storage = self.read().await?;
        let mut forms: FormTable = decode(&storage, FORMS_KEY)?;
        if old != new && forms.contains_key(new) {
            return Err(GatewayError::FormExists(new.to_string()));
        }
        let Some(index) = forms.get_index_of(old) else {
            return Err(GatewayError::FormNotFound(old.to_string()));
        };
        let renamed = schema_from_rows(new, forms[index].clone(), Some(wrapper));
        let rows = rows_to_wire(&renamed, TagStyle::Plain);
        if old != new {
            forms.shift_remove_index(index);
            forms.shift_insert(index, new.to_string(), rows);
            let mut entries: EntryTable = decode(&storage, ENTRIES_KEY)?;
            let moved = entries.shift_remove(old).unwrap_or_default();
            entries.insert(new.to_string(), moved);
            encode(&mut storage, ENTRIES_KEY, &entries)?;
            storage.shift_remove(&wrapper_key(old));
        } else {
            forms[index] = rows;
        }
        encode(&mut storage, FORMS_KEY, &forms)?;
        storage.insert(wrapper_key(new), wrapper.tag().to_string());
        self.write(&storage).await
    }

    async fn list_entries(&self, form: &str) -> Result<Vec<DataEntry>, GatewayError> {
        let _guard = self.lock.lock().await;
        let storage = self.read().await?;
        let forms: FormTable = decode(&storage, FORMS_KEY)?;
        let mut entries: EntryTable = decode(&storage, ENTRIES_KEY)?;
        let stored = form_entries(&mut entries, &forms, form)?;
        Ok(stored.drain(..).map(DataEntry::from).collect())
    }

    async fn get_entry(&self, form: &str, id: EntryId) -> Result<DataEntry, GatewayError> {
        self.list_entries(form)
            .await?
            .into_iter()
            .find(|entry| entry.id == id)
            .ok_or_else(|| GatewayError::EntryNotFound {
                form: form.to_string(),
                id,
            })
    }

    async fn create_entry(&self, form: &str, data: &EntryData) -> Result<DataEntry, GatewayError> {
        let _guard = self.lock.lock().await;
        let mut storage = self.read().await?;
        let forms: FormTable = decode(&storage, FORMS_KEY)?;
        let mut entries: EntryTable = decode(&storage, ENTRIES_KEY)?;
        let stored = form_entries(&mut entries, &forms, form)?;
        let next = stored.iter().map(|entry| entry.id.0).max().unwrap_or(0) + 1;
        let entry = DataEntry::new(EntryId(next), data.clone());
        stored.push(LocalEntry::from(&entry));
        encode(&mut storage, ENTRIES_KEY, &entries)?;
        self.write(&storage).await?;
        Ok(entry)
    }

    async fn update_entry(&self, form: &str, entry: &DataEntry) -> Result<(), GatewayError> {
        let _guard = self.lock.lock().await;
        let mut storage = self.read().await?;
        let forms: FormTable = decode(&storage, FORMS_KEY)?;
        let mut entries: EntryTable = decode(&storage, ENTRIES_KEY)?;
        let slot = form_entries(&mut entries, &forms, form)?
            .iter_mut()
            .find(|existing| existing.id == entry.id)
            .ok_or_else(|| GatewayError::EntryNotFound {
                form: form.to_string(),
                id: entry.id,
            })?;
        *slot = LocalEntry::from(entry);
        encode(&mut storage, ENTRIES_KEY, &entries)?;
        self.write(&storage).await
    }

    async fn delete_entry(&self, form: &str, id: EntryId) -> Result<(), GatewayError> {
        let _guard = self.lock.lock().await;
        let mut storage = self.read().await?;
        let forms: FormTable = decode(&storage, FORMS_KEY)?;
        let mut entries: EntryTable = decode(&storage, ENTRIES_KEY)?;
        let stored = form_entries(&mut entries, &forms, form)?;
        let before = stored.len();
        stored.retain(|entry| entry.id != id);
        if stored.len() == before {
            return Err(GatewayError::EntryNotFound {
                form: form.to_string(),
                id,
            });
        }
        encode(&mut storage, ENTRIES_KEY, &entries)?;
        self.write(&storage).await
    }
}
