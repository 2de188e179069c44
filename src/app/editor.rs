use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    domain::{DataEntry, EntryId, FormSchema, Wrapper},
    form::{
        CommandOutcome, EditorState, FieldCommand, FieldPatch, FormStore, KeyRename,
        ValidationOutcome, apply_command, next_form_name, validate_schema,
    },
    gateway::{FormGateway, GatewayError},
};

use super::{
    error::EditorError,
    options::EditorOptions,
    status::{Notice, Notices},
    table::EntryTable,
};

/// Result of pushing a field key rename to the gateway. Entries that could
/// not be rewritten keep the new key in memory only.
#[derive(Debug, Clone, PartialEq)]
pub struct RenameReport {
    pub old_key: String,
    pub new_key: String,
    pub updated: Vec<EntryId>,
    pub failed: Vec<(EntryId, GatewayError)>,
}

impl RenameReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A structural command together with the backend follow-up of any key
/// renames it caused.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    pub outcome: CommandOutcome,
    pub renames: Vec<RenameReport>,
}

/// Editing session over one gateway: the open form, its entries and the
/// notices produced along the way. Operations take `&mut self`, so one
/// finishes before the next starts.
pub struct FormEditor<G> {
    gateway: G,
    store: FormStore,
    options: EditorOptions,
    notices: Notices,
    table: EntryTable,
}

impl<G: FormGateway> FormEditor<G> {
    pub fn new(gateway: G) -> Self {
        Self::with_options(gateway, EditorOptions::default())
    }

    pub fn with_options(gateway: G, options: EditorOptions) -> Self {
        let table = EntryTable::new(Vec::new(), options.page_size);
        Self {
            gateway,
            store: FormStore::new(),
            options,
            notices: Notices::new(),
            table,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn store(&self) -> &FormStore {
        &self.store
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn state(&self) -> EditorState {
        self.store.state()
    }

    pub fn schema(&self) -> Option<&FormSchema> {
        self.store.schema()
    }

    pub fn table(&self) -> &EntryTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut EntryTable {
        &mut self.table
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    fn open_name(&self) -> Result<String, EditorError> {
        self.store
            .name()
            .map(str::to_string)
            .ok_or(EditorError::NoFormOpen)
    }

    fn sync_table(&mut self) {
        self.table.set_entries(self.store.entries().to_vec());
    }

    pub async fn list_forms(&self) -> Result<Vec<String>, EditorError> {
        Ok(self.gateway.list_form_names().await?)
    }

    /// Loads `name` into the store and fetches its entries. A failure to
    /// fetch entries leaves the form open with an empty table.
    pub async fn open(&mut self, name: &str) -> Result<(), EditorError> {
        let schema = match self.gateway.load_form(name).await {
            Ok(schema) => schema,
            Err(err) => {
                error!(form = name, %err, "failed to load form");
                self.notices.error(format!("Failed to load form {name}"));
                return Err(err.into());
            }
        };
        if let Err(err) = validate_schema(&schema) {
            error!(form = name, %err, "stored form is inconsistent");
            self.notices.error(format!("Failed to load form {name}"));
            return Err(err.into());
        }
        self.store.load(schema);
        self.table = EntryTable::new(Vec::new(), self.options.page_size);
        if let Err(err) = self.refresh_entries().await {
            warn!(form = name, %err, "entries unavailable");
        }
        info!(form = name, "form opened");
        Ok(())
    }

    pub fn close(&mut self) {
        self.store.close();
        self.table = EntryTable::new(Vec::new(), self.options.page_size);
    }

    /// Creates and opens `Form<n>` for the smallest free `n`.
    pub async fn create_form(&mut self) -> Result<String, EditorError> {
        let names = self.gateway.list_all_form_names().await?;
        let name = next_form_name(names.iter().map(String::as_str));
        if let Err(err) = self.gateway.create_form(&name).await {
            error!(form = %name, %err, "failed to create form");
            self.notices.error("Failed to create form!");
            return Err(err.into());
        }
        let wrapper = self.options.default_wrapper;
        if wrapper != Wrapper::default() {
            self.gateway.rename_form(&name, &name, wrapper).await?;
        }
        self.notices.form_created();
        self.open(&name).await?;
        Ok(name)
    }

    /// Persists the open schema. The form stays dirty when the gateway
    /// refuses it.
    pub async fn save(&mut self) -> Result<(), EditorError> {
        let schema = self.store.schema().cloned().ok_or(EditorError::NoFormOpen)?;
        if let Err(err) = self.gateway.save_form(&schema).await {
            error!(form = %schema.name, %err, "failed to save form");
            self.notices.save_failed();
            return Err(err.into());
        }
        self.store.mark_saved();
        self.notices.form_saved();
        info!(form = %schema.name, fields = schema.field_count(), "form saved");
        if self.options.reload_after_save {
            self.open(&schema.name).await?;
        }
        Ok(())
    }

    pub async fn rename_form(
        &mut self,
        old: &str,
        new: &str,
        wrapper: Wrapper,
    ) -> Result<(), EditorError> {
        let old = old.trim();
        let new = new.trim();
        if new.is_empty() {
            self.notices.error("Form name is missing!");
            return Err(EditorError::EmptyFormName);
        }
        let names = self.gateway.list_all_form_names().await?;
        if new != old && names.iter().any(|name| name == new) {
            self.notices.error("A form with this name already exists!");
            return Err(EditorError::DuplicateFormName(new.to_string()));
        }
        if let Err(err) = self.gateway.rename_form(old, new, wrapper).await {
            error!(old, new, %err, "failed to rename form");
            self.notices.form_update_failed();
            return Err(err.into());
        }
        self.notices.form_updated();
        info!(old, new, %wrapper, "form renamed");
        if self.store.name() == Some(old) {
            self.open(new).await?;
        }
        Ok(())
    }

    pub async fn delete_form(&mut self, name: &str) -> Result<(), EditorError> {
        let name = name.trim();
        if name.is_empty() {
            self.notices.error("Form name is missing!");
            return Err(EditorError::EmptyFormName);
        }
        if let Err(err) = self.gateway.delete_form(name).await {
            error!(form = name, %err, "failed to delete form");
            self.notices.error("Failed to delete form!");
            return Err(err.into());
        }
        if self.store.name() == Some(name) {
            self.close();
        }
        self.notices.form_deleted();
        info!(form = name, "form deleted");
        Ok(())
    }

    /// Rewrites every field's wrapper and records the choice right away,
    /// independently of saving.
    pub async fn change_wrapper(&mut self, wrapper: Wrapper) -> Result<(), EditorError> {
        let name = self.open_name()?;
        self.store.change_wrapper(wrapper)?;
        if let Err(err) = self.gateway.rename_form(&name, &name, wrapper).await {
            error!(form = %name, %err, "failed to store wrapper");
            self.notices.form_update_failed();
            return Err(err.into());
        }
        self.notices.form_updated();
        Ok(())
    }

    /// Re-reads the entries of the open form, deleting id-only ones on the
    /// way when configured to.
    pub async fn refresh_entries(&mut self) -> Result<(), EditorError> {
        let form = self.open_name()?;
        let entries = match self.gateway.list_entries(&form).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(form = %form, %err, "failed to fetch entries");
                self.store.set_entries(Vec::new());
                self.sync_table();
                return Err(err.into());
            }
        };
        let purge = self.options.purge_empty_entries;
        let (empty, kept): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|entry| purge && entry.is_empty());
        for entry in &empty {
            match self.gateway.delete_entry(&form, entry.id).await {
                Ok(()) => debug!(form = %form, entry = %entry.id, "purged empty entry"),
                Err(err) => warn!(form = %form, entry = %entry.id, %err, "failed to purge entry"),
            }
        }
        self.store.set_entries(kept);
        self.sync_table();
        Ok(())
    }

    pub fn set_value(&mut self, key: &str, value: Value) {
        self.store.set_value(key, value);
    }

    // Data entry is only allowed on an open form without unsaved changes.
    fn ensure_entry_ready(&mut self) -> Result<String, EditorError> {
        match self.store.state() {
            EditorState::Unopened => Err(EditorError::NoFormOpen),
            EditorState::Dirty => {
                self.notices.unsaved_changes();
                Err(EditorError::UnsavedChanges)
            }
            EditorState::Clean => self.open_name(),
        }
    }

    /// Validates the edit buffer and stores it as a new entry.
    pub async fn submit_entry(&mut self) -> Result<DataEntry, EditorError> {
        if self.store.state() == EditorState::Unopened {
            return Err(EditorError::NoFormOpen);
        }
        match self.store.validate() {
            ValidationOutcome::Valid(_) => {}
            ValidationOutcome::BuildError { message } => {
                self.notices.error(message.clone());
                return Err(EditorError::Validator(message));
            }
            outcome @ ValidationOutcome::Invalid { .. } => {
                let issues = outcome.issue_count();
                self.notices.issues_remaining(issues);
                return Err(EditorError::Invalid { issues, outcome });
            }
        }
        let form = self.ensure_entry_ready()?;
        if self
            .store
            .schema()
            .is_none_or(|schema| schema.field_count() == 0)
        {
            return Err(EditorError::EmptyForm);
        }

        let data = self.store.model().clone();
        let entry = match self.gateway.create_entry(&form, &data).await {
            Ok(entry) => entry,
            Err(err) => {
                error!(form = %form, %err, "failed to submit entry");
                self.notices.error("Failed to submit entry!");
                return Err(err.into());
            }
        };
        info!(form = %form, entry = %entry.id, "entry submitted");
        self.store.reset_model();
        self.notices.entry_submitted();
        self.refresh_entries().await?;
        Ok(entry)
    }

    /// Loads a stored entry into the edit buffer.
    pub async fn begin_edit_entry(&mut self, id: EntryId) -> Result<(), EditorError> {
        let form = self.open_name()?;
        let entry = match self.gateway.get_entry(&form, id).await {
            Ok(entry) => entry,
            Err(err) => {
                error!(form = %form, entry = %id, %err, "failed to load entry");
                self.notices.error("Failed to load entry!");
                return Err(err.into());
            }
        };
        self.store.begin_entry_edit(&entry);
        Ok(())
    }

    /// Writes the edit buffer back over the entry being edited.
    pub async fn update_entry(&mut self) -> Result<(), EditorError> {
        let form = self.ensure_entry_ready()?;
        let id = self.store.editing().ok_or(EditorError::NotEditing)?;
        let entry = DataEntry::new(id, self.store.model().clone());
        if let Err(err) = self.gateway.update_entry(&form, &entry).await {
            error!(form = %form, entry = %id, %err, "failed to update entry");
            self.notices.error("Failed to update entry!");
            return Err(err.into());
        }
        info!(form = %form, entry = %id, "entry updated");
        self.store.reset_model();
        self.notices.entry_updated();
        self.refresh_entries().await
    }

    pub fn cancel_edit(&mut self) {
        self.store.reset_model();
    }

    pub async fn delete_entry(&mut self, id: EntryId) -> Result<(), EditorError> {
        let form = self.open_name()?;
        if let Err(err) = self.gateway.delete_entry(&form, id).await {
            error!(form = %form, entry = %id, %err, "failed to delete entry");
            self.notices.error("Failed to delete entry!");
            return Err(err.into());
        }
        if self.store.editing() == Some(id) {
            self.store.reset_model();
        }
        self.notices.entry_deleted();
        self.refresh_entries().await
    }

    /// Edits one field; a key change is pushed to every stored entry that
    /// carried the old key.
    pub async fn edit_field(
        &mut self,
        index: usize,
        patch: FieldPatch,
    ) -> Result<Option<RenameReport>, EditorError> {
        let dispatched = self
            .dispatch(FieldCommand::EditField { index, patch })
            .await?;
        Ok(dispatched.renames.into_iter().next())
    }

    /// Applies a structural command to the open form.
    pub async fn dispatch(&mut self, command: FieldCommand) -> Result<Dispatched, EditorError> {
        let outcome = match apply_command(&mut self.store, command) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.notices.error(err.to_string());
                return Err(err.into());
            }
        };
        let pending: Vec<KeyRename> = outcome.renames().cloned().collect();
        let mut renames = Vec::with_capacity(pending.len());
        for rename in pending {
            renames.push(self.propagate_rename(rename).await);
        }
        if !renames.is_empty() {
            self.sync_table();
        }
        Ok(Dispatched { outcome, renames })
    }

    // Fan-out of one key rename: every affected entry is re-submitted
    // concurrently; failures are reported, never rolled back.
    async fn propagate_rename(&mut self, rename: KeyRename) -> RenameReport {
        let mut report = RenameReport {
            old_key: rename.old_key,
            new_key: rename.new_key,
            updated: Vec::new(),
            failed: Vec::new(),
        };
        let Some(form) = self.store.name() else {
            return report;
        };
        let entries: Vec<&DataEntry> = rename
            .affected
            .iter()
            .filter_map(|id| self.store.entry(*id))
            .collect();
        let gateway = &self.gateway;
        let results = join_all(entries.into_iter().map(|entry| async move {
            (entry.id, gateway.update_entry(form, entry).await)
        }))
        .await;

        for (id, result) in results {
            match result {
                Ok(()) => report.updated.push(id),
                Err(err) => {
                    warn!(form, entry = %id, key = %report.new_key, %err, "entry kept old key in storage");
                    report.failed.push((id, err));
                }
            }
        }
        if !report.is_complete() {
            self.notices.error(format!(
                "Renamed {} to {}, but {} entries could not be updated",
                report.old_key,
                report.new_key,
                report.failed.len()
            ));
        }
        report
    }
}
