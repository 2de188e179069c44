//! Persistence seam between the editor and wherever forms and entries live.

mod error;
mod local;
mod memory;
mod rest;
pub mod wire;

use async_trait::async_trait;

use crate::domain::{DataEntry, EntryData, EntryId, FormSchema, Wrapper};

pub use error::GatewayError;
pub use local::LocalStorageGateway;
pub use memory::MemoryGateway;
pub use rest::{RestGateway, RestOptions};

/// Asynchronous, fallible store of form schemas and their data entries.
///
/// Deleting or renaming a form carries its entries and wrapper preference
/// along.
#[async_trait]
pub trait FormGateway: Send + Sync {
    async fn list_form_names(&self) -> Result<Vec<String>, GatewayError>;

    /// Every stored form name, ignoring any listing filter. New form names
    /// are picked against this set.
    async fn list_all_form_names(&self) -> Result<Vec<String>, GatewayError> {
        self.list_form_names().await
    }

    async fn load_form(&self, name: &str) -> Result<FormSchema, GatewayError>;

    /// Registers an empty form; fails with `FormExists` when taken.
    async fn create_form(&self, name: &str) -> Result<(), GatewayError>;

    /// Stores the rows of `schema`, creating the form when it is new.
    async fn save_form(&self, schema: &FormSchema) -> Result<(), GatewayError>;

    async fn delete_form(&self, name: &str) -> Result<(), GatewayError>;

    /// Moves `old` to `new` and records `wrapper` for it. With `old == new`
    /// only the wrapper changes.
    async fn rename_form(&self, old: &str, new: &str, wrapper: Wrapper)
    -> Result<(), GatewayError>;

    async fn list_entries(&self, form: &str) -> Result<Vec<DataEntry>, GatewayError>;

    async fn get_entry(&self, form: &str, id: EntryId) -> Result<DataEntry, GatewayError>;

    async fn create_entry(&self, form: &str, data: &EntryData) -> Result<DataEntry, GatewayError>;

    async fn update_entry(&self, form: &str, entry: &DataEntry) -> Result<(), GatewayError>;

    async fn delete_entry(&self, form: &str, id: EntryId) -> Result<(), GatewayError>;
}
