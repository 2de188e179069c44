use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::domain::{DataEntry, EntryData, EntryId, FormSchema, Wrapper};

use super::{
    FormGateway, GatewayError,
    wire::{FormRecord, TagStyle, rows_to_wire, schema_from_rows},
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b']')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

#[derive(Debug, Clone)]
pub struct RestOptions {
    pub base_url: String,
    pub timeout: Duration,
    /// When set, only forms carrying this template tag are listed, and new
    /// forms are tagged with it.
    pub template: Option<String>,
}

impl Default for RestOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            template: None,
        }
    }
}

impl RestOptions {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct FormSummary {
    name: String,
    #[serde(default)]
    template: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenameRequest<'a> {
    new_name: &'a str,
    wrapper: &'static str,
}

/// Client for the form backend's HTTP API.
#[derive(Debug, Clone)]
pub struct RestGateway {
    http: Client,
    options: RestOptions,
}

impl RestGateway {
    pub fn new(options: RestOptions) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("formloom/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self { http, options })
    }

    pub fn options(&self) -> &RestOptions {
        &self.options
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.options.base_url.trim_end_matches('/').to_string();
        for segment in segments {
            url.push('/');
            url.extend(utf8_percent_encode(segment, SEGMENT));
        }
        url
    }

    fn entry_url(&self, form: &str, id: EntryId) -> String {
        self.url(&["forms", form, "entries", &id.to_string()])
    }

    fn record(&self, schema: &FormSchema) -> FormRecord {
        FormRecord {
            name: schema.name.clone(),
            template: self.options.template.clone(),
            fields: rows_to_wire(schema, TagStyle::Skin),
        }
    }

    async fn send(
        &self,
        request: RequestBuilder,
        not_found: impl FnOnce() -> GatewayError,
    ) -> Result<Response, GatewayError> {
        let res = request.send().await.map_err(map_reqwest_error)?;
        match res.status() {
            s if s.is_success() => Ok(res),
            StatusCode::NOT_FOUND => Err(not_found()),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                warn!(status, %body, "form backend rejected request");
                Err(GatewayError::Http { status, body })
            }
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        not_found: impl FnOnce() -> GatewayError,
    ) -> Result<T, GatewayError> {
        self.send(request, not_found)
            .await?
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Serde(e.to_string()))
    }

    async fn summaries(&self) -> Result<Vec<FormSummary>, GatewayError> {
        self.fetch(self.http.get(self.url(&["forms"])), || {
            GatewayError::Unavailable("form listing not found".to_string())
        })
        .await
    }
}

fn map_reqwest_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Transport(e.to_string())
    }
}

fn form_missing(name: &str) -> impl FnOnce() -> GatewayError + '_ {
    move || GatewayError::FormNotFound(name.to_string())
}

fn entry_missing(form: &str, id: EntryId) -> impl FnOnce() -> GatewayError + '_ {
    move || GatewayError::EntryNotFound {
        form: form.to_string(),
        id,
    }
}

#[async_trait]
impl FormGateway for RestGateway {
    async fn list_form_names(&self) -> Result<Vec<String>, GatewayError> {
        let template = self.options.template.as_deref();
        Ok(self
            .summaries()
            .await?
            .into_iter()
            .filter(|form| template.is_none() || form.template.as_deref() == template)
            .map(|form| form.name)
            .collect())
    }

    async fn list_all_form_names(&self) -> Result<Vec<String>, GatewayError> {
        Ok(self
            .summaries()
            .await?
            .into_iter()
            .map(|form| form.name)
            .collect())
    }

    async fn load_form(&self, name: &str) -> Result<FormSchema, GatewayError> {
        let record: FormRecord = self
            .fetch(self.http.get(self.url(&["forms", name])), form_missing(name))
            .await?;
        debug!(form = name, rows = record.fields.len(), "form fetched");
        Ok(schema_from_rows(name, record.fields, None))
    }

    async fn create_form(&self, name: &str) -> Result<(), GatewayError> {
        // POST /forms overwrites, so a taken name must be caught first.
        match self
            .send(self.http.get(self.url(&["forms", name])), form_missing(name))
            .await
        {
            Ok(_) => {
                warn!(form = name, "refusing to overwrite an existing form");
                return Err(GatewayError::FormExists(name.to_string()));
            }
            Err(GatewayError::FormNotFound(_)) => {}
            Err(err) => return Err(err),
        }
        let record = self.record(&FormSchema::new(name));
        let request = self.http.post(self.url(&["forms"])).json(&record);
        self.send(request, form_missing(name)).await?;
        Ok(())
    }

    async fn save_form(&self, schema: &FormSchema) -> Result<(), GatewayError> {
        let request = self
            .http
            .post(self.url(&["forms"]))
            .json(&self.record(schema));
        self.send(request, form_missing(&schema.name)).await?;
        Ok(())
    }

    async fn delete_form(&self, name: &str) -> Result<(), GatewayError> {
        let request = self.http.delete(self.url(&["forms", name]));
        self.send(request, form_missing(name)).await?;
        Ok(())
    }

    async fn rename_form(
        &self,
        old: &str,
        new: &str,
        wrapper: Wrapper,
    ) -> Result<(), GatewayError> {
        let body = RenameRequest {
            new_name: new,
            wrapper: TagStyle::Skin.tag(wrapper),
        };
        let request = self
            .http
            .put(self.url(&["forms", "rename", old]))
            .json(&body);
        self.send(request, form_missing(old)).await?;
        Ok(())
    }

    async fn list_entries(&self, form: &str) -> Result<Vec<DataEntry>, GatewayError> {
        self.fetch(
            self.http.get(self.url(&["forms", form, "entries"])),
            form_missing(form),
        )
        .await
    }

    async fn get_entry(&self, form: &str, id: EntryId) -> Result<DataEntry, GatewayError> {
        self.fetch(self.http.get(self.entry_url(form, id)), entry_missing(form, id))
            .await
    }

    async fn create_entry(&self, form: &str, data: &EntryData) -> Result<DataEntry, GatewayError> {
        let request = self
            .http
            .post(self.url(&["forms", form, "entries"]))
            .json(data);
        self.fetch(request, form_missing(form)).await
    }

    async fn update_entry(&self, form: &str, entry: &DataEntry) -> Result<(), GatewayError> {
        let request = self
            .http
            .put(self.entry_url(form, entry.id))
            .json(&entry.data);
        self.send(request, entry_missing(form, entry.id)).await?;
        Ok(())
    }

    async fn delete_entry(&self, form: &str, id: EntryId) -> Result<(), GatewayError> {
        let request = self.http.delete(self.entry_url(form, id));
        self.send(request, entry_missing(form, id)).await?;
        Ok(())
    }
}
