use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::FormSchema;

use super::DocumentFormat;

/// Where an exported form is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    Stdout,
    File(PathBuf),
    /// `<dir>/<form name>.<ext>`, the directory created on demand.
    Directory(PathBuf),
}

impl ExportTarget {
    pub fn file(path: impl AsRef<Path>) -> Self {
        ExportTarget::File(path.as_ref().to_path_buf())
    }

    pub fn directory(path: impl AsRef<Path>) -> Self {
        ExportTarget::Directory(path.as_ref().to_path_buf())
    }

    /// Format implied by a target file's extension.
    pub fn implied_format(&self) -> Option<DocumentFormat> {
        match self {
            ExportTarget::File(path) => DocumentFormat::from_extension(path),
            ExportTarget::Stdout | ExportTarget::Directory(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub format: DocumentFormat,
    pub pretty: bool,
    pub targets: Vec<ExportTarget>,
}

impl ExportOptions {
    pub fn new(format: DocumentFormat) -> Self {
        Self {
            format,
            pretty: true,
            targets: vec![ExportTarget::Stdout],
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_targets(mut self, targets: Vec<ExportTarget>) -> Self {
        self.targets = targets;
        self
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::new(DocumentFormat::Json)
    }
}

/// Writes `schema` to every target and returns the files created.
pub fn export_form(schema: &FormSchema, options: &ExportOptions) -> Result<Vec<PathBuf>> {
    if options.targets.is_empty() {
        return Ok(Vec::new());
    }
    let document = render(schema, options.format, options.pretty)
        .with_context(|| format!("failed to serialize form {}", schema.name))?;
    let mut written = Vec::new();
    for target in &options.targets {
        match target {
            ExportTarget::Stdout => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{document}")
                    .and_then(|()| stdout.flush())
                    .context("failed to write to stdout")?;
            }
            ExportTarget::File(path) => {
                write_document(path, &document)?;
                written.push(path.clone());
            }
            ExportTarget::Directory(dir) => {
                fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
                let path = dir.join(file_name(&schema.name, options.format));
                write_document(&path, &document)?;
                written.push(path);
            }
        }
    }
    Ok(written)
}

/// Serializes any export payload in `format`.
pub fn render<T: Serialize>(value: &T, format: DocumentFormat, pretty: bool) -> Result<String> {
    let text = match format {
        DocumentFormat::Json if pretty => serde_json::to_string_pretty(value)?,
        DocumentFormat::Json => serde_json::to_string(value)?,
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => serde_yaml::to_string(value)?,
        #[cfg(feature = "toml")]
        DocumentFormat::Toml if pretty => toml::to_string_pretty(value)?,
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => toml::to_string(value)?,
    };
    Ok(text)
}

// Form names may hold path separators.
fn file_name(form: &str, format: DocumentFormat) -> String {
    let stem: String = form
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("{}.{}", stem.trim(), format.extension())
}

fn write_document(path: &Path, document: &str) -> Result<()> {
    fs::write(path, format!("{document}\n"))
        .with_context(|| format!("failed to write to file {}", path.display()))
}
