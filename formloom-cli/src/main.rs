use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthStr;

use formloom::{
    DocumentFormat, EditorOptions, EntryId, ExportOptions, ExportTarget, FieldCommand, FieldKind,
    FieldPatch, FormEditor, FormGateway, LocalStorageGateway, Notice, RenameReport, RestGateway,
    RestOptions, Wrapper,
    app::SortOrder,
    export_form, schema_document, schema_from_document,
};

const DEFAULT_STORE: &str = "formloom.json";

#[derive(Debug, Parser)]
#[command(
    name = "formloom",
    version,
    about = "Build forms and manage the data entered through them"
)]
struct Cli {
    /// Local-storage file holding forms and entries
    #[arg(long = "store", env = "FORMLOOM_STORE", value_name = "PATH", global = true)]
    store: Option<PathBuf>,

    /// Base URL of a form backend; takes precedence over --store
    #[arg(long = "api", env = "FORMLOOM_API", value_name = "URL", global = true)]
    api: Option<String>,

    /// Backend request timeout in seconds
    #[arg(long = "timeout", value_name = "SECS", default_value_t = 30, global = true)]
    timeout: u64,

    /// Only list backend forms carrying this template tag
    #[arg(long = "template", value_name = "TAG", global = true)]
    template: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List saved forms
    List,
    /// Create a new empty form named Form<n>
    New,
    /// Print the rows and fields of a form
    Show { form: String },
    /// Add a field, in a new row unless --row is given
    AddField {
        form: String,
        kind: FieldKind,
        #[arg(long)]
        row: Option<usize>,
    },
    /// Append an empty divider row
    AddDivider { form: String },
    /// Change the attributes of the field at a display index
    EditField {
        form: String,
        index: usize,
        #[command(flatten)]
        patch: PatchArgs,
    },
    /// Delete the field at a row and position
    DeleteField {
        form: String,
        row: usize,
        position: usize,
    },
    /// Move a field within or between rows
    MoveField {
        form: String,
        from_row: usize,
        from_position: usize,
        to_row: usize,
        to_position: usize,
    },
    /// Rename a form, optionally changing its wrapper
    Rename {
        old: String,
        new: String,
        #[arg(long)]
        wrapper: Option<Wrapper>,
    },
    /// Change the field wrapper of a form
    Wrapper { form: String, wrapper: Wrapper },
    /// Delete a form and its entries
    Delete { form: String },
    /// Print the entries of a form
    Entries {
        form: String,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        desc: bool,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Submit a new entry from key=value pairs
    Submit {
        form: String,
        #[arg(value_name = "KEY=VALUE")]
        values: Vec<String>,
    },
    /// Overwrite an entry with key=value pairs
    Update {
        form: String,
        id: EntryId,
        #[arg(value_name = "KEY=VALUE")]
        values: Vec<String>,
    },
    /// Delete an entry
    DeleteEntry { form: String, id: EntryId },
    /// Export a form document
    Export {
        form: String,
        #[arg(long)]
        format: Option<DocumentFormat>,
        /// Output file or directory ("-" writes to stdout)
        #[arg(short = 'o', long = "output", value_name = "DEST")]
        output: Option<String>,
    },
    /// Import a form document, replacing a form of the same name
    Import {
        file: PathBuf,
        #[arg(long)]
        format: Option<DocumentFormat>,
        /// Store the form under this name instead
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the JSON Schema of exported form documents
    SchemaDoc,
}

#[derive(Debug, Args)]
struct PatchArgs {
    #[arg(long)]
    key: Option<String>,
    #[arg(long)]
    label: Option<String>,
    #[arg(long)]
    placeholder: Option<String>,
    #[arg(long = "class")]
    css_class: Option<String>,
    #[arg(long = "label-class")]
    label_css_class: Option<String>,
    #[arg(long = "column-class")]
    column_class: Option<String>,
    #[arg(long, conflicts_with = "optional")]
    required: bool,
    #[arg(long)]
    optional: bool,
    /// Comma separated options
    #[arg(long)]
    options: Option<String>,
    /// Input style entry, NAME=VALUE
    #[arg(long = "style", value_name = "NAME=VALUE")]
    style: Vec<String>,
    /// Label style entry, NAME=VALUE
    #[arg(long = "label-style", value_name = "NAME=VALUE")]
    label_style: Vec<String>,
}

impl PatchArgs {
    fn into_patch(self) -> Result<FieldPatch> {
        let mut patch = FieldPatch::new();
        patch.key = self.key;
        patch.label = self.label;
        patch.placeholder = self.placeholder;
        patch.css_class = self.css_class;
        patch.label_css_class = self.label_css_class;
        patch.column_class = self.column_class;
        if self.required {
            patch.required = Some(true);
        } else if self.optional {
            patch.required = Some(false);
        }
        if let Some(options) = &self.options {
            patch = patch.with_options_text(options);
        }
        for raw in &self.style {
            let (name, value) = split_pair(raw)?;
            patch = patch.with_style(name, value);
        }
        for raw in &self.label_style {
            let (name, value) = split_pair(raw)?;
            patch = patch.with_label_style(name, value);
        }
        Ok(patch)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.api.clone() {
        Some(base_url) => {
            let mut options = RestOptions::default()
                .with_base_url(base_url)
                .with_timeout(Duration::from_secs(cli.timeout));
            if let Some(template) = &cli.template {
                options = options.with_template(template.clone());
            }
            let gateway = RestGateway::new(options).wrap_err("failed to build HTTP client")?;
            run(FormEditor::with_options(gateway, EditorOptions::default()), cli.command).await
        }
        None => {
            let path = cli.store.unwrap_or_else(|| PathBuf::from(DEFAULT_STORE));
            debug!(path = %path.display(), "using local storage");
            let gateway = LocalStorageGateway::new(path);
            run(FormEditor::with_options(gateway, EditorOptions::default()), cli.command).await
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run<G: FormGateway>(mut editor: FormEditor<G>, command: Command) -> Result<()> {
    let result = execute(&mut editor, command).await;
    print_notices(editor.drain_notices());
    result
}

async fn execute<G: FormGateway>(editor: &mut FormEditor<G>, command: Command) -> Result<()> {
    match command {
        Command::List => {
            for name in editor.list_forms().await? {
                println!("{name}");
            }
        }
        Command::New => {
            let name = editor.create_form().await?;
            println!("{name}");
        }
        Command::Show { form } => {
            editor.open(&form).await?;
            print_schema(editor);
        }
        Command::AddField { form, kind, row } => {
            editor.open(&form).await?;
            let dispatched = editor.dispatch(FieldCommand::AddField { kind, row }).await?;
            editor.save().await?;
            if let formloom::form::CommandOutcome::Added(field) = dispatched.outcome {
                println!("{}", field.key);
            }
        }
        Command::AddDivider { form } => {
            editor.open(&form).await?;
            editor.dispatch(FieldCommand::AddDivider).await?;
            editor.save().await?;
        }
        Command::EditField { form, index, patch } => {
            editor.open(&form).await?;
            let report = editor.edit_field(index, patch.into_patch()?).await?;
            editor.save().await?;
            if let Some(report) = report {
                print_rename(&report);
            }
        }
        Command::DeleteField {
            form,
            row,
            position,
        } => {
            editor.open(&form).await?;
            let dispatched = editor
                .dispatch(FieldCommand::DeleteField { row, position })
                .await?;
            if dispatched.outcome == formloom::form::CommandOutcome::Ignored {
                return Err(eyre!("no field at row {row}, position {position}"));
            }
            editor.save().await?;
        }
        Command::MoveField {
            form,
            from_row,
            from_position,
            to_row,
            to_position,
        } => {
            editor.open(&form).await?;
            editor
                .dispatch(FieldCommand::MoveField {
                    from_row,
                    from_position,
                    to_row,
                    to_position,
                })
                .await?;
            editor.save().await?;
        }
        Command::Rename { old, new, wrapper } => {
            let wrapper = match wrapper {
                Some(wrapper) => wrapper,
                None => {
                    editor.open(&old).await?;
                    editor.schema().map(|schema| schema.wrapper).unwrap_or_default()
                }
            };
            editor.rename_form(&old, &new, wrapper).await?;
        }
        Command::Wrapper { form, wrapper } => {
            editor.open(&form).await?;
            editor.change_wrapper(wrapper).await?;
        }
        Command::Delete { form } => {
            editor.delete_form(&form).await?;
        }
        Command::Entries {
            form,
            search,
            sort,
            desc,
            page,
            page_size,
        } => {
            editor.open(&form).await?;
            let table = editor.table_mut();
            if let Some(size) = page_size {
                table.set_page_size(size);
            }
            if let Some(term) = &search {
                table.search(term);
            }
            if let Some(column) = sort {
                let order = if desc {
                    SortOrder::Descending
                } else {
                    SortOrder::Ascending
                };
                table.sort_by(column, order);
            }
            table.set_page(page);
            print_entries(editor);
        }
        Command::Submit { form, values } => {
            editor.open(&form).await?;
            for raw in &values {
                let (key, value) = parse_assignment(raw)?;
                editor.set_value(key, value);
            }
            let entry = editor.submit_entry().await?;
            println!("{}", entry.id);
        }
        Command::Update { form, id, values } => {
            editor.open(&form).await?;
            editor.begin_edit_entry(id).await?;
            for raw in &values {
                let (key, value) = parse_assignment(raw)?;
                editor.set_value(key, value);
            }
            editor.update_entry().await?;
        }
        Command::DeleteEntry { form, id } => {
            editor.open(&form).await?;
            editor.delete_entry(id).await?;
        }
        Command::Export {
            form,
            format,
            output,
        } => {
            editor.open(&form).await?;
            let schema = editor
                .schema()
                .ok_or_else(|| eyre!("form {form} is not open"))?;
            let target = match output.as_deref() {
                None | Some("-") => ExportTarget::Stdout,
                Some(path) if Path::new(path).is_dir() => ExportTarget::directory(path),
                Some(path) => ExportTarget::file(path),
            };
            let format = format
                .or_else(|| target.implied_format())
                .unwrap_or_default();
            let options = ExportOptions::new(format).with_targets(vec![target]);
            for path in export_form(schema, &options).map_err(|err| eyre!("{err:#}"))? {
                eprintln!("wrote {}", path.display());
            }
        }
        Command::Import { file, format, name } => {
            let contents = fs::read_to_string(&file)
                .wrap_err_with(|| format!("failed to read file {}", file.display()))?;
            let format = format
                .or_else(|| DocumentFormat::from_extension(&file))
                .unwrap_or_default();
            let mut schema =
                schema_from_document(&contents, format).map_err(|err| eyre!("{err:#}"))?;
            if let Some(name) = name {
                schema.name = name;
            }
            editor
                .gateway()
                .save_form(&schema)
                .await
                .wrap_err_with(|| format!("failed to store form {}", schema.name))?;
            println!("{}", schema.name);
        }
        Command::SchemaDoc => {
            let doc = serde_json::to_string_pretty(&schema_document())?;
            println!("{doc}");
        }
    }
    Ok(())
}

fn split_pair(raw: &str) -> Result<(&str, &str)> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim(), value.trim()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| eyre!("expected NAME=VALUE, got `{raw}`"))
}

/// `key=value`, where the value is read as JSON when it parses and as a
/// plain string otherwise.
fn parse_assignment(raw: &str) -> Result<(&str, Value)> {
    let (key, value) = split_pair(raw)?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key, value))
}

fn print_notices(notices: Vec<Notice>) {
    for notice in notices {
        if notice.is_error() {
            eprintln!("error: {}", notice.message);
        } else {
            eprintln!("{}", notice.message);
        }
    }
}

fn print_rename(report: &RenameReport) {
    println!(
        "renamed {} -> {}: {} entries updated",
        report.old_key,
        report.new_key,
        report.updated.len()
    );
    for (id, err) in &report.failed {
        println!("  entry {id} not updated: {err}");
    }
}

fn print_schema<G: FormGateway>(editor: &FormEditor<G>) {
    let Some(schema) = editor.schema() else {
        return;
    };
    println!("{} ({})", schema.name, schema.wrapper);
    for (row, group) in schema.rows.iter().enumerate() {
        if group.is_divider() {
            println!("row {row}: --");
            continue;
        }
        for (position, field) in group.fields.iter().enumerate() {
            let required = if field.required { " *" } else { "" };
            println!(
                "row {row}.{position} [{}] {} ({}) \"{}\"{required}",
                field.display_index, field.key, field.kind, field.label
            );
        }
    }
}

fn cell_text(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    }
}

fn print_entries<G: FormGateway>(editor: &FormEditor<G>) {
    let mut headers = vec![("id".to_string(), "id".to_string())];
    headers.extend(
        editor
            .store()
            .columns()
            .iter()
            .map(|column| (column.key.clone(), column.label.clone())),
    );
    let table = editor.table();
    let rows: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|entry| {
            headers
                .iter()
                .map(|(key, _)| cell_text(entry.column_value(key)))
                .collect()
        })
        .collect();
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, (_, label))| {
            rows.iter()
                .map(|row| row[i].width())
                .chain(std::iter::once(label.width()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let labels: Vec<&str> = headers.iter().map(|(_, label)| label.as_str()).collect();
    println!("{}", render_line(&labels, &widths));
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        println!("{}", render_line(&cells, &widths));
    }
    println!(
        "{} (page {}/{})",
        table.showing_range(),
        table.page(),
        table.total_pages()
    );
}

fn render_line(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.width());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
