use formloom::{
    DataEntry, EntryData, EntryId, FieldKind, FormGateway, FormSchema, FormStore, GatewayError,
    LocalStorageGateway, Wrapper, domain::FieldOption,
};
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::TempDir;

fn gateway_in(dir: &TempDir) -> LocalStorageGateway {
    LocalStorageGateway::new(dir.path().join("storage.json"))
}

fn read_storage(gateway: &LocalStorageGateway) -> IndexMap<String, String> {
    let text = std::fs::read_to_string(gateway.path()).expect("storage file");
    serde_json::from_str(&text).expect("string map")
}

fn stored_json(storage: &IndexMap<String, String>, key: &str) -> Value {
    serde_json::from_str(storage.get(key).expect("key present")).expect("json text")
}

fn sample_schema() -> FormSchema {
    let mut store = FormStore::new();
    store.load(FormSchema::new("Signup").with_wrapper(Wrapper::Vertical));
    store.add_field(FieldKind::Input, None).expect("input");
    store.add_field(FieldKind::Select, Some(0)).expect("select");
    store.add_divider().expect("divider");
    store.add_field(FieldKind::Radio, Some(1)).expect("radio");
    store.schema().cloned().expect("open form")
}

#[tokio::test]
async fn saved_forms_use_the_local_storage_layout() {
    let dir = TempDir::new().expect("tempdir");
    let gateway = gateway_in(&dir);
    gateway.create_form("Signup").await.expect("create");
    let schema = sample_schema();
    gateway.save_form(&schema).await.expect("save");

    let storage = read_storage(&gateway);
    assert_eq!(
        storage.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["savedForms", "savedFormEntries", "wrapper_Signup"]
    );
    assert_eq!(storage["wrapper_Signup"], "form-field-vertical");
    let forms = stored_json(&storage, "savedForms");
    let first_row = &forms["Signup"][0];
    assert_eq!(first_row["fieldGroupClassName"], json!("row"));
    assert_eq!(first_row["fieldGroup"][0]["key"], json!("input1"));
    assert_eq!(first_row["fieldGroup"][1]["type"], json!("select"));
    assert_eq!(
        first_row["fieldGroup"][1]["wrappers"],
        json!(["form-field-vertical"])
    );
    assert_eq!(stored_json(&storage, "savedFormEntries"), json!({ "Signup": [] }));

    let loaded = gateway.load_form("Signup").await.expect("load");
    assert_eq!(loaded, schema);
}

#[tokio::test]
async fn legacy_dumps_load_with_their_wrapper_preference() {
    let dir = TempDir::new().expect("tempdir");
    let gateway = gateway_in(&dir);
    let forms = json!({
        "Legacy": [
            {
                "key": "name",
                "type": "input",
                "className": "col-6",
                "props": { "label": "Name", "required": true }
            },
            {
                "key": "plan",
                "type": "select",
                "props": {
                    "label": "Plan",
                    "options": [
                        { "label": "Select...", "value": "", "disabled": true },
                        { "label": "Free", "value": "free" }
                    ]
                }
            }
        ]
    });
    let entries = json!({ "Legacy": [{ "id": 3, "name": "Ada", "plan": "free" }] });
    let storage = json!({
        "savedForms": forms.to_string(),
        "savedFormEntries": entries.to_string(),
        "wrapper_Legacy": "ngform-field-vertical",
    });
    std::fs::write(gateway.path(), storage.to_string()).expect("seed storage");

    let schema = gateway.load_form("Legacy").await.expect("load");
    assert_eq!(schema.wrapper, Wrapper::Vertical);
    assert_eq!(schema.rows.len(), 2);
    let name = &schema.rows[0].fields[0];
    assert_eq!((name.key.as_str(), name.label.as_str()), ("name", "Name"));
    assert_eq!(name.column_class, "col-6");
    let plan = &schema.rows[1].fields[0];
    assert_eq!(plan.display_index, 1);
    assert_eq!(
        plan.options,
        vec![FieldOption {
            label: "Free".to_string(),
            value: "free".to_string()
        }]
    );
    assert!(schema.fields().all(|f| f.wrapper == Wrapper::Vertical));

    let entries = gateway.list_entries("Legacy").await.expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, EntryId(3));
    assert_eq!(entries[0].get("plan"), Some(&json!("free")));
    assert!(entries[0].get("id").is_none());

    let created = gateway
        .create_entry("Legacy", &EntryData::from([("name".to_string(), json!("Alan"))]))
        .await
        .expect("create entry");
    assert_eq!(created.id, EntryId(4));
}

#[tokio::test]
async fn rename_and_delete_carry_entries_and_wrapper() {
    let dir = TempDir::new().expect("tempdir");
    let gateway = gateway_in(&dir);
    gateway.create_form("Form1").await.expect("create Form1");
    gateway.create_form("Form2").await.expect("create Form2");
    gateway.save_form(&sample_schema()).await.expect("save Signup");
    let data = EntryData::from([("input1".to_string(), json!("x"))]);
    gateway.create_entry("Form1", &data).await.expect("entry");

    let err = gateway
        .rename_form("Form1", "Form2", Wrapper::Horizontal)
        .await
        .expect_err("taken");
    assert_eq!(err, GatewayError::FormExists("Form2".to_string()));

    gateway
        .rename_form("Form1", "Orders", Wrapper::Vertical)
        .await
        .expect("rename");
    assert_eq!(
        gateway.list_form_names().await.expect("names"),
        vec!["Orders", "Form2", "Signup"]
    );
    assert_eq!(
        gateway.list_entries("Orders").await.expect("entries"),
        vec![DataEntry::new(EntryId(1), data)]
    );
    let storage = read_storage(&gateway);
    assert!(!storage.contains_key("wrapper_Form1"));
    assert_eq!(storage["wrapper_Orders"], "form-field-vertical");

    gateway
        .rename_form("Signup", "Signup", Wrapper::Horizontal)
        .await
        .expect("wrapper only");
    let signup = gateway.load_form("Signup").await.expect("Signup");
    assert!(signup.fields().all(|f| f.wrapper == Wrapper::Horizontal));

    gateway.delete_form("Orders").await.expect("delete");
    let storage = read_storage(&gateway);
    assert!(!storage.contains_key("wrapper_Orders"));
    assert!(stored_json(&storage, "savedFormEntries").get("Orders").is_none());
    let err = gateway.list_entries("Orders").await.expect_err("gone");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn missing_storage_reads_as_empty() {
    let dir = TempDir::new().expect("tempdir");
    let gateway = LocalStorageGateway::new(dir.path().join("nested/storage.json"));
    assert!(gateway.list_form_names().await.expect("names").is_empty());
    let err = gateway.load_form("Form1").await.expect_err("missing");
    assert_eq!(err, GatewayError::FormNotFound("Form1".to_string()));

    gateway.create_form("Form1").await.expect("create");
    assert!(gateway.path().exists());
    let err = gateway.create_form("Form1").await.expect_err("exists");
    assert_eq!(err, GatewayError::FormExists("Form1".to_string()));
}
