use std::time::Duration;

use formloom::{
    DataEntry, EditorError, EntryData, EntryId, FieldKind, FormEditor, FormGateway, FormSchema,
    FormStore, GatewayError, RestGateway, RestOptions, Wrapper,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, method, path},
};

fn gateway_for(server: &MockServer, options: RestOptions) -> RestGateway {
    RestGateway::new(options.with_base_url(server.uri())).expect("client")
}

#[tokio::test]
async fn listing_filters_by_template() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "Form1", "template": "survey" },
            { "name": "Form2" },
            { "name": "Form3", "template": "survey" }
        ])))
        .mount(&server)
        .await;

    let all = gateway_for(&server, RestOptions::default());
    assert_eq!(
        all.list_form_names().await.expect("names"),
        vec!["Form1", "Form2", "Form3"]
    );
    let surveys = gateway_for(&server, RestOptions::default().with_template("survey"));
    assert_eq!(
        surveys.list_form_names().await.expect("names"),
        vec!["Form1", "Form3"]
    );
}

#[tokio::test]
async fn new_form_names_skip_forms_of_other_templates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "Form1", "template": "bootstrap" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forms/Form2"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forms/Form2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Form2",
            "template": "ngzorro",
            "fields": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/forms"))
        .and(body_json(json!({
            "name": "Form2",
            "template": "ngzorro",
            "fields": []
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, RestOptions::default().with_template("ngzorro"));
    assert!(gateway.list_form_names().await.expect("names").is_empty());
    let mut editor = FormEditor::new(gateway);
    assert_eq!(editor.create_form().await.expect("create"), "Form2");

    let posts: Vec<serde_json::Value> = server
        .received_requests()
        .await
        .expect("recorded requests")
        .iter()
        .filter(|request| request.method.as_str() == "POST")
        .map(|request| {
            request
                .body_json::<serde_json::Value>()
                .expect("json body")
        })
        .collect();
    assert!(posts.iter().all(|body| body["name"] != json!("Form1")));
}

#[tokio::test]
async fn creating_a_taken_name_is_refused() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "Form1", "template": "bootstrap" },
            { "name": "Form9", "template": "ngzorro" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forms/Form1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Form1",
            "template": "bootstrap",
            "fields": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/forms"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, RestOptions::default().with_template("ngzorro"));
    assert_eq!(
        gateway.create_form("Form1").await.expect_err("taken"),
        GatewayError::FormExists("Form1".to_string())
    );
    let mut editor = FormEditor::new(gateway);
    let err = editor
        .rename_form("Form9", "Form1", Wrapper::Horizontal)
        .await
        .expect_err("name of another template's form");
    assert!(matches!(err, EditorError::DuplicateFormName(name) if name == "Form1"));
}

#[tokio::test]
async fn forms_load_from_encoded_paths() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forms/Sign%20up"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Sign up",
            "fields": [{
                "fieldGroupClassName": "row",
                "fieldGroup": [{
                    "key": "email",
                    "type": "input",
                    "className": "col-6",
                    "wrappers": ["form-field-vertical"],
                    "props": { "label": "Email", "required": true }
                }]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, RestOptions::default());
    let schema = gateway.load_form("Sign up").await.expect("load");
    assert_eq!(schema.name, "Sign up");
    assert_eq!(schema.wrapper, Wrapper::Vertical);
    let email = schema.field_by_key("email").expect("email field");
    assert_eq!(email.label, "Email");
    assert_eq!(email.column_class, "col-6");
}

#[tokio::test]
async fn missing_resources_map_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forms/Nope"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/forms/Form1/entries/7"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/forms"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database offline"))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, RestOptions::default());
    assert_eq!(
        gateway.load_form("Nope").await.expect_err("missing"),
        GatewayError::FormNotFound("Nope".to_string())
    );
    assert_eq!(
        gateway
            .delete_entry("Form1", EntryId(7))
            .await
            .expect_err("missing"),
        GatewayError::EntryNotFound {
            form: "Form1".to_string(),
            id: EntryId(7)
        }
    );
    assert_eq!(
        gateway.create_form("Form2").await.expect_err("server error"),
        GatewayError::Http {
            status: 500,
            body: "database offline".to_string()
        }
    );
}

#[tokio::test]
async fn saves_post_the_row_layout_with_the_template() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/forms"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let mut store = FormStore::new();
    store.load(FormSchema::new("Form1"));
    store.add_field(FieldKind::Radio, None).expect("radio");
    let schema = store.schema().cloned().expect("open form");

    let gateway = gateway_for(&server, RestOptions::default().with_template("survey"));
    gateway.save_form(&schema).await.expect("save");

    let requests = server.received_requests().await.expect("recorded requests");
    let body = requests[0]
        .body_json::<serde_json::Value>()
        .expect("json body");
    assert_eq!(body["name"], json!("Form1"));
    assert_eq!(body["template"], json!("survey"));
    let radio = &body["fields"][0]["fieldGroup"][0];
    assert_eq!(radio["key"], json!("radio1"));
    assert_eq!(radio["wrappers"], json!(["ngform-field-horizontal"]));
    assert_eq!(radio["type"], json!("radio"));
    assert_eq!(
        radio["props"]["options"],
        json!([
            { "label": "Option 1", "value": "Option 1" },
            { "label": "Option 2", "value": "Option 2" }
        ])
    );
}

#[tokio::test]
async fn rename_sends_the_new_name_and_wrapper() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/forms/rename/Form%201"))
        .and(body_json(json!({
            "newName": "Customers",
            "wrapper": "ngform-field-vertical"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, RestOptions::default());
    gateway
        .rename_form("Form 1", "Customers", Wrapper::Vertical)
        .await
        .expect("rename");
}

#[tokio::test]
async fn entries_round_trip_through_the_backend() {
    let server = MockServer::start().await;
    let data = EntryData::from([("email".to_string(), json!("ada@example.com"))]);
    Mock::given(method("POST"))
        .and(path("/forms/Form1/entries"))
        .and(body_json(json!({ "email": "ada@example.com" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 5,
            "data": { "email": "ada@example.com" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/forms/Form1/entries/5"))
        .and(body_json(json!({ "email": "grace@example.com" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forms/Form1/entries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 5, "data": { "email": "grace@example.com" } }
        ])))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, RestOptions::default());
    let created = gateway.create_entry("Form1", &data).await.expect("create");
    assert_eq!(created, DataEntry::new(EntryId(5), data));

    let updated = DataEntry::new(
        EntryId(5),
        EntryData::from([("email".to_string(), json!("grace@example.com"))]),
    );
    gateway
        .update_entry("Form1", &updated)
        .await
        .expect("update");
    assert_eq!(
        gateway.list_entries("Form1").await.expect("entries"),
        vec![updated]
    );
}

#[tokio::test]
async fn slow_backends_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forms"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let gateway = gateway_for(
        &server,
        RestOptions::default().with_timeout(Duration::from_millis(100)),
    );
    assert_eq!(
        gateway.list_form_names().await.expect_err("timeout"),
        GatewayError::Timeout
    );
}
