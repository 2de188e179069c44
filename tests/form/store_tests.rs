use formloom::{
    DataEntry, EntryData, EntryId, FieldKind, FieldPatch, FormSchema, FormStore, StoreError,
    Wrapper,
    domain::FieldOption,
    form::{EditorState, FieldCommand, apply_command, validate_schema},
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn open_store() -> FormStore {
    let mut store = FormStore::new();
    store.load(FormSchema::new("Form1"));
    store
}

fn display_indices(store: &FormStore) -> Vec<usize> {
    store
        .schema()
        .expect("open form")
        .fields()
        .map(|field| field.display_index)
        .collect()
}

fn keys(store: &FormStore) -> Vec<String> {
    store
        .schema()
        .expect("open form")
        .keys()
        .map(str::to_string)
        .collect()
}

/// Small xorshift generator so edit sequences are reproducible.
struct Sequence(u64);

impl Sequence {
    fn below(&mut self, bound: usize) -> usize {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 % bound.max(1) as u64) as usize
    }
}

fn random_edit(store: &mut FormStore, rng: &mut Sequence) {
    let rows = store.schema().expect("open form").rows.len();
    let row_len = |store: &FormStore, row: usize| {
        store
            .schema()
            .and_then(|schema| schema.rows.get(row))
            .map_or(0, |group| group.fields.len())
    };
    match rng.below(6) {
        0 | 1 => {
            let kind = FieldKind::ALL[rng.below(FieldKind::ALL.len())];
            let target = (rng.below(2) == 0).then(|| rng.below(rows + 1));
            let _ = store.add_field(kind, target);
        }
        2 => {
            let _ = store.add_divider();
        }
        3 => {
            let row = rng.below(rows);
            let position = rng.below(row_len(&*store, row) + 1);
            store.delete_field(row, position);
        }
        4 => {
            let from = rng.below(rows);
            let position = rng.below(row_len(&*store, from) + 1);
            let to = rng.below(rows);
            let to_position = rng.below(row_len(&*store, to) + 1);
            let _ = store.move_field(from, position, to, to_position);
        }
        _ => {
            if rng.below(3) == 0 {
                store.delete_row(rng.below(rows));
            } else {
                let _ = store.move_row(rng.below(rows), rng.below(rows));
            }
        }
    }
}

#[test]
fn display_indices_stay_dense_through_structural_edits() {
    for seed in 1..=40u64 {
        let mut store = open_store();
        let mut rng = Sequence(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        for step in 0..60 {
            random_edit(&mut store, &mut rng);
            let schema = store.schema().expect("open form");
            let expected: Vec<usize> = (0..schema.field_count()).collect();
            assert_eq!(display_indices(&store), expected, "seed {seed}, step {step}");
            assert_eq!(validate_schema(schema), Ok(()), "seed {seed}, step {step}");
            let mut controls: Vec<&str> = store.controls().keys().collect();
            let mut field_keys: Vec<&str> = schema.keys().collect();
            controls.sort_unstable();
            field_keys.sort_unstable();
            assert_eq!(controls, field_keys, "seed {seed}, step {step}");
        }
    }
}

#[test]
fn rejected_moves_keep_indices_dense() {
    let mut store = open_store();
    store.add_field(FieldKind::Input, None).expect("add input");
    store.add_field(FieldKind::Select, Some(0)).expect("add select");
    store.add_field(FieldKind::Radio, None).expect("add radio");
    store.add_divider().expect("add divider");
    assert_eq!(display_indices(&store), vec![0, 1, 2]);

    store.move_field(1, 0, 0, 0).expect_err("row 0 is full");
    store.move_field(0, 1, 0, 0).expect("swap in row");
    assert_eq!(keys(&store), vec!["select1", "input1", "radio1"]);
    assert_eq!(display_indices(&store), vec![0, 1, 2]);
    assert!(store.is_dirty());
}

#[test]
fn new_keys_fill_the_first_gap() {
    let mut store = open_store();
    for _ in 0..3 {
        store.add_field(FieldKind::Input, None).expect("add input");
    }
    store.delete_field(1, 0).expect("delete input2");
    assert_eq!(keys(&store), vec!["input1", "input3"]);

    let added = store.add_field(FieldKind::Input, None).expect("add input");
    assert_eq!(added.key, "input2");
    assert_eq!(added.display_index, 2);
}

#[test]
fn deleting_the_last_field_removes_its_row() {
    let mut store = open_store();
    store.add_field(FieldKind::Input, None).expect("add input");
    store.add_field(FieldKind::Input, Some(0)).expect("add second input");
    store.add_field(FieldKind::Radio, None).expect("add radio");

    store.delete_field(0, 0).expect("delete input1");
    let schema = store.schema().expect("open");
    assert_eq!(schema.rows.len(), 2);
    assert_eq!(schema.rows[0].fields.len(), 1);
    assert_eq!(schema.rows[0].fields[0].key, "input2");

    store.delete_field(0, 0).expect("delete input2");
    let schema = store.schema().expect("open");
    assert_eq!(schema.rows.len(), 1);
    assert_eq!(schema.rows[0].fields[0].key, "radio1");
    assert!(!store.controls().contains("input2"));
}

#[test]
fn select_field_scenario() {
    let mut store = open_store();
    let field = store.add_field(FieldKind::Select, None).expect("add select");
    assert_eq!(field.key, "select1");
    assert_eq!(
        field.options,
        vec![
            FieldOption::labelled("Option 1"),
            FieldOption::labelled("Option 2")
        ]
    );
    let schema = store.schema().expect("open");
    assert_eq!(schema.rows.len(), 1);
    assert_eq!(schema.rows[0].fields.len(), 1);

    store.delete_field(0, 0).expect("delete select1");
    assert!(store.schema().expect("open").rows.is_empty());
    assert!(store.controls().is_empty());
}

#[test]
fn key_rename_migrates_controls_model_and_entries() {
    let mut store = open_store();
    store.add_field(FieldKind::Input, None).expect("add input");
    store
        .edit_field(0, &FieldPatch::new().with_key("email"))
        .expect("rename to email");
    store.mark_saved();
    store.set_entries(vec![
        DataEntry::new(
            EntryId(1),
            EntryData::from([
                ("email".to_string(), json!("ada@example.com")),
                ("age".to_string(), json!(36)),
            ]),
        ),
        DataEntry::new(
            EntryId(2),
            EntryData::from([("email".to_string(), json!("alan@example.com"))]),
        ),
    ]);
    store.set_value("email", json!("grace@example.com"));

    let outcome = store
        .edit_field(0, &FieldPatch::new().with_key("contact"))
        .expect("rename to contact");
    let rename = outcome.rename.expect("key changed");
    assert_eq!(rename.affected, vec![EntryId(1), EntryId(2)]);

    for entry in store.entries() {
        assert!(entry.get("email").is_none());
    }
    assert_eq!(
        store.entry(EntryId(1)).and_then(|e| e.get("contact")),
        Some(&json!("ada@example.com"))
    );
    assert_eq!(
        store.entry(EntryId(2)).and_then(|e| e.get("contact")),
        Some(&json!("alan@example.com"))
    );
    let entry_keys: Vec<&str> = store
        .entry(EntryId(1))
        .expect("entry 1")
        .data
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(entry_keys, vec!["contact", "age"]);
    assert!(!store.controls().contains("email"));
    assert_eq!(
        store.controls().get("contact").map(|c| c.value.clone()),
        Some(json!("grace@example.com"))
    );
    assert_eq!(store.model().get("contact"), Some(&json!("grace@example.com")));
    let columns: Vec<&str> = store.columns().iter().map(|c| c.key.as_str()).collect();
    assert_eq!(columns, vec!["contact", "age"]);
    assert_eq!(store.state(), EditorState::Dirty);
}

#[test]
fn invalid_patches_leave_the_form_untouched() {
    let mut store = open_store();
    store.add_field(FieldKind::Input, None).expect("add input");
    store.add_field(FieldKind::Select, None).expect("add select");
    store.mark_saved();
    let before = store.schema().cloned();

    assert_eq!(
        store.edit_field(0, &FieldPatch::new().with_key("select1")),
        Err(StoreError::DuplicateKey {
            key: "select1".to_string()
        })
    );
    assert_eq!(
        store.edit_field(0, &FieldPatch::new().with_key("  ")),
        Err(StoreError::EmptyKey)
    );
    assert_eq!(
        store.edit_field(1, &FieldPatch::new().with_options(Vec::new())),
        Err(StoreError::MissingOptions {
            key: "select1".to_string()
        })
    );
    assert_eq!(
        store.edit_field(7, &FieldPatch::new().with_label("Ghost")),
        Err(StoreError::FieldNotFound { index: 7 })
    );
    assert_eq!(store.schema().cloned(), before);
    assert_eq!(store.state(), EditorState::Clean);
}

#[test]
fn bulk_edits_are_all_or_nothing() {
    let mut store = open_store();
    store.add_field(FieldKind::Input, None).expect("add input");
    store.add_field(FieldKind::Input, Some(0)).expect("add input");
    let before = store.schema().cloned();

    let err = store
        .edit_row(
            0,
            &[
                FieldPatch::new().with_label("First"),
                FieldPatch::new().with_label(""),
            ],
        )
        .expect_err("second patch is invalid");
    assert_eq!(err, StoreError::EmptyLabel);
    assert_eq!(store.schema().cloned(), before);

    let outcomes = store
        .edit_all(&[
            FieldPatch::new().with_key("first"),
            FieldPatch::new().with_key("second"),
        ])
        .expect("global edit");
    assert_eq!(outcomes.len(), 2);
    assert_eq!(keys(&store), vec!["first", "second"]);
}

#[test]
fn style_numbers_gain_pixel_units() {
    let mut store = open_store();
    store.add_field(FieldKind::Input, None).expect("add input");
    store
        .edit_field(
            0,
            &FieldPatch::new()
                .with_style("fontSize", "14")
                .with_style("borderRadius", "4")
                .with_style("color", "red")
                .with_style("unknown", "1")
                .with_label_style("fontSize", "12"),
        )
        .expect("style edit");
    let field = store.field(0).expect("field 0");
    assert_eq!(field.style.get("fontSize").map(String::as_str), Some("14px"));
    assert_eq!(field.style.get("borderRadius").map(String::as_str), Some("4px"));
    assert_eq!(field.style.get("color").map(String::as_str), Some("red"));
    assert!(field.style.get("unknown").is_none());
    assert_eq!(
        field.label_style.get("fontSize").map(String::as_str),
        Some("12px")
    );
}

#[test]
fn wrapper_change_does_not_dirty_the_form() {
    let mut store = open_store();
    store.add_field(FieldKind::Input, None).expect("add input");
    store.mark_saved();
    store.change_wrapper(Wrapper::Vertical).expect("wrapper");
    let schema = store.schema().expect("open");
    assert_eq!(schema.wrapper, Wrapper::Vertical);
    assert!(schema.fields().all(|f| f.wrapper == Wrapper::Vertical));
    assert_eq!(store.state(), EditorState::Clean);

    let field = store.add_field(FieldKind::Radio, None).expect("add radio");
    assert_eq!(field.wrapper, Wrapper::Vertical);
}

#[test]
fn operations_need_an_open_form() {
    let mut store = FormStore::new();
    assert_eq!(store.state(), EditorState::Unopened);
    assert_eq!(
        apply_command(
            &mut store,
            FieldCommand::AddField {
                kind: FieldKind::Input,
                row: None
            }
        ),
        Err(StoreError::NoFormOpen)
    );
    assert!(store.delete_field(0, 0).is_none());
    assert_eq!(store.state(), EditorState::Unopened);
}

#[test]
fn moving_out_of_a_row_leaves_a_divider() {
    let mut store = open_store();
    store.add_field(FieldKind::Input, None).expect("add input");
    store.add_field(FieldKind::Textarea, None).expect("add textarea");
    store.move_field(1, 0, 0, 99).expect("join row 0");
    let schema = store.schema().expect("open");
    assert_eq!(schema.rows.len(), 2);
    assert!(schema.rows[1].is_divider());
    assert_eq!(keys(&store), vec!["input1", "textarea1"]);
    assert_eq!(
        store.add_field(FieldKind::Input, Some(0)),
        Err(StoreError::RowFull {
            row: 0,
            capacity: 2
        })
    );
}
