use chrono::{NaiveDate, NaiveDateTime};
use fresh_orm_core::db::{open_db_in_memory, DbError};
use fresh_orm_core::schema::build_create_table;
use fresh_orm_core::{Database, Model, RepoError, Repository, SqliteRepository};
use rusqlite::types::Value as SqlValue;
use serde_json::json;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, PartialEq, Model)]
struct Sample {
    id: Option<i64>,
    count: i32,
    ratio: f64,
    active: bool,
    label: String,
    settings: BTreeMap<String, i64>,
    history: Vec<String>,
    born_on: NaiveDate,
    seen_at: NaiveDateTime,
    note: Option<String>,
    payload: Option<serde_json::Map<String, serde_json::Value>>,
    #[orm(as_text)]
    host: Ipv4Addr,
    #[orm(as_text)]
    backup_host: Option<Ipv4Addr>,
}

fn sample() -> Sample {
    let mut settings = BTreeMap::new();
    settings.insert("depth".to_string(), 3);
    settings.insert("width".to_string(), -2);

    let payload = json!({ "nested": { "ok": true }, "list": [1, 2.5, null] });

    Sample {
        id: None,
        count: -7,
        ratio: 0.25,
        active: true,
        label: "it's \"quoted\"".to_string(),
        settings,
        history: vec!["a".to_string(), "b".to_string()],
        born_on: NaiveDate::from_ymd_opt(1999, 12, 31).unwrap(),
        seen_at: NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_micro_opt(23, 59, 58, 123_456)
            .unwrap(),
        note: None,
        payload: payload.as_object().cloned(),
        host: Ipv4Addr::new(192, 168, 1, 20),
        backup_host: None,
    }
}

fn setup(db: &Database) -> SqliteRepository<'_, Sample> {
    let repo = SqliteRepository::try_new(db).unwrap();
    repo.create_table().unwrap();
    repo
}

#[test]
fn column_types_follow_field_types() {
    let sql = build_create_table::<Sample>().unwrap();
    let expected = [
        "id INTEGER PRIMARY KEY AUTOINCREMENT",
        "count INTEGER NOT NULL",
        "ratio REAL NOT NULL",
        "active INTEGER NOT NULL",
        "label TEXT NOT NULL",
        "settings TEXT CHECK(json_valid(settings)) NOT NULL",
        "history TEXT CHECK(json_valid(history)) NOT NULL",
        "born_on TEXT CHECK(born_on LIKE '____-__-__') NOT NULL",
        "seen_at TEXT CHECK(seen_at LIKE '____-__-__ __:__:__%') NOT NULL",
        "note TEXT NULL",
        "payload TEXT CHECK(json_valid(payload)) NULL",
        "host TEXT NOT NULL",
        "backup_host TEXT NULL",
    ];

    assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS sample ("), "{sql}");
    for definition in expected {
        assert!(sql.contains(definition), "missing `{definition}` in {sql}");
    }
}

#[test]
fn every_field_type_roundtrips() {
    let db = open_db_in_memory().unwrap();
    let repo = setup(&db);

    let created = repo.create(sample()).unwrap();
    let loaded = repo.by_id(created.id.unwrap()).unwrap().unwrap();
    assert_eq!(loaded, created);

    let mut changed = loaded;
    changed.active = false;
    changed.note = Some("now set".to_string());
    changed.payload = None;
    changed.history.clear();
    changed.backup_host = Some(Ipv4Addr::new(10, 0, 0, 2));
    repo.update(changed.clone()).unwrap();
    assert_eq!(repo.by_id(changed.id.unwrap()).unwrap().unwrap(), changed);
}

#[test]
fn optional_text_fields_store_null() {
    let db = open_db_in_memory().unwrap();
    let repo = setup(&db);
    let created = repo.create(sample()).unwrap();

    let rows = db
        .query(
            "SELECT backup_host FROM sample WHERE id = ?",
            &[SqlValue::Integer(created.id.unwrap())],
        )
        .unwrap();
    assert_eq!(rows.rows[0], vec![SqlValue::Null]);
    assert_eq!(repo.all().unwrap()[0].backup_host, None);
}

#[test]
fn values_are_stored_in_canonical_text_forms() {
    let db = open_db_in_memory().unwrap();
    let repo = setup(&db);
    let created = repo.create(sample()).unwrap();

    let rows = db
        .query(
            "SELECT active, settings, born_on, seen_at, host FROM sample WHERE id = ?",
            &[SqlValue::Integer(created.id.unwrap())],
        )
        .unwrap();
    assert_eq!(
        rows.rows[0],
        vec![
            SqlValue::Integer(1),
            SqlValue::Text(r#"{"depth":3,"width":-2}"#.to_string()),
            SqlValue::Text("1999-12-31".to_string()),
            SqlValue::Text("2024-02-29 23:59:58.123456".to_string()),
            SqlValue::Text("192.168.1.20".to_string()),
        ]
    );
}

#[test]
fn check_constraints_reject_malformed_text() {
    let db = open_db_in_memory().unwrap();
    let _repo = setup(&db);

    let insert = "INSERT INTO sample \
        (count, ratio, active, label, settings, history, born_on, seen_at, host) \
        VALUES (1, 1.0, 0, 'l', ?, '[]', ?, '2024-01-01 00:00:00', '1.2.3.4')";

    let bad_json = db
        .execute(
            insert,
            &[
                SqlValue::Text("{not json".to_string()),
                SqlValue::Text("2024-01-01".to_string()),
            ],
        )
        .unwrap_err();
    assert!(matches!(bad_json, DbError::ConstraintViolation(_)), "{bad_json}");

    let bad_date = db
        .execute(
            insert,
            &[
                SqlValue::Text("{}".to_string()),
                SqlValue::Text("01/02/2024".to_string()),
            ],
        )
        .unwrap_err();
    assert!(matches!(bad_date, DbError::ConstraintViolation(_)), "{bad_date}");
}

#[test]
fn wrong_stored_shape_is_a_decode_error() {
    let db = open_db_in_memory().unwrap();
    let repo = setup(&db);
    let created = repo.create(sample()).unwrap();

    db.execute(
        "UPDATE sample SET settings = '[1, 2]' WHERE id = ?",
        &[SqlValue::Integer(created.id.unwrap())],
    )
    .unwrap();

    let err = repo.all().unwrap_err();
    assert!(matches!(err, RepoError::Codec(_)), "{err}");
    assert!(err.to_string().contains("settings"), "{err}");
}

#[test]
fn integers_outside_declared_width_are_rejected_on_read() {
    let db = open_db_in_memory().unwrap();
    let repo = setup(&db);
    let created = repo.create(sample()).unwrap();

    db.execute(
        "UPDATE sample SET count = ? WHERE id = ?",
        &[
            SqlValue::Integer(i64::from(i32::MAX) + 1),
            SqlValue::Integer(created.id.unwrap()),
        ],
    )
    .unwrap();

    let err = repo.by_id(created.id.unwrap()).unwrap_err();
    assert!(err.to_string().contains("count"), "{err}");
}

#[test]
fn text_that_is_not_utf8_is_invalid_data() {
    let db = open_db_in_memory().unwrap();
    let repo = setup(&db);
    let created = repo.create(sample()).unwrap();

    db.execute(
        "UPDATE sample SET label = CAST(x'ff' AS TEXT) WHERE id = ?",
        &[SqlValue::Integer(created.id.unwrap())],
    )
    .unwrap();

    let err = repo.all().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)), "{err}");
    assert_eq!(err.code(), "invalid_data");
}

#[test]
fn nan_and_out_of_range_years_are_rejected_before_writing() {
    let db = open_db_in_memory().unwrap();
    let repo = setup(&db);

    let mut nan = sample();
    nan.ratio = f64::NAN;
    let err = repo.create(nan).unwrap_err();
    assert!(matches!(err, RepoError::Codec(_)), "{err}");
    assert!(err.to_string().contains("ratio"), "{err}");

    let mut far_future = sample();
    far_future.born_on = NaiveDate::from_ymd_opt(10_000, 1, 1).unwrap();
    let err = repo.create(far_future).unwrap_err();
    assert!(matches!(err, RepoError::Codec(_)), "{err}");
    assert!(err.to_string().contains("born_on"), "{err}");

    assert!(repo.all().unwrap().is_empty());
}
