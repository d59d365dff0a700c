use fresh_orm_core::db::{open_db, open_db_in_memory};
use fresh_orm_core::schema::introspect;
use fresh_orm_core::{DbConfig, Model, RepoError, Repository, SqliteRepository};

#[derive(Debug, Clone, PartialEq, Model)]
#[orm(table = "notes")]
struct Note {
    id: Option<i64>,
    title: String,
    body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Model)]
struct Marker {
    id: Option<i64>,
}

#[test]
fn init_tables_keeps_existing_rows() {
    let db = open_db_in_memory().unwrap();
    let repo = SqliteRepository::<Note>::try_new(&db).unwrap();
    repo.create_table().unwrap();

    repo.create(Note {
        id: None,
        title: "kept".to_string(),
        body: None,
    })
    .unwrap();

    db.init_tables(&[introspect::<Note>().unwrap()]).unwrap();
    repo.create_table().unwrap();

    let rows = repo.all().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "kept");
}

#[test]
fn verify_schema_reports_missing_table_and_columns() {
    let db = open_db_in_memory().unwrap();
    let repo = SqliteRepository::<Note>::try_new(&db).unwrap();

    match repo.verify_schema().unwrap_err() {
        RepoError::MissingRequiredTable(table) => assert_eq!(table, "notes"),
        other => panic!("unexpected error: {other}"),
    }

    db.execute_batch("CREATE TABLE notes (id INTEGER PRIMARY KEY, title TEXT);")
        .unwrap();
    match repo.verify_schema().unwrap_err() {
        RepoError::MissingRequiredColumn { table, column } => {
            assert_eq!(table, "notes");
            assert_eq!(column, "body");
        }
        other => panic!("unexpected error: {other}"),
    }

    db.execute_batch("ALTER TABLE notes ADD COLUMN body TEXT;")
        .unwrap();
    repo.verify_schema().unwrap();
}

#[test]
fn fieldless_model_inserts_default_row() {
    let db = open_db_in_memory().unwrap();
    let repo = SqliteRepository::<Marker>::try_new(&db).unwrap();
    repo.create_table().unwrap();

    let first = repo.create(Marker { id: None }).unwrap();
    let second = repo.create(Marker { id: None }).unwrap();
    assert_eq!((first.id, second.id), (Some(1), Some(2)));

    repo.update(first.clone()).unwrap();
    assert_eq!(repo.all().unwrap(), vec![first, second]);
}

#[test]
fn file_database_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = DbConfig::file(dir.path().join("fresh_orm.sqlite"));

    {
        let db = open_db(&config).unwrap();
        let repo = SqliteRepository::<Note>::try_new(&db).unwrap();
        repo.create_table().unwrap();
        repo.create(Note {
            id: None,
            title: "durable".to_string(),
            body: Some("text".to_string()),
        })
        .unwrap();
        db.close().unwrap();
    }

    let db = open_db(&config).unwrap();
    let repo = SqliteRepository::<Note>::try_new(&db).unwrap();
    repo.verify_schema().unwrap();
    let loaded = repo.by_id(1).unwrap().unwrap();
    assert_eq!(loaded.title, "durable");
    assert_eq!(loaded.body.as_deref(), Some("text"));
}
