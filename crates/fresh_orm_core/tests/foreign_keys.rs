use fresh_orm_core::codec::CodecError;
use fresh_orm_core::db::open_db_in_memory;
use fresh_orm_core::{
    Criteria, Database, Model, RepoError, Related, Repository, SqliteRepository,
};

#[derive(Debug, Clone, PartialEq, Model)]
struct Category {
    id: Option<i64>,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Model)]
struct Item {
    id: Option<i64>,
    name: String,
    category: Option<Related<Category>>,
}

#[derive(Debug, Clone, PartialEq, Model)]
#[orm(table = "entries")]
struct Entry {
    id: Option<i64>,
    category: Related<Category>,
}

struct Repos<'db> {
    categories: SqliteRepository<'db, Category>,
    items: SqliteRepository<'db, Item>,
    entries: SqliteRepository<'db, Entry>,
}

fn setup(db: &Database) -> Repos<'_> {
    let repos = Repos {
        categories: SqliteRepository::try_new(db).unwrap(),
        items: SqliteRepository::try_new(db).unwrap(),
        entries: SqliteRepository::try_new(db).unwrap(),
    };
    db.init_tables(&[
        repos.items.schema().clone(),
        repos.entries.schema().clone(),
        repos.categories.schema().clone(),
    ])
    .unwrap();
    repos
}

#[test]
fn reference_is_stored_and_read_back_as_id() {
    let db = open_db_in_memory().unwrap();
    let repos = setup(&db);

    let category = repos
        .categories
        .create(Category {
            id: None,
            name: "A".to_string(),
        })
        .unwrap();
    assert_eq!(category.id, Some(1));

    let item = repos
        .items
        .create(Item {
            id: None,
            name: "x".to_string(),
            category: Some(Related::from(&category)),
        })
        .unwrap();
    assert_eq!(item.id, Some(1));

    let loaded = repos.items.by_id(1).unwrap().unwrap();
    let reference = loaded.category.unwrap();
    assert_eq!(reference, 1_i64);
    assert!(reference.record().is_none());
}

#[test]
fn filter_accepts_reference_ids() {
    let db = open_db_in_memory().unwrap();
    let repos = setup(&db);

    let first = repos
        .categories
        .create(Category {
            id: None,
            name: "first".to_string(),
        })
        .unwrap();
    let second = repos
        .categories
        .create(Category {
            id: None,
            name: "second".to_string(),
        })
        .unwrap();
    for (name, category) in [("a", &first), ("b", &second), ("c", &second)] {
        repos
            .items
            .create(Item {
                id: None,
                name: name.to_string(),
                category: Some(Related::from(category)),
            })
            .unwrap();
    }

    let in_second = repos
        .items
        .filter(&Criteria::new().where_eq("category", second.id))
        .unwrap();
    let names: Vec<_> = in_second.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, ["b", "c"]);
}

#[test]
fn optional_reference_may_be_null() {
    let db = open_db_in_memory().unwrap();
    let repos = setup(&db);

    let item = repos
        .items
        .create(Item {
            id: None,
            name: "orphan".to_string(),
            category: None,
        })
        .unwrap();

    let loaded = repos.items.by_id(item.id.unwrap()).unwrap().unwrap();
    assert_eq!(loaded.category, None);
}

#[test]
fn dangling_reference_violates_foreign_key() {
    let db = open_db_in_memory().unwrap();
    let repos = setup(&db);

    let err = repos
        .entries
        .create(Entry {
            id: None,
            category: Related::Id(99),
        })
        .unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)), "{err}");
    assert!(repos.entries.all().unwrap().is_empty());
}

#[test]
fn unsaved_reference_is_rejected_before_insert() {
    let db = open_db_in_memory().unwrap();
    let repos = setup(&db);

    let unsaved = Category {
        id: None,
        name: "draft".to_string(),
    };
    let err = repos
        .entries
        .create(Entry {
            id: None,
            category: Related::from(unsaved),
        })
        .unwrap_err();
    match err {
        RepoError::Codec(CodecError::UnsavedReference { field, model }) => {
            assert_eq!(field, "category");
            assert_eq!(model, "Category");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn referencing_table_gets_foreign_key_clause() {
    let db = open_db_in_memory().unwrap();
    let _repos = setup(&db);

    let sql: String = db
        .with_connection(|conn| {
            conn.query_row(
                "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'entries'",
                [],
                |row| row.get(0),
            )
        })
        .unwrap();
    assert!(
        sql.contains("FOREIGN KEY (category) REFERENCES category(id)"),
        "{sql}"
    );
}
