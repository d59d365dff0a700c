//! Demo executable for `fresh_orm_core`.
//!
//! # Responsibility
//! - Run the Category/Item walkthrough against a file or in-memory database.
//! - Print each step as one JSON line so output stays easy to diff.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use fresh_orm_core::{
    init_logging, open_db, Criteria, Database, DbConfig, DbLocation, Model, ModelService, Related,
    Repository, SqliteRepository,
};
use log::info;
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(version, about)]
struct Cli {
    /// SQLite file or `:memory:`; defaults to `FRESH_ORM_DB_FILE`, then `db.sqlite`.
    #[clap(long)]
    db: Option<String>,

    #[clap(long, default_value = fresh_orm_core::default_log_level())]
    log_level: String,

    /// Absolute directory for rolling log files; logging is off without it.
    #[clap(long)]
    log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Model)]
struct Category {
    id: Option<i64>,
    name: String,
}

#[derive(Debug, Clone, Model)]
#[orm(table = "items")]
struct Item {
    id: Option<i64>,
    name: String,
    category: Option<Related<Category>>,
    price: Option<f64>,
    tags: Vec<String>,
    added_at: chrono::NaiveDateTime,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(dir) = &cli.log_dir {
        let dir = dir.to_str().context("log directory must be valid UTF-8")?;
        init_logging(&cli.log_level, dir)?;
    }

    let config = match &cli.db {
        Some(location) => DbConfig {
            location: DbLocation::parse(location)?,
            ..DbConfig::default()
        },
        None => DbConfig::from_env()?,
    };
    let db = open_db(&config)?;
    info!("event=cli_start module=cli status=ok mode={}", config.location.mode());

    run(&db)?;
    db.close()?;
    Ok(())
}

fn run(db: &Database) -> Result<()> {
    let categories = ModelService::new(SqliteRepository::<Category>::try_new(db)?);
    let items = SqliteRepository::<Item>::try_new(db)?;
    db.init_tables(&[categories.repository().schema().clone(), items.schema().clone()])?;

    let category = categories.save(Category {
        id: None,
        name: "A".to_string(),
    })?;
    print_step("create_category", json!({ "id": category.id, "name": category.name }));

    let item = items.create(Item {
        id: None,
        name: "x".to_string(),
        category: Some(Related::from(&category)),
        price: Some(9.5),
        tags: vec!["new".to_string(), "sale".to_string()],
        added_at: Local::now().naive_local(),
    })?;
    let item_id = item.id().context("created item has no id")?;
    print_step("create_item", json!({ "id": item_id, "table": Item::table_name() }));

    if let Some(loaded) = items.by_id(item_id)? {
        print_step("load_item", item_json(&loaded));
    }

    let all: Vec<_> = items.all()?.iter().map(item_json).collect();
    print_step("all_items", json!(all));

    let in_category = items.filter(&Criteria::new().where_eq("category", category.id))?;
    print_step("filter_items", json!({ "category": category.id, "matches": in_category.len() }));

    let mut renamed = item;
    renamed.name = "y".to_string();
    renamed.price = None;
    let renamed = items.update(renamed)?;
    print_step("update_item", item_json(&renamed));

    items.delete(item_id)?;
    print_step("delete_item", json!({ "remaining": items.all()?.len() }));
    Ok(())
}

fn item_json(item: &Item) -> serde_json::Value {
    json!({
        "id": item.id,
        "name": item.name,
        "category": item.category.as_ref().and_then(Related::target_id),
        "price": item.price,
        "tags": item.tags,
        "added_at": item.added_at.to_string(),
    })
}

fn print_step(step: &str, detail: serde_json::Value) {
    println!("{}", json!({ "step": step, "detail": detail }));
}
