//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 表结构创建和版本升级测试

use oxpit::config::DatabaseConfig;
use oxpit::database::{PitStore, SeaOrmStore, CURRENT_SCHEMA_VERSION};
use oxpit::error::PitError;
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use secrecy::SecretString;
use std::sync::Arc;

#[path = "../common/mod.rs"]
mod common;

use common::memory_store;

async fn exec(store: &SeaOrmStore, sql: &str) {
    store
        .connection()
        .execute(Statement::from_string(DatabaseBackend::Sqlite, sql.to_string()))
        .await
        .unwrap();
}

async fn index_exists(store: &SeaOrmStore) -> bool {
    store
        .connection()
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type = 'index' AND name = 'oxpit_items_group_key'"
                .to_string(),
        ))
        .await
        .unwrap()
        .is_some()
}

#[tokio::test]
async fn test_fresh_install_creates_current_version() {
    let store = memory_store().await;
    assert_eq!(store.installed_version().await.unwrap(), "0");

    store.upgrade().await.unwrap();
    assert_eq!(
        store.installed_version().await.unwrap(),
        CURRENT_SCHEMA_VERSION
    );
    assert!(index_exists(&store).await);
}

#[tokio::test]
async fn test_upgrade_is_idempotent() {
    let store = memory_store().await;
    store.upgrade().await.unwrap();
    store.insert("g", "k", "1").await.unwrap();

    store.upgrade().await.unwrap();
    store.upgrade().await.unwrap();

    assert_eq!(store.page("g", 0, 10).await.unwrap().len(), 1);
    assert_eq!(
        store.installed_version().await.unwrap(),
        CURRENT_SCHEMA_VERSION
    );
}

#[tokio::test]
async fn test_upgrade_from_version_one_adds_index() {
    let store = memory_store().await;
    exec(
        &store,
        "CREATE TABLE \"oxpit_items\" (item_id INTEGER PRIMARY KEY AUTOINCREMENT, \
         item_group VARCHAR(191) NOT NULL, item_key VARCHAR(191) NOT NULL, item_value TEXT NOT NULL)",
    )
    .await;
    exec(
        &store,
        "CREATE TABLE \"oxpit_meta\" (meta_key VARCHAR(191) NOT NULL PRIMARY KEY, meta_value TEXT NOT NULL)",
    )
    .await;
    exec(
        &store,
        "INSERT INTO \"oxpit_meta\" (meta_key, meta_value) VALUES ('database_version', '1')",
    )
    .await;
    exec(
        &store,
        "INSERT INTO \"oxpit_items\" (item_group, item_key, item_value) VALUES ('g', 'k', '\"kept\"')",
    )
    .await;
    assert!(!index_exists(&store).await);

    store.upgrade().await.unwrap();

    assert!(index_exists(&store).await);
    assert_eq!(store.installed_version().await.unwrap(), "2");
    let row = store.query_single("g", "k").await.unwrap().unwrap();
    assert_eq!(row.value, "\"kept\"");
}

#[tokio::test]
async fn test_unrecognized_version_is_an_error() {
    let store = memory_store().await;
    store.upgrade().await.unwrap();
    exec(
        &store,
        "UPDATE \"oxpit_meta\" SET meta_value = '7' WHERE meta_key = 'database_version'",
    )
    .await;

    let err = store.upgrade().await.unwrap_err();
    assert!(matches!(err, PitError::SchemaError(_)));
    assert_eq!(store.installed_version().await.unwrap(), "7");
}

#[tokio::test]
async fn test_invalid_table_prefix_is_rejected() {
    let store = memory_store().await;
    let connection = Arc::new(store.connection().clone());
    assert!(SeaOrmStore::new(connection.clone(), "pit; DROP TABLE x").is_err());
    assert!(SeaOrmStore::new(connection, "").is_ok());
}

#[tokio::test]
async fn test_prefixes_isolate_tables() {
    let store = memory_store().await;
    let connection = Arc::new(store.connection().clone());
    let other = SeaOrmStore::new(connection, "other_").unwrap();

    store.upgrade().await.unwrap();
    other.upgrade().await.unwrap();
    store.insert("g", "k", "1").await.unwrap();

    assert!(other.query_single("g", "k").await.unwrap().is_none());
    assert_eq!(other.items_table(), "other_items");
}

#[tokio::test]
async fn test_file_database_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("pit.db");
    let config = DatabaseConfig {
        url: SecretString::new(format!("sqlite:{}?mode=rwc", path.display()).into()),
        ..Default::default()
    };

    {
        let store = SeaOrmStore::connect(&config).await.unwrap();
        store.upgrade().await.unwrap();
        store.insert("g", "k", "\"durable\"").await.unwrap();
    }
    assert!(path.exists());

    let store = SeaOrmStore::connect(&config).await.unwrap();
    store.upgrade().await.unwrap();
    let row = store.query_single("g", "k").await.unwrap().unwrap();
    assert_eq!(row.value, "\"durable\"");
}

#[tokio::test]
async fn test_concurrent_fresh_installs_both_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let config = DatabaseConfig {
        url: SecretString::new(format!("sqlite:{}?mode=rwc", path.display()).into()),
        ..Default::default()
    };

    let first = SeaOrmStore::connect(&config).await.unwrap();
    let second = SeaOrmStore::connect(&config).await.unwrap();
    let (a, b) = tokio::join!(first.upgrade(), second.upgrade());
    a.unwrap();
    b.unwrap();

    assert_eq!(
        first.installed_version().await.unwrap(),
        CURRENT_SCHEMA_VERSION
    );
    assert_eq!(
        second.installed_version().await.unwrap(),
        CURRENT_SCHEMA_VERSION
    );
}
