//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 存储管理器、配置加载和指标测试

use oxpit::client::{PitOps, SPECULATIVE_GROUP};
use oxpit::config::Config;
use oxpit::metrics::{get_metrics_string, GLOBAL_METRICS};
use oxpit::PitManager;
use serde_json::json;
use serial_test::serial;
use std::io::Write;

#[path = "../common/mod.rs"]
mod common;

use common::{crud_assertions, memory_store, test_config};

#[tokio::test]
async fn test_lifetime_clients_share_store() {
    let store = memory_store().await;
    let manager = PitManager::from_store(test_config(), store.clone()).unwrap();

    let first = manager.lifetime_client("/home");
    first.boot().await;
    first.set("k", json!("v"), "g").await;
    assert_eq!(first.get("k", "g").await, Some(json!("v")));
    first.on_shutdown().await;

    let second = manager.lifetime_client("/home");
    second.boot().await;
    let before = store.query_count();
    assert_eq!(second.get("k", "g").await, Some(json!("v")));
    assert_eq!(store.query_count(), before);
    second.on_shutdown().await;
}

#[tokio::test]
async fn test_disabled_speculative_uses_store_client() {
    let store = memory_store().await;
    let mut config = test_config();
    config.speculative.enabled = false;
    let manager = PitManager::from_store(config, store.clone()).unwrap();

    let client = manager.lifetime_client("/home");
    client.boot().await;
    client.get("k", "g").await;
    client.on_shutdown().await;

    let reader = manager.store_client();
    reader.boot().await;
    assert_eq!(reader.get("/home", SPECULATIVE_GROUP).await, None);
}

#[tokio::test]
async fn test_connect_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pit.db");
    let config_path = dir.path().join("oxpit.toml");

    let mut file = std::fs::File::create(&config_path).unwrap();
    writeln!(
        file,
        r#"
config_version = 1

[global]
service_name = "manager_test"

[database]
url = "sqlite:{}?mode=rwc"
table_prefix = "mt_"

[speculative]
preload_chunk_size = 50
"#,
        db_path.display()
    )
    .unwrap();

    let config = Config::from_file(&config_path).unwrap();
    let manager = PitManager::connect(config).await.unwrap();
    assert_eq!(manager.config().global.service_name, "manager_test");

    let client = manager.lifetime_client("/file");
    client.boot().await;
    crud_assertions(client.as_ref()).await;
    client.on_shutdown().await;
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let store = memory_store().await;
    let mut config = test_config();
    config.database.table_prefix = "bad prefix".to_string();
    assert!(PitManager::from_store(config, store).is_err());

    assert!(Config::from_file("/definitely/not/here.toml").is_err());
}

#[tokio::test]
#[serial]
async fn test_metrics_are_recorded() {
    GLOBAL_METRICS.reset();
    let store = memory_store().await;
    let mut config = test_config();
    config.global.service_name = "metrics_on".to_string();
    let manager = PitManager::from_store(config, store).unwrap();

    let client = manager.store_client();
    client.boot().await;
    client.set("k", json!(1), "g").await;
    client.get("k", "g").await;
    client.get("k", "g").await;

    assert_eq!(
        GLOBAL_METRICS.request_count("metrics_on", "memory", "get", "hit"),
        1
    );
    assert_eq!(
        GLOBAL_METRICS.request_count("metrics_on", "store", "get", "hit"),
        1
    );
    assert_eq!(
        GLOBAL_METRICS.request_count("metrics_on", "store", "set", "ok"),
        1
    );
    assert!(get_metrics_string().contains("metrics_on:memory:get:hit"));
}

#[tokio::test]
#[serial]
async fn test_metrics_can_be_disabled() {
    GLOBAL_METRICS.reset();
    let store = memory_store().await;
    let mut config = test_config();
    config.global.service_name = "metrics_off".to_string();
    config.global.enable_metrics = false;
    let manager = PitManager::from_store(config, store).unwrap();

    let client = manager.lifetime_client("/quiet");
    client.boot().await;
    client.get("k", "g").await;
    client.get("k", "g").await;
    client.on_shutdown().await;

    assert_eq!(
        GLOBAL_METRICS.request_count("metrics_off", "memory", "get", "miss"),
        0
    );
    assert_eq!(
        GLOBAL_METRICS.request_count("metrics_off", "speculative", "get", "miss"),
        0
    );
    assert!(!get_metrics_string().contains("metrics_off"));
}
