//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 进程内缓存一致性测试
//!
//! 通过存储的语句计数验证读穿透缓存何时访问存储

use oxpit::client::PitOps;
use serde_json::json;

#[path = "../common/mod.rs"]
mod common;

use common::{memory_store, store_client};

#[tokio::test]
async fn test_in_memory_cache() {
    let store = memory_store().await;
    let client = store_client(&store);
    client.boot().await;

    // 同一个键读取两次只查询一次
    let before = store.query_count();
    client.get("key1", "group1").await;
    client.get("key1", "group1").await;
    assert_eq!(store.query_count() - before, 1);

    client.set("key1", json!("value1"), "group1").await;

    // 值已改变，需要重新查询
    let before = store.query_count();
    client.get("key1", "group1").await;
    assert_eq!(store.query_count() - before, 1);

    // 再次读取不再查询
    client.get("key1", "group1").await;
    assert_eq!(store.query_count() - before, 1);

    client.delete("key1", "group1").await;

    let before = store.query_count();
    client.get("key1", "group1").await;
    assert_eq!(store.query_count() - before, 1);

    client.set("key1", json!("value1"), "group1").await;
    client.set("key2", json!("value2"), "group1").await;
    client.get("key1", "group1").await;
    client.get("key2", "group1").await;
    client.flush_group("group1").await;

    // 整个分组失效，每个键各查询一次
    let before = store.query_count();
    client.get("key1", "group1").await;
    client.get("key2", "group1").await;
    assert_eq!(store.query_count() - before, 2);
}

#[tokio::test]
async fn test_flush_leaves_other_groups_cached() {
    let store = memory_store().await;
    let client = store_client(&store);
    client.boot().await;

    client.set("a", json!(1), "keep").await;
    client.set("b", json!(2), "drop").await;
    client.get("a", "keep").await;
    client.get("b", "drop").await;
    client.flush_group("drop").await;

    let before = store.query_count();
    assert_eq!(client.get("a", "keep").await, Some(json!(1)));
    assert_eq!(store.query_count(), before);
}

#[tokio::test]
async fn test_caches_are_per_client() {
    let store = memory_store().await;
    let writer = store_client(&store);
    let reader = store_client(&store);
    writer.boot().await;
    reader.boot().await;

    assert_eq!(reader.get("k", "g").await, None);
    writer.set("k", json!("v"), "g").await;

    // reader 缓存了“不存在”，直到自己失效前都保持该快照
    assert_eq!(reader.get("k", "g").await, None);

    let fresh = store_client(&store);
    fresh.boot().await;
    assert_eq!(fresh.get("k", "g").await, Some(json!("v")));
}
