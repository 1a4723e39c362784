//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 通用缓存适配器测试

use oxpit::adapter::{storage_key, GroupCache};
use oxpit::client::PitOps;
use oxpit::config::AdapterConfig;
use oxpit::error::PitError;
use serde_json::{json, Value};

#[path = "../common/mod.rs"]
mod common;

use common::{memory_store, store_client};

#[tokio::test]
async fn test_basic_operations() {
    let store = memory_store().await;
    let client = store_client(&store);
    client.boot().await;
    let cache = GroupCache::new("sessions", &client);
    assert_eq!(cache.group(), "_kv_sessions");

    assert_eq!(cache.get("s1", json!("default")).await.unwrap(), json!("default"));
    assert!(!cache.has("s1").await.unwrap());

    cache.set("s1", json!({"user": 7})).await.unwrap();
    assert_eq!(cache.get("s1", Value::Null).await.unwrap(), json!({"user": 7}));
    assert!(cache.has("s1").await.unwrap());

    // 键带前缀存储
    assert_eq!(
        client.get("_kv_s1", "_kv_sessions").await,
        Some(json!({"user": 7}))
    );

    cache.delete("s1").await.unwrap();
    assert!(!cache.has("s1").await.unwrap());
}

#[tokio::test]
async fn test_stored_null_reads_as_miss() {
    let store = memory_store().await;
    let client = store_client(&store);
    client.boot().await;
    let cache = GroupCache::new("nulls", &client);

    cache.set("n", Value::Null).await.unwrap();
    assert_eq!(cache.get("n", json!(5)).await.unwrap(), json!(5));
    assert!(!cache.has("n").await.unwrap());
}

#[tokio::test]
async fn test_clear_only_touches_own_group() {
    let store = memory_store().await;
    let client = store_client(&store);
    client.boot().await;

    client.set("raw", json!("untouched"), "sessions").await;
    let sessions = GroupCache::new("sessions", &client);
    let other = GroupCache::new("other", &client);
    sessions.set("a", json!(1)).await.unwrap();
    other.set("a", json!(2)).await.unwrap();

    sessions.clear().await;

    assert!(!sessions.has("a").await.unwrap());
    assert_eq!(other.get("a", Value::Null).await.unwrap(), json!(2));
    assert_eq!(client.get("raw", "sessions").await, Some(json!("untouched")));
}

#[tokio::test]
async fn test_multiple_operations() {
    let store = memory_store().await;
    let client = store_client(&store);
    client.boot().await;
    let cache = GroupCache::new("multi", &client);

    cache
        .set_multiple(vec![("a", json!(1)), ("b", json!(2))])
        .await
        .unwrap();

    let values = cache
        .get_multiple(["b", "a", "c"], json!("none"))
        .await
        .unwrap();
    assert_eq!(
        values,
        vec![
            ("b".to_string(), json!(2)),
            ("a".to_string(), json!(1)),
            ("c".to_string(), json!("none")),
        ]
    );

    cache.delete_multiple(["a", "b"]).await.unwrap();
    assert!(!cache.has("a").await.unwrap());
    assert!(!cache.has("b").await.unwrap());
}

#[tokio::test]
async fn test_invalid_keys_are_rejected() {
    let store = memory_store().await;
    let client = store_client(&store);
    client.boot().await;
    let cache = GroupCache::new("strict", &client);

    for key in ["", "a:b", "a/b", "a@b", "{a}"] {
        assert!(matches!(
            cache.set(key, json!(1)).await,
            Err(PitError::InvalidKey(_))
        ));
        assert!(cache.get(key, Value::Null).await.is_err());
        assert!(cache.has(key).await.is_err());
    }

    // 批量操作中任一键非法时不写入任何键
    assert!(cache
        .set_multiple(vec![("ok", json!(1)), ("bad:key", json!(2))])
        .await
        .is_err());
    assert!(!cache.has("ok").await.unwrap());
}

#[tokio::test]
async fn test_long_keys_are_hashed() {
    let store = memory_store().await;
    let client = store_client(&store);
    client.boot().await;
    let cache = GroupCache::new("long", &client);

    let long_key = "k".repeat(300);
    cache.set(&long_key, json!("big")).await.unwrap();
    assert_eq!(cache.get(&long_key, Value::Null).await.unwrap(), json!("big"));

    let stored = storage_key("_kv_", &long_key, 172).unwrap();
    assert!(stored.len() <= 172);
    assert_eq!(client.get(&stored, "_kv_long").await, Some(json!("big")));
}

#[tokio::test]
async fn test_custom_namespace() {
    let store = memory_store().await;
    let client = store_client(&store);
    client.boot().await;

    let config = AdapterConfig {
        namespace_prefix: "_psr16_".to_string(),
        max_key_length: 64,
    };
    let cache = GroupCache::with_config("blog", &client, &config);
    assert_eq!(cache.group(), "_psr16_blog");

    cache.set("post", json!(1)).await.unwrap();
    assert_eq!(client.get("_psr16_post", "_psr16_blog").await, Some(json!(1)));
}

#[tokio::test]
async fn test_adapter_over_boxed_client() {
    let store = memory_store().await;
    let client: Box<dyn PitOps> = Box::new(store_client(&store));
    client.boot().await;

    let cache = GroupCache::new("boxed", client.as_ref());
    cache.set("k", json!(true)).await.unwrap();
    assert!(cache.has("k").await.unwrap());
}
