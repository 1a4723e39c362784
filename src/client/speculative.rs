//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了预加载客户端。
//!
//! 它记录一次请求生命周期内读取过的键，在生命周期结束时以请求标识为键保存下来；
//! 同一请求再次出现时，启动阶段按分组批量查询这些键并放入自己的条目缓存，
//! 之后的逐键读取不再访问存储。

use super::{Item, PitOps, StoreClient};
use crate::backend::Items;
use crate::request::RequestIdentity;
use ahash::AHashMap;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// 保存读取记录的内部分组，与调用方的分组互不冲突
pub const SPECULATIVE_GROUP: &str = "__oxpit_speculative";

/// 默认每次批量查询的最大键数
pub const DEFAULT_PRELOAD_CHUNK_SIZE: usize = 500;

/// 读取记录：分组 -> 去重并排序的键列表，分组按名称排序
pub type FetchSet = BTreeMap<String, Vec<String>>;

/// 把累积的读取记录转换为规范形式
pub fn canonical_fetch_set(fetched: &BTreeMap<String, BTreeSet<String>>) -> FetchSet {
    fetched
        .iter()
        .filter(|(_, keys)| !keys.is_empty())
        .map(|(group, keys)| (group.clone(), keys.iter().cloned().collect()))
        .collect()
}

/// 预加载客户端
///
/// 包装一个 [`StoreClient`]，拥有独立的条目缓存。
/// 该缓存只由启动时的批量预加载填充，逐键读取不会写入它。
pub struct SpeculativeClient {
    identity: String,
    origin: StoreClient,
    items: Items,
    saved_keys: RwLock<FetchSet>,
    fetched_keys: Mutex<BTreeMap<String, BTreeSet<String>>>,
    preload_chunk_size: usize,
    preloaded: AtomicBool,
    shut_down: AtomicBool,
}

impl SpeculativeClient {
    /// 创建预加载客户端
    ///
    /// 请求标识只在这里读取一次。
    pub fn new<R: RequestIdentity + ?Sized>(request: &R, origin: StoreClient) -> Self {
        Self {
            identity: request.stable_identity(),
            origin,
            items: Items::new(),
            saved_keys: RwLock::new(FetchSet::new()),
            fetched_keys: Mutex::new(BTreeMap::new()),
            preload_chunk_size: DEFAULT_PRELOAD_CHUNK_SIZE,
            preloaded: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
        }
    }

    /// 设置每次批量查询的最大键数
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.preload_chunk_size = chunk_size.max(1);
        self
    }

    /// 当前请求标识
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn origin(&self) -> &StoreClient {
        &self.origin
    }

    /// 启动时加载的读取记录
    pub fn saved_keys(&self) -> FetchSet {
        self.saved_keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 本次生命周期内读取过的键（规范形式）
    pub fn fetched_keys(&self) -> FetchSet {
        canonical_fetch_set(&self.fetched_keys.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn record_fetch(&self, key: &str, group: &str) {
        self.fetched_keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(group.to_string())
            .or_default()
            .insert(key.to_string());
    }

    #[instrument(skip(self), level = "debug", fields(service = %self.origin.service_name()))]
    async fn preload(&self) {
        let saved = match self.origin.get(&self.identity, SPECULATIVE_GROUP).await {
            Some(value) => serde_json::from_value::<FetchSet>(value).unwrap_or_else(|e| {
                warn!("Ignoring malformed fetch record for {}: {}", self.identity, e);
                FetchSet::new()
            }),
            None => FetchSet::new(),
        };

        let start = Instant::now();
        let mut preloaded = 0usize;
        for (group, keys) in &saved {
            self.items.remove_group(group);
            if keys.is_empty() {
                continue;
            }

            match self.fetch_group(group, keys).await {
                Some(resolved) => {
                    for (key, value) in resolved {
                        self.items.add(&key, value, group);
                        preloaded += 1;
                    }
                }
                None => self.origin.record_request("speculative", "preload", "skipped"),
            }
        }
        self.origin.record_duration("speculative", "preload", start);

        if !saved.is_empty() {
            info!(
                "Preloaded {} key(s) across {} group(s) for {}",
                preloaded,
                saved.len(),
                self.identity
            );
        }
        *self.saved_keys.write().unwrap_or_else(PoisonError::into_inner) = saved;
    }

    /// 按块批量查询一个分组，任一块失败时放弃整个分组
    ///
    /// 返回的映射以请求的键为准：`Some` 为存储的值，`None` 为确认不存在。
    /// 结果里只有大小写不同的行时（数据库排序规则不区分大小写），
    /// 该键不放入映射，留给逐键读取按数据库的比较规则处理。
    async fn fetch_group(
        &self,
        group: &str,
        keys: &[String],
    ) -> Option<AHashMap<String, Option<Value>>> {
        let mut resolved = AHashMap::with_capacity(keys.len());
        for chunk in keys.chunks(self.preload_chunk_size) {
            let rows = match self.origin.store().query_many(group, chunk).await {
                Ok(rows) => rows,
                Err(e) => {
                    warn!("Preload of group {} failed, falling back to per-key reads: {}", group, e);
                    return None;
                }
            };

            let mut found: AHashMap<String, Value> = AHashMap::with_capacity(rows.len());
            for row in rows {
                // 行按ID升序，与单键查询一样取最早的一行
                if !found.contains_key(&row.key) {
                    let value = self.origin.decode(&row.value);
                    found.insert(row.key, value);
                }
            }

            for key in chunk {
                if let Some(value) = found.get(key) {
                    resolved.insert(key.clone(), Some(value.clone()));
                    continue;
                }
                let folded = key.to_lowercase();
                if found.keys().any(|k| k.to_lowercase() == folded) {
                    debug!("Key {}/{} matched a differently-cased row, not preloaded", group, key);
                    continue;
                }
                resolved.insert(key.clone(), None);
            }
        }
        Some(resolved)
    }
}

#[async_trait]
impl PitOps for SpeculativeClient {
    /// 先启动底层客户端，再执行一次预加载
    async fn boot(&self) {
        self.origin.boot().await;

        if self.preloaded.swap(true, Ordering::SeqCst) {
            return;
        }
        if !self.origin.is_ready().await {
            debug!("Origin not ready, skipping preload for {}", self.identity);
            return;
        }
        self.preload().await;
    }

    async fn is_ready(&self) -> bool {
        self.origin.is_ready().await
    }

    #[instrument(skip(self), level = "debug", fields(service = %self.origin.service_name()))]
    async fn get(&self, key: &str, group: &str) -> Option<Value> {
        // 命中与否都要记录
        self.record_fetch(key, group);

        if self.items.has(key, group) {
            self.origin.record_request("speculative", "get", "hit");
            return self.items.get(key, group);
        }
        self.origin.record_request("speculative", "get", "miss");
        self.origin.get(key, group).await
    }

    async fn set(&self, key: &str, value: Value, group: &str) {
        self.items.remove(key, group);
        self.origin.set(key, value, group).await;
    }

    async fn delete(&self, key: &str, group: &str) {
        self.items.remove(key, group);
        self.origin.delete(key, group).await;
    }

    async fn flush_group(&self, group: &str) {
        self.items.remove_group(group);
        self.origin.flush_group(group).await;
    }

    fn group<'a>(&'a self, group: &'a str) -> BoxStream<'a, Item<'a>> {
        self.origin
            .row_stream(group)
            .map(move |row| Item::new(row.key, self.origin.decode(&row.value), row.group, self))
            .boxed()
    }

    /// 保存本次的读取记录
    ///
    /// 只有与启动时加载的记录不同，且两者至少一个非空时才写入。
    #[instrument(skip(self), level = "debug", fields(service = %self.origin.service_name()))]
    async fn on_shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        let fetched = self.fetched_keys();
        let saved = self.saved_keys();
        if fetched == saved || (fetched.is_empty() && saved.is_empty()) {
            debug!("Fetch record for {} unchanged", self.identity);
            return;
        }

        match serde_json::to_value(&fetched) {
            Ok(record) => {
                debug!(
                    "Saving fetch record for {} ({} group(s))",
                    self.identity,
                    fetched.len()
                );
                self.origin.set(&self.identity, record, SPECULATIVE_GROUP).await;
            }
            Err(e) => warn!("Failed to encode fetch record for {}: {}", self.identity, e),
        }
    }
}
