//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了持久化存储客户端，使用进程内条目缓存作为读穿透层。

use super::{Item, PitOps, ReadyState};
use crate::backend::Items;
use crate::database::{PitRow, PitStore};
use crate::metrics::GLOBAL_METRICS;
use crate::serialization::{Serializer, SerializerEnum};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// 分组遍历的分页大小
pub const GROUP_PAGE_SIZE: u64 = 100;

/// 持久化存储客户端
///
/// 每个生命周期（例如一次请求）创建一个实例，条目缓存不跨实例共享。
pub struct StoreClient {
    service_name: String,
    store: Arc<dyn PitStore>,
    serializer: SerializerEnum,
    items: Items,
    state: RwLock<ReadyState>,
    metrics_enabled: bool,
}

impl StoreClient {
    pub fn new(service_name: String, store: Arc<dyn PitStore>, serializer: SerializerEnum) -> Self {
        Self {
            service_name,
            store,
            serializer,
            items: Items::new(),
            state: RwLock::new(ReadyState::Uninitialized),
            metrics_enabled: true,
        }
    }

    /// 设置是否记录指标
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    pub fn metrics_enabled(&self) -> bool {
        self.metrics_enabled
    }

    pub(crate) fn record_request(&self, layer: &str, op: &str, outcome: &str) {
        if self.metrics_enabled {
            GLOBAL_METRICS.record_request(&self.service_name, layer, op, outcome);
        }
    }

    pub(crate) fn record_duration(&self, layer: &str, op: &str, start: Instant) {
        if self.metrics_enabled {
            GLOBAL_METRICS.record_duration(
                &self.service_name,
                layer,
                op,
                start.elapsed().as_secs_f64(),
            );
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// 底层存储
    pub fn store(&self) -> &Arc<dyn PitStore> {
        &self.store
    }

    pub async fn state(&self) -> ReadyState {
        *self.state.read().await
    }

    /// 解码存储的文本，无法解析时返回原始字符串
    pub(crate) fn decode(&self, raw: &str) -> Value {
        self.serializer.decode_lenient(raw)
    }

    /// 按行ID分页遍历分组的原始行
    pub(crate) fn row_stream<'a>(&'a self, group: &'a str) -> BoxStream<'a, PitRow> {
        stream::unfold(Some(0i64), move |cursor| async move {
            let after_id = cursor?;
            if !self.is_ready().await {
                return None;
            }

            match self.store.page(group, after_id, GROUP_PAGE_SIZE).await {
                Ok(rows) => {
                    let next = if (rows.len() as u64) < GROUP_PAGE_SIZE {
                        None
                    } else {
                        rows.last().map(|row| row.id)
                    };
                    Some((rows, next))
                }
                Err(e) => {
                    warn!(
                        "Group enumeration of {} stopped after id {}: {}",
                        group, after_id, e
                    );
                    None
                }
            }
        })
        .flat_map(stream::iter)
        .boxed()
    }
}

#[async_trait]
impl PitOps for StoreClient {
    #[instrument(skip(self), level = "debug", fields(service = %self.service_name))]
    async fn boot(&self) {
        let mut state = self.state.write().await;
        if *state != ReadyState::Uninitialized {
            debug!("Client already booted: {:?}", *state);
            return;
        }

        *state = match self.store.upgrade().await {
            Ok(()) => {
                info!("Store client ready");
                ReadyState::Ready
            }
            Err(e) => {
                warn!("Store unavailable, client disabled: {}", e);
                ReadyState::Failed
            }
        };
    }

    async fn is_ready(&self) -> bool {
        *self.state.read().await == ReadyState::Ready
    }

    #[instrument(skip(self), level = "debug", fields(service = %self.service_name))]
    async fn get(&self, key: &str, group: &str) -> Option<Value> {
        if !self.is_ready().await {
            return None;
        }

        if self.items.has(key, group) {
            self.record_request("memory", "get", "hit");
            return self.items.get(key, group);
        }
        self.record_request("memory", "get", "miss");

        let start = Instant::now();
        let result = self.store.query_single(group, key).await;
        self.record_duration("store", "get", start);

        match result {
            Ok(row) => {
                let value = row.map(|row| self.decode(&row.value));
                let outcome = if value.is_some() { "hit" } else { "miss" };
                self.record_request("store", "get", outcome);
                // 不存在也缓存，避免重复查询
                self.items.add(key, value.clone(), group);
                value
            }
            Err(e) => {
                self.record_request("store", "get", "error");
                warn!("Failed to read {}/{}: {}", group, key, e);
                None
            }
        }
    }

    #[instrument(skip(self, value), level = "debug", fields(service = %self.service_name))]
    async fn set(&self, key: &str, value: Value, group: &str) {
        if !self.is_ready().await {
            return;
        }

        let encoded = match self.serializer.serialize(&value) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Failed to encode {}/{}: {}", group, key, e);
                return;
            }
        };

        let start = Instant::now();
        let result = match self.store.query_single(group, key).await {
            Ok(Some(row)) => self.store.update(row.id, &encoded).await,
            Ok(None) => self.store.insert(group, key, &encoded).await,
            Err(e) => Err(e),
        };
        self.record_duration("store", "set", start);

        match result {
            Ok(()) => self.record_request("store", "set", "ok"),
            Err(e) => {
                self.record_request("store", "set", "error");
                warn!("Failed to write {}/{}: {}", group, key, e);
            }
        }

        // 失效而不是刷新，下次读取以存储内容为准
        self.items.remove(key, group);
    }

    #[instrument(skip(self), level = "debug", fields(service = %self.service_name))]
    async fn delete(&self, key: &str, group: &str) {
        if !self.is_ready().await {
            return;
        }

        match self.store.delete_key(group, key).await {
            Ok(()) => self.record_request("store", "delete", "ok"),
            Err(e) => {
                self.record_request("store", "delete", "error");
                warn!("Failed to delete {}/{}: {}", group, key, e);
            }
        }
        self.items.remove(key, group);
    }

    #[instrument(skip(self), level = "debug", fields(service = %self.service_name))]
    async fn flush_group(&self, group: &str) {
        if !self.is_ready().await {
            return;
        }

        match self.store.delete_group(group).await {
            Ok(()) => self.record_request("store", "flush", "ok"),
            Err(e) => {
                self.record_request("store", "flush", "error");
                warn!("Failed to flush group {}: {}", group, e);
            }
        }
        self.items.remove_group(group);
    }

    fn group<'a>(&'a self, group: &'a str) -> BoxStream<'a, Item<'a>> {
        self.row_stream(group)
            .map(move |row| Item::new(row.key, self.decode(&row.value), row.group, self))
            .boxed()
    }
}
