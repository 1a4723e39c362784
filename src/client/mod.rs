//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了存储客户端的接口和实现。

pub mod item;
pub mod speculative;
pub mod store;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{instrument, warn};

pub use item::Item;
pub use speculative::{FetchSet, SpeculativeClient, SPECULATIVE_GROUP};
pub use store::{StoreClient, GROUP_PAGE_SIZE};

/// 客户端就绪状态
///
/// 只在 `boot()` 中变更。`Failed` 对当前实例是永久状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Uninitialized,
    Ready,
    Failed,
}

/// 存储客户端操作特征
///
/// 所有操作都不返回错误：存储未就绪或访问失败时，
/// 读取返回 `None`，写入变为空操作，失败会记录日志。
#[async_trait]
pub trait PitOps: Send + Sync {
    /// 初始化客户端（幂等）
    async fn boot(&self);

    /// 客户端是否已就绪
    async fn is_ready(&self) -> bool;

    /// 读取值，不存在或存储不可用时返回 `None`
    async fn get(&self, key: &str, group: &str) -> Option<Value>;

    /// 写入值
    async fn set(&self, key: &str, value: Value, group: &str);

    /// 删除值，键不存在时为空操作
    async fn delete(&self, key: &str, group: &str);

    /// 删除分组下的所有值
    async fn flush_group(&self, group: &str);

    /// 惰性遍历分组
    ///
    /// 每次调用都从头开始一次新的遍历。
    fn group<'a>(&'a self, group: &'a str) -> BoxStream<'a, Item<'a>>;

    /// 生命周期结束时调用一次
    async fn on_shutdown(&self) {}
}

/// 类型化访问扩展
///
/// 通过 `serde_json::Value` 转换，转换失败按未命中或跳过写入处理
#[async_trait]
pub trait PitExt: PitOps {
    /// 读取并转换为指定类型
    #[instrument(skip(self), level = "debug")]
    async fn get_as<T: DeserializeOwned + Send>(&self, key: &str, group: &str) -> Option<T> {
        let value = self.get(key, group).await?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Value for {}/{} has unexpected shape: {}", group, key, e);
                None
            }
        }
    }

    /// 转换后写入
    #[instrument(skip(self, value), level = "debug")]
    async fn set_as<T: Serialize + Send + Sync>(&self, key: &str, value: &T, group: &str) {
        match serde_json::to_value(value) {
            Ok(v) => self.set(key, v, group).await,
            Err(e) => warn!("Skipping write of {}/{}: {}", group, key, e),
        }
    }
}

impl<T: PitOps + ?Sized> PitExt for T {}
