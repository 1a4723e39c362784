//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了存储管理器，持有共享的存储连接并为每个生命周期创建客户端。

use crate::client::{PitOps, SpeculativeClient, StoreClient};
use crate::config::{Config, SerializationType};
use crate::database::{PitStore, SeaOrmStore};
use crate::error::{PitError, Result};
use crate::request::RequestIdentity;
use crate::serialization::{json::JsonSerializer, SerializerEnum};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// 存储管理器
///
/// 连接只打开一次并在所有客户端之间共享；
/// 客户端（及其条目缓存）按生命周期创建，不跨请求复用。
pub struct PitManager {
    config: Config,
    store: Arc<dyn PitStore>,
}

impl PitManager {
    /// 按配置打开数据库连接
    #[instrument(skip(config), level = "info", fields(service = %config.global.service_name))]
    pub async fn connect(config: Config) -> Result<Self> {
        config.validate().map_err(PitError::ConfigError)?;

        let store = SeaOrmStore::connect(&config.database).await?;
        info!("PitManager connected, table {}", store.items_table());
        Ok(Self {
            config,
            store: Arc::new(store),
        })
    }

    /// 使用已有的存储创建管理器
    pub fn from_store(config: Config, store: Arc<dyn PitStore>) -> Result<Self> {
        config.validate().map_err(PitError::ConfigError)?;
        Ok(Self { config, store })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 共享的底层存储
    pub fn store(&self) -> Arc<dyn PitStore> {
        Arc::clone(&self.store)
    }

    fn serializer(&self) -> SerializerEnum {
        match self.config.global.serialization {
            SerializationType::Json => SerializerEnum::Json(JsonSerializer::new()),
        }
    }

    /// 创建新的持久化存储客户端（未启动）
    pub fn store_client(&self) -> StoreClient {
        StoreClient::new(
            self.config.global.service_name.clone(),
            self.store(),
            self.serializer(),
        )
        .with_metrics(self.config.global.enable_metrics)
    }

    /// 为一次请求创建客户端（未启动）
    ///
    /// 启用预加载时返回 [`SpeculativeClient`]，否则返回 [`StoreClient`]。
    /// 调用方负责 `boot()`，并在请求结束时调用一次 `on_shutdown()`。
    pub fn lifetime_client<R: RequestIdentity + ?Sized>(&self, request: &R) -> Box<dyn PitOps> {
        if !self.config.speculative.enabled {
            debug!("Speculative preload disabled, using store client");
            return Box::new(self.store_client());
        }

        Box::new(
            SpeculativeClient::new(request, self.store_client())
                .with_chunk_size(self.config.speculative.preload_chunk_size),
        )
    }
}
