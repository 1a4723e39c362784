//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 持久化存储模块
//!
//! 定义客户端依赖的存储接口，并提供基于 Sea-ORM 的实现，
//! 支持 PostgreSQL、MySQL 和 SQLite。

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod connection_string;
pub mod schema;
pub mod store;

pub use connection_string::{
    ensure_database_directory, is_memory_database, normalize_connection_string,
    ParsedConnectionString,
};
pub use schema::{SchemaManager, CURRENT_SCHEMA_VERSION, KEY_COLUMN_LENGTH};
pub use store::SeaOrmStore;

/// 数据库类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseType {
    PostgreSQL,
    MySQL,
    SQLite, // 用于测试和开发
}

impl DatabaseType {
    /// 从URL字符串解析数据库类型
    pub fn from_url(url: &str) -> Self {
        let lower = url.to_lowercase();
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            DatabaseType::PostgreSQL
        } else if lower.starts_with("mysql://") {
            DatabaseType::MySQL
        } else {
            DatabaseType::SQLite
        }
    }
}

/// 持久化的一行数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitRow {
    /// 单调递增的行ID
    pub id: i64,
    /// 分组
    pub group: String,
    /// 键
    pub key: String,
    /// 编码后的值
    pub value: String,
}

/// 持久化存储接口
///
/// 每个方法都是一次有界的同步调用：要么返回结果，要么返回错误。
/// 存储层不做重试。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PitStore: Send + Sync {
    /// 创建或升级表结构
    ///
    /// 幂等：已是当前版本时不做任何修改。
    async fn upgrade(&self) -> Result<()>;

    /// 查询 (group, key) 对应的单行
    async fn query_single(&self, group: &str, key: &str) -> Result<Option<PitRow>>;

    /// 批量查询同一分组下的多个键（IN 查询）
    async fn query_many(&self, group: &str, keys: &[String]) -> Result<Vec<PitRow>>;

    /// 插入新行
    async fn insert(&self, group: &str, key: &str, value: &str) -> Result<()>;

    /// 按行ID就地更新值
    async fn update(&self, id: i64, value: &str) -> Result<()>;

    /// 删除 (group, key) 对应的行
    async fn delete_key(&self, group: &str, key: &str) -> Result<()>;

    /// 删除分组下的所有行
    async fn delete_group(&self, group: &str) -> Result<()>;

    /// 按行ID分页读取分组
    ///
    /// 返回 `id > after_id` 的行，按ID升序，最多 `limit` 行。
    async fn page(&self, group: &str, after_id: i64, limit: u64) -> Result<Vec<PitRow>>;
}
