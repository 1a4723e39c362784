//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了基于 Sea-ORM 的持久化存储实现。

use super::{
    connection_string::{ensure_database_directory, is_memory_database},
    schema::{placeholder, quote_identifier, SchemaManager},
    PitRow, PitStore,
};
use crate::config::DatabaseConfig;
use crate::error::{PitError, Result};
use crate::utils::{redaction::redact_connection_string, validate_identifier};
use async_trait::async_trait;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, QueryResult,
    Statement, Value,
};
use secrecy::ExposeSecret;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Sea-ORM 存储
///
/// 同一个实例可以被多个客户端共享，连接池由 Sea-ORM 管理。
pub struct SeaOrmStore {
    connection: Arc<DatabaseConnection>,
    backend: DatabaseBackend,
    items_table: String,
    meta_table: String,
    query_count: AtomicU64,
}

impl SeaOrmStore {
    /// 按配置打开数据库连接
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config.url.expose_secret();
        let normalized = ensure_database_directory(url)?;

        let mut opt = ConnectOptions::new(normalized.clone());
        if is_memory_database(&normalized) {
            // 每个内存连接都是独立的数据库
            opt.max_connections(1).min_connections(1);
        } else {
            opt.max_connections(config.max_connections);
        }
        opt.connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .sqlx_logging(false);

        info!(
            "Connecting to database: {}",
            redact_connection_string(&normalized)
        );
        let connection = Database::connect(opt)
            .await
            .map_err(|e| PitError::DatabaseError(format!("Failed to open database: {}", e)))?;

        Self::new(Arc::new(connection), &config.table_prefix)
    }

    /// 使用已有连接创建存储
    pub fn new(connection: Arc<DatabaseConnection>, table_prefix: &str) -> Result<Self> {
        validate_identifier(table_prefix)?;
        let backend = connection.get_database_backend();

        Ok(Self {
            connection,
            backend,
            items_table: format!("{}items", table_prefix),
            meta_table: format!("{}meta", table_prefix),
            query_count: AtomicU64::new(0),
        })
    }

    /// 已执行的数据操作语句数（不含表结构语句）
    pub fn query_count(&self) -> u64 {
        self.query_count.load(Ordering::Relaxed)
    }

    /// 数据表名
    pub fn items_table(&self) -> &str {
        &self.items_table
    }

    /// 底层连接
    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// 读取已安装的表结构版本
    pub async fn installed_version(&self) -> Result<String> {
        self.schema().installed_version().await
    }

    fn schema(&self) -> SchemaManager<'_> {
        SchemaManager::new(&self.connection, &self.items_table, &self.meta_table)
    }

    fn table(&self) -> String {
        quote_identifier(self.backend, &self.items_table)
    }

    fn ph(&self, n: usize) -> String {
        placeholder(self.backend, n)
    }

    async fn execute(&self, sql: String, values: Vec<Value>) -> Result<u64> {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        let result = self
            .connection
            .execute(Statement::from_sql_and_values(self.backend, sql, values))
            .await?;
        Ok(result.rows_affected())
    }

    async fn query_rows(&self, sql: String, values: Vec<Value>) -> Result<Vec<PitRow>> {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        let rows = self
            .connection
            .query_all(Statement::from_sql_and_values(self.backend, sql, values))
            .await?;
        rows.iter().map(row_from_result).collect()
    }
}

fn row_from_result(row: &QueryResult) -> Result<PitRow> {
    Ok(PitRow {
        id: row.try_get("", "item_id")?,
        group: row.try_get("", "item_group")?,
        key: row.try_get("", "item_key")?,
        value: row.try_get("", "item_value")?,
    })
}

#[async_trait]
impl PitStore for SeaOrmStore {
    #[instrument(skip(self), level = "debug", fields(table = %self.items_table))]
    async fn upgrade(&self) -> Result<()> {
        self.schema().upgrade().await
    }

    #[instrument(skip(self), level = "debug")]
    async fn query_single(&self, group: &str, key: &str) -> Result<Option<PitRow>> {
        let sql = format!(
            "SELECT item_id, item_group, item_key, item_value FROM {} \
             WHERE item_group = {} AND item_key = {} ORDER BY item_id LIMIT 1",
            self.table(),
            self.ph(1),
            self.ph(2)
        );
        let mut rows = self
            .query_rows(sql, vec![Value::from(group), Value::from(key)])
            .await?;
        Ok(rows.pop())
    }

    #[instrument(skip(self, keys), level = "debug", fields(keys = keys.len()))]
    async fn query_many(&self, group: &str, keys: &[String]) -> Result<Vec<PitRow>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let in_list: Vec<String> = (0..keys.len()).map(|i| self.ph(i + 2)).collect();
        let sql = format!(
            "SELECT item_id, item_group, item_key, item_value FROM {} \
             WHERE item_group = {} AND item_key IN ({}) ORDER BY item_id",
            self.table(),
            self.ph(1),
            in_list.join(", ")
        );

        let mut values = Vec::with_capacity(keys.len() + 1);
        values.push(Value::from(group));
        values.extend(keys.iter().map(|k| Value::from(k.as_str())));

        self.query_rows(sql, values).await
    }

    #[instrument(skip(self, value), level = "debug")]
    async fn insert(&self, group: &str, key: &str, value: &str) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (item_group, item_key, item_value) VALUES ({}, {}, {})",
            self.table(),
            self.ph(1),
            self.ph(2),
            self.ph(3)
        );
        self.execute(
            sql,
            vec![Value::from(group), Value::from(key), Value::from(value)],
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self, value), level = "debug")]
    async fn update(&self, id: i64, value: &str) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET item_value = {} WHERE item_id = {}",
            self.table(),
            self.ph(1),
            self.ph(2)
        );
        self.execute(sql, vec![Value::from(value), Value::from(id)])
            .await?;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete_key(&self, group: &str, key: &str) -> Result<()> {
        let sql = format!(
            "DELETE FROM {} WHERE item_group = {} AND item_key = {}",
            self.table(),
            self.ph(1),
            self.ph(2)
        );
        let affected = self
            .execute(sql, vec![Value::from(group), Value::from(key)])
            .await?;
        debug!("Deleted {} row(s)", affected);
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete_group(&self, group: &str) -> Result<()> {
        let sql = format!(
            "DELETE FROM {} WHERE item_group = {}",
            self.table(),
            self.ph(1)
        );
        let affected = self.execute(sql, vec![Value::from(group)]).await?;
        debug!("Deleted {} row(s)", affected);
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn page(&self, group: &str, after_id: i64, limit: u64) -> Result<Vec<PitRow>> {
        let sql = format!(
            "SELECT item_id, item_group, item_key, item_value FROM {} \
             WHERE item_group = {} AND item_id > {} ORDER BY item_id LIMIT {}",
            self.table(),
            self.ph(1),
            self.ph(2),
            self.ph(3)
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.query_rows(
            sql,
            vec![Value::from(group), Value::from(after_id), Value::from(limit)],
        )
        .await
    }
}
