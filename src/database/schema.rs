//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块负责表结构的创建和版本升级。
//!
//! 版本号保存在 `{prefix}meta` 表中，与 [`CURRENT_SCHEMA_VERSION`] 精确比较，
//! 不一致时依次执行升级步骤，成功后写入新版本。

use crate::error::{PitError, Result};
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement, Value};
use tracing::{debug, info};

/// 当前表结构版本
pub const CURRENT_SCHEMA_VERSION: &str = "2";

/// meta 表中保存版本号的键
pub const VERSION_META_KEY: &str = "database_version";

/// `item_group` 和 `item_key` 列的最大长度
pub const KEY_COLUMN_LENGTH: usize = 191;

/// 分组索引名后缀
const GROUP_KEY_INDEX: &str = "group_key";

/// 转义SQL标识符
///
/// MySQL 使用反引号，其他数据库使用双引号。调用方需保证标识符已通过验证。
pub(crate) fn quote_identifier(backend: DatabaseBackend, identifier: &str) -> String {
    match backend {
        DatabaseBackend::MySql => format!("`{}`", identifier),
        _ => format!("\"{}\"", identifier),
    }
}

/// 第 `n` 个参数占位符（从1开始）
pub(crate) fn placeholder(backend: DatabaseBackend, n: usize) -> String {
    match backend {
        DatabaseBackend::Postgres => format!("${}", n),
        _ => "?".to_string(),
    }
}

fn upsert_version_sql(backend: DatabaseBackend, meta_table: &str) -> String {
    let insert = format!(
        "INSERT INTO {} (meta_key, meta_value) VALUES ({}, {})",
        meta_table,
        placeholder(backend, 1),
        placeholder(backend, 2)
    );
    match backend {
        DatabaseBackend::MySql => format!(
            "{} ON DUPLICATE KEY UPDATE meta_value = VALUES(meta_value)",
            insert
        ),
        _ => format!(
            "{} ON CONFLICT (meta_key) DO UPDATE SET meta_value = excluded.meta_value",
            insert
        ),
    }
}

/// 表结构管理器
pub struct SchemaManager<'a> {
    conn: &'a DatabaseConnection,
    backend: DatabaseBackend,
    items_table: &'a str,
    meta_table: &'a str,
}

impl<'a> SchemaManager<'a> {
    pub fn new(conn: &'a DatabaseConnection, items_table: &'a str, meta_table: &'a str) -> Self {
        Self {
            conn,
            backend: conn.get_database_backend(),
            items_table,
            meta_table,
        }
    }

    async fn execute(&self, sql: String) -> Result<()> {
        debug!("Schema statement: {}", sql);
        self.conn
            .execute(Statement::from_string(self.backend, sql))
            .await
            .map_err(|e| PitError::SchemaError(format!("SQL execution failed: {}", e)))?;
        Ok(())
    }

    fn items(&self) -> String {
        quote_identifier(self.backend, self.items_table)
    }

    fn meta(&self) -> String {
        quote_identifier(self.backend, self.meta_table)
    }

    async fn create_meta_table(&self) -> Result<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (meta_key VARCHAR(191) NOT NULL PRIMARY KEY, meta_value TEXT NOT NULL)",
            self.meta()
        );
        self.execute(sql).await
    }

    /// 读取已安装的版本号，未安装时返回 `"0"`
    pub async fn installed_version(&self) -> Result<String> {
        self.create_meta_table().await?;

        let sql = format!(
            "SELECT meta_value FROM {} WHERE meta_key = {}",
            self.meta(),
            placeholder(self.backend, 1)
        );
        let row = self
            .conn
            .query_one(Statement::from_sql_and_values(
                self.backend,
                sql,
                vec![Value::from(VERSION_META_KEY)],
            ))
            .await?;

        match row {
            Some(row) => Ok(row.try_get::<String>("", "meta_value")?),
            None => Ok("0".to_string()),
        }
    }

    async fn create_items_table(&self) -> Result<()> {
        let sql = match self.backend {
            DatabaseBackend::MySql => format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 item_id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY, \
                 item_group VARCHAR({len}) NOT NULL, \
                 item_key VARCHAR({len}) NOT NULL, \
                 item_value LONGTEXT NOT NULL)",
                self.items(),
                len = KEY_COLUMN_LENGTH
            ),
            DatabaseBackend::Postgres => format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 item_id BIGSERIAL PRIMARY KEY, \
                 item_group VARCHAR({len}) NOT NULL, \
                 item_key VARCHAR({len}) NOT NULL, \
                 item_value TEXT NOT NULL)",
                self.items(),
                len = KEY_COLUMN_LENGTH
            ),
            DatabaseBackend::Sqlite => format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 item_id INTEGER PRIMARY KEY AUTOINCREMENT, \
                 item_group VARCHAR({len}) NOT NULL, \
                 item_key VARCHAR({len}) NOT NULL, \
                 item_value TEXT NOT NULL)",
                self.items(),
                len = KEY_COLUMN_LENGTH
            ),
        };
        self.execute(sql).await
    }

    async fn ensure_group_key_index(&self) -> Result<()> {
        let index_name = format!("{}_{}", self.items_table, GROUP_KEY_INDEX);

        match self.backend {
            DatabaseBackend::MySql => {
                // MySQL 不支持 CREATE INDEX IF NOT EXISTS
                let existing = self
                    .conn
                    .query_one(Statement::from_sql_and_values(
                        self.backend,
                        "SELECT index_name FROM information_schema.statistics \
                         WHERE table_schema = DATABASE() AND table_name = ? AND index_name = ? \
                         LIMIT 1"
                            .to_string(),
                        vec![
                            Value::from(self.items_table),
                            Value::from(index_name.clone()),
                        ],
                    ))
                    .await?;
                if existing.is_none() {
                    self.execute(format!(
                        "ALTER TABLE {} ADD INDEX {} (item_group, item_key)",
                        self.items(),
                        quote_identifier(self.backend, &index_name)
                    ))
                    .await?;
                }
                Ok(())
            }
            _ => {
                self.execute(format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {} (item_group, item_key)",
                    quote_identifier(self.backend, &index_name),
                    self.items()
                ))
                .await
            }
        }
    }

    /// 写入版本号
    ///
    /// 单条 upsert，多个进程同时初始化空库时不会因主键冲突失败。
    async fn persist_version(&self, version: &str) -> Result<()> {
        let sql = upsert_version_sql(self.backend, &self.meta());
        self.conn
            .execute(Statement::from_sql_and_values(
                self.backend,
                sql,
                vec![Value::from(VERSION_META_KEY), Value::from(version)],
            ))
            .await?;
        Ok(())
    }

    /// 升级到当前版本
    ///
    /// 已是当前版本时不做任何修改；无法识别的版本号返回 [`PitError::SchemaError`]。
    pub async fn upgrade(&self) -> Result<()> {
        let installed = self.installed_version().await?;

        match installed.as_str() {
            v if v == CURRENT_SCHEMA_VERSION => {
                debug!("Schema already at version {}", v);
                return Ok(());
            }
            "0" | "" => {
                info!("Creating table {}", self.items_table);
                self.create_items_table().await?;
                self.ensure_group_key_index().await?;
            }
            "1" => {
                info!(
                    "Upgrading table {} from version 1 to {}",
                    self.items_table, CURRENT_SCHEMA_VERSION
                );
                self.create_items_table().await?;
                self.ensure_group_key_index().await?;
            }
            other => {
                return Err(PitError::SchemaError(format!(
                    "Unrecognized schema version '{}' for table {} (expected at most {})",
                    other, self.items_table, CURRENT_SCHEMA_VERSION
                )));
            }
        }

        self.persist_version(CURRENT_SCHEMA_VERSION).await?;
        info!(
            "Schema for {} is now at version {}",
            self.items_table, CURRENT_SCHEMA_VERSION
        );
        Ok(())
    }
}
