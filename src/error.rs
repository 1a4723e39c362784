//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了存储系统的错误类型。

use thiserror::Error;

/// 存储系统错误类型枚举
///
/// 客户端的公开操作不会把这些错误抛给调用方，
/// 它们只在存储层、配置加载、适配器和CLI中出现。
#[derive(Error, Debug)]
pub enum PitError {
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// 数据库连接或访问错误
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Sea-ORM数据库错误
    #[error("Sea-ORM error: {0}")]
    SeaOrmError(#[from] sea_orm::DbErr),

    /// 表结构升级失败
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// 非法的缓存键
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// 无法解析的请求URI
    #[error("Invalid request URI: {0}")]
    InvalidUri(#[from] url::ParseError),

    /// IO错误
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// 操作结果类型别名
pub type Result<T> = std::result::Result<T, PitError>;
