//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了存储系统的配置结构和解析逻辑。

use crate::database::KEY_COLUMN_LENGTH;
use crate::error::{PitError, Result};
use crate::utils::validate_identifier;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_VERSION: u32 = 1;
pub const CONFIG_VERSION_FIELD: &str = "config_version";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_version: Option<u32>,
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub speculative: SpeculativeConfig,
    #[serde(default)]
    pub adapter: AdapterConfig,
}

/// 全局配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct GlobalConfig {
    /// 服务名称，用于日志和指标
    pub service_name: String,
    /// 序列化类型
    pub serialization: SerializationType,
    /// 是否启用指标收集
    pub enable_metrics: bool,
    /// 日志过滤规则，未设置时读取 `RUST_LOG`
    pub log_filter: Option<String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            service_name: "oxpit".to_string(),
            serialization: SerializationType::Json,
            enable_metrics: true,
            log_filter: None,
        }
    }
}

/// 序列化类型枚举
#[derive(Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SerializationType {
    /// JSON序列化
    #[default]
    Json,
}

/// 数据库配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 连接字符串（可能包含密码）
    pub url: SecretString,
    /// 表名前缀
    pub table_prefix: String,
    /// 连接池最大连接数
    pub max_connections: u32,
    /// 连接超时时间（毫秒）
    pub connect_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: SecretString::new("sqlite:./data/oxpit.db".to_string().into()),
            table_prefix: "oxpit_".to_string(),
            max_connections: 5,
            connect_timeout_ms: 5000,
        }
    }
}

/// 预加载配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct SpeculativeConfig {
    /// 是否为每个请求启用预加载
    pub enabled: bool,
    /// 每次批量查询的最大键数
    pub preload_chunk_size: usize,
}

impl Default for SpeculativeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            preload_chunk_size: 500,
        }
    }
}

/// 通用缓存适配器配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct AdapterConfig {
    /// 分组和键的命名空间前缀
    pub namespace_prefix: String,
    /// 超过该长度的键会被哈希
    pub max_key_length: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            namespace_prefix: "_kv_".to_string(),
            max_key_length: 172,
        }
    }
}

impl Config {
    /// 从 TOML 字符串解析并验证配置
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)
            .map_err(|e| PitError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate().map_err(PitError::ConfigError)?;
        Ok(config)
    }

    /// 从文件读取配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            PitError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// 验证配置
    ///
    /// 检查配置的有效性，确保所有必需的字段都已设置，并且值在合理范围内
    pub fn validate(&self) -> std::result::Result<(), String> {
        // 验证配置版本
        if let Some(version) = &self.config_version {
            if *version > CONFIG_VERSION {
                return Err(format!(
                    "Configuration version {} is not supported. Current version is {}.",
                    version, CONFIG_VERSION
                ));
            }
        }

        if self.global.service_name.is_empty() {
            return Err("Service name cannot be empty".to_string());
        }

        if self.global.service_name.len() > 64 {
            return Err(format!(
                "Service name '{}' exceeds maximum length of 64 characters",
                self.global.service_name
            ));
        }

        // 验证数据库配置
        if self.database.url.expose_secret().is_empty() {
            return Err("Database url cannot be empty".to_string());
        }

        validate_identifier(&self.database.table_prefix).map_err(|e| e.to_string())?;

        if !(1..=100).contains(&self.database.max_connections) {
            return Err("Database max_connections must be between 1 and 100".to_string());
        }

        if !(100..=60000).contains(&self.database.connect_timeout_ms) {
            return Err("Database connect_timeout_ms must be between 100 and 60000 ms".to_string());
        }

        // 验证预加载配置
        if self.speculative.preload_chunk_size == 0 || self.speculative.preload_chunk_size > 10000
        {
            return Err("Speculative preload_chunk_size must be between 1 and 10000".to_string());
        }

        // 验证适配器配置
        // 哈希后的键为32个字符，上限为 item_key 列宽
        if !(32..=KEY_COLUMN_LENGTH).contains(&self.adapter.max_key_length) {
            return Err(format!(
                "Adapter max_key_length must be between 32 and {}",
                KEY_COLUMN_LENGTH
            ));
        }

        if let Some(c) = self
            .adapter
            .namespace_prefix
            .chars()
            .find(|c| "{}()/\\@:".contains(*c))
        {
            return Err(format!(
                "Adapter namespace_prefix contains reserved character '{}'",
                c
            ));
        }

        Ok(())
    }
}
