//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 连接字符串规范化模块
//!
//! 提供数据库连接字符串的解析和规范化功能。
//! 支持 SQLite、MySQL 和 PostgreSQL 三种数据库类型。

use super::DatabaseType;
use crate::error::{PitError, Result};
use std::path::Path;

/// 连接字符串解析结果
///
/// 只解析存储层需要的部分：数据库类型、SQLite 文件路径和参数
#[derive(Debug, Clone)]
pub struct ParsedConnectionString<'a> {
    /// 数据库类型
    pub db_type: DatabaseType,
    /// 原始连接字符串
    pub original: &'a str,
    /// SQLite 文件路径
    pub file_path: Option<String>,
    /// 是否为内存数据库
    pub is_memory: bool,
    /// 连接参数
    pub params: Vec<(String, String)>,
}

impl<'a> ParsedConnectionString<'a> {
    /// 解析连接字符串
    pub fn parse(s: &'a str) -> Self {
        let db_type = DatabaseType::from_url(s);
        if db_type != DatabaseType::SQLite {
            return Self {
                db_type,
                original: s,
                file_path: None,
                is_memory: false,
                params: extract_params(s.split_once('?').map(|(_, p)| p).unwrap_or("")),
            };
        }

        let is_memory = s.contains(":memory:");
        let path_with_params = s.strip_prefix("sqlite:").unwrap_or(s);
        let (path, params) = match path_with_params.split_once('?') {
            Some((path, params)) => (path, extract_params(params)),
            None => (path_with_params, Vec::new()),
        };

        let file_path = if is_memory {
            None
        } else if path.starts_with("///") {
            Some(format!("/{}", path.trim_start_matches("///")))
        } else if path.starts_with("//") {
            Some(format!("/{}", path.trim_start_matches("//")))
        } else if path.starts_with('/') || path.starts_with("./") || path.starts_with("../") {
            Some(path.to_string())
        } else {
            Some(format!("./{}", path))
        };

        Self {
            db_type,
            original: s,
            file_path,
            is_memory,
            params,
        }
    }
}

/// 解析 `a=1&b=2` 形式的参数
fn extract_params(s: &str) -> Vec<(String, String)> {
    s.split('&')
        .filter(|p| !p.is_empty())
        .map(|p| match p.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (p.to_string(), String::new()),
        })
        .collect()
}

/// 规范化连接字符串
///
/// SQLite 统一为 `sqlite:<path>` 或 `sqlite::memory:`；
/// MySQL 和 PostgreSQL 保持原样。
pub fn normalize_connection_string(s: &str) -> String {
    let parsed = ParsedConnectionString::parse(s);
    if parsed.db_type != DatabaseType::SQLite {
        return s.to_string();
    }

    let params = if parsed.params.is_empty() {
        String::new()
    } else {
        let joined: Vec<String> = parsed
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("?{}", joined.join("&"))
    };

    match &parsed.file_path {
        Some(path) => format!("sqlite:{}{}", path, params),
        None => format!("sqlite::memory:{}", params),
    }
}

/// 是否为 SQLite 内存数据库
pub fn is_memory_database(s: &str) -> bool {
    ParsedConnectionString::parse(s).is_memory
}

/// 确保数据库目录存在
///
/// # 返回
///
/// 规范化后的连接字符串
pub fn ensure_database_directory(connection_string: &str) -> Result<String> {
    let parsed = ParsedConnectionString::parse(connection_string);

    if let (DatabaseType::SQLite, Some(path)) = (parsed.db_type, &parsed.file_path) {
        let full_path = if path.starts_with('/') {
            Path::new(path).to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        if let Some(parent) = full_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PitError::DatabaseError(format!(
                        "无法创建数据库目录 {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
    }

    Ok(normalize_connection_string(connection_string))
}
