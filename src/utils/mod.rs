//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 统一工具模块
//!
//! 提供CLI和库内部共用的输入验证工具

pub mod redaction;

use crate::error::PitError;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IDENTIFIER_RE: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid");
}

/// 最大标识符长度（表名前缀）
const MAX_IDENTIFIER_LENGTH: usize = 48;

/// 缓存键中保留的字符
const RESERVED_KEY_CHARS: &[char] = &['{', '}', '(', ')', '/', '\\', '@', ':'];

/// 验证SQL标识符是否安全
///
/// 只能包含字母、数字、下划线，且不能以数字开头。空字符串视为合法，
/// 表示不使用前缀。
pub fn validate_identifier(identifier: &str) -> Result<(), PitError> {
    if identifier.is_empty() {
        return Ok(());
    }

    if identifier.len() > MAX_IDENTIFIER_LENGTH {
        return Err(PitError::ConfigError(format!(
            "Identifier '{}' exceeds maximum length of {} characters",
            identifier, MAX_IDENTIFIER_LENGTH
        )));
    }

    if !IDENTIFIER_RE.is_match(identifier) {
        return Err(PitError::ConfigError(format!(
            "Invalid identifier '{}': only alphanumeric characters and underscores are allowed",
            identifier
        )));
    }

    Ok(())
}

/// 验证适配器层的缓存键
///
/// 键不能为空，也不能包含 `{}()/\@:` 中的任何字符。
pub fn validate_cache_key(key: &str) -> Result<(), PitError> {
    if key.is_empty() {
        return Err(PitError::InvalidKey("Cache key cannot be empty".to_string()));
    }

    if let Some(c) = key.chars().find(|c| RESERVED_KEY_CHARS.contains(c)) {
        return Err(PitError::InvalidKey(format!(
            "Cache key '{}' contains reserved character '{}'",
            key, c
        )));
    }

    Ok(())
}
