//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了值的编解码边界。存储层只接触编码后的文本，
//! 不依赖值的具体结构。

pub mod json;

use crate::error::Result;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

pub use json::JsonSerializer;

/// 序列化器特征
///
/// 定义序列化和反序列化操作的接口
pub trait Serializer: Send + Sync {
    /// 序列化值为文本
    fn serialize<T: Serialize>(&self, value: &T) -> Result<String>;

    /// 从文本反序列化值
    fn deserialize<T: DeserializeOwned>(&self, data: &str) -> Result<T>;
}

/// 序列化器枚举
///
/// 用于在客户端之间按值传递序列化器
#[derive(Clone, Debug)]
pub enum SerializerEnum {
    Json(JsonSerializer),
}

impl Default for SerializerEnum {
    fn default() -> Self {
        SerializerEnum::Json(JsonSerializer::new())
    }
}

impl SerializerEnum {
    /// 宽松解码
    ///
    /// 无法解析的存储内容按原始字符串返回，从不报错。
    pub fn decode_lenient(&self, data: &str) -> Value {
        self.deserialize::<Value>(data)
            .unwrap_or_else(|_| Value::String(data.to_string()))
    }
}

impl Serializer for SerializerEnum {
    fn serialize<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            SerializerEnum::Json(s) => s.serialize(value),
        }
    }

    fn deserialize<T: DeserializeOwned>(&self, data: &str) -> Result<T> {
        match self {
            SerializerEnum::Json(s) => s.deserialize(data),
        }
    }
}
