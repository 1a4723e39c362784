//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了分组遍历时产生的条目快照。

use super::PitOps;
use serde_json::Value;
use std::fmt;

/// 一个存储条目的快照
///
/// 由 [`PitOps::group`] 产生，保存产生它的客户端引用以便删除自身。
pub struct Item<'a> {
    key: String,
    value: Value,
    group: String,
    client: &'a dyn PitOps,
}

impl<'a> Item<'a> {
    pub fn new(key: String, value: Value, group: String, client: &'a dyn PitOps) -> Self {
        Self {
            key,
            value,
            group,
            client,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// 取出值
    pub fn into_value(self) -> Value {
        self.value
    }

    /// 通过产生该条目的客户端删除它
    pub async fn delete(&self) {
        self.client.delete(&self.key, &self.group).await;
    }
}

impl fmt::Debug for Item<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("group", &self.group)
            .finish()
    }
}
