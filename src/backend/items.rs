//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了进程内的条目缓存，按 (group, key) 保存已读取或已确认不存在的值。

use ahash::AHashMap;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

/// 缓存的值，`None` 表示已确认存储中不存在该键
pub type CachedValue = Option<Value>;

/// 进程内条目缓存
///
/// 没有容量上限和过期策略，生命周期与所属客户端一致。
/// 外层按分组索引，使整组失效为一次操作。
#[derive(Debug, Default)]
pub struct Items {
    groups: DashMap<String, AHashMap<String, CachedValue>>,
}

impl Items {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 检查条目是否存在
    ///
    /// 只关心条目是否存在，与缓存的值（包括“不存在”标记）无关。
    pub fn has(&self, key: &str, group: &str) -> bool {
        self.groups
            .get(group)
            .is_some_and(|entries| entries.contains_key(key))
    }

    /// 获取缓存值的独立副本
    ///
    /// # Panics
    ///
    /// 条目不存在时 panic，调用前必须先用 [`Items::has`] 确认。
    pub fn get(&self, key: &str, group: &str) -> CachedValue {
        let entries = self
            .groups
            .get(group)
            .expect("Items::get called for a group that has() did not confirm");
        entries[key].clone()
    }

    /// 添加或覆盖缓存值
    pub fn add(&self, key: &str, value: CachedValue, group: &str) {
        debug!(
            "Items add: group={}, key={}, present={}",
            group,
            key,
            value.is_some()
        );
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// 移除单个条目
    pub fn remove(&self, key: &str, group: &str) {
        if let Some(mut entries) = self.groups.get_mut(group) {
            entries.remove(key);
        }
    }

    /// 移除整个分组
    pub fn remove_group(&self, group: &str) {
        if self.groups.remove(group).is_some() {
            debug!("Items remove_group: group={}", group);
        }
    }

    /// 缓存的条目总数
    pub fn len(&self) -> usize {
        self.groups.iter().map(|entries| entries.len()).sum()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
