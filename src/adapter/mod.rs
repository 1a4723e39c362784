//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 通用缓存适配器
//!
//! 在任意 [`PitOps`] 客户端之上提供单分组的 get/set/delete/clear/has
//! 以及批量操作接口。分组和键都带命名空间前缀，过长的键被替换为哈希。

use crate::client::PitOps;
use crate::config::AdapterConfig;
use crate::error::Result;
use crate::utils::validate_cache_key;
use serde_json::Value;

/// 把适配器使用的键映射为存储键
///
/// 先加前缀，超过 `max_len` 时替换为 murmur3 x64-128 的十六进制摘要。
pub fn storage_key(prefix: &str, key: &str, max_len: usize) -> Result<String> {
    let prefixed = format!("{}{}", prefix, key);
    if prefixed.len() <= max_len {
        return Ok(prefixed);
    }

    let mut bytes = prefixed.as_bytes();
    let hash = murmur3::murmur3_x64_128(&mut bytes, 0)?;
    Ok(format!("{:032x}", hash))
}

/// 单分组缓存适配器
pub struct GroupCache<'a, C: PitOps + ?Sized> {
    client: &'a C,
    group: String,
    prefix: String,
    max_key_length: usize,
}

impl<'a, C: PitOps + ?Sized> GroupCache<'a, C> {
    /// 使用默认配置创建适配器
    pub fn new(group: &str, client: &'a C) -> Self {
        Self::with_config(group, client, &AdapterConfig::default())
    }

    pub fn with_config(group: &str, client: &'a C, config: &AdapterConfig) -> Self {
        Self {
            client,
            // 分组带前缀，clear() 不会影响其他数据
            group: format!("{}{}", config.namespace_prefix, group),
            prefix: config.namespace_prefix.clone(),
            max_key_length: config.max_key_length,
        }
    }

    /// 实际使用的存储分组
    pub fn group(&self) -> &str {
        &self.group
    }

    fn map_key(&self, key: &str) -> Result<String> {
        validate_cache_key(key)?;
        storage_key(&self.prefix, key, self.max_key_length)
    }

    /// 读取值，不存在（或存储的是 null）时返回 `default`
    pub async fn get(&self, key: &str, default: Value) -> Result<Value> {
        let key = self.map_key(key)?;
        Ok(self
            .client
            .get(&key, &self.group)
            .await
            .filter(|v| !v.is_null())
            .unwrap_or(default))
    }

    pub async fn set(&self, key: &str, value: Value) -> Result<()> {
        let key = self.map_key(key)?;
        self.client.set(&key, value, &self.group).await;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let key = self.map_key(key)?;
        self.client.delete(&key, &self.group).await;
        Ok(())
    }

    /// 清空本适配器的分组
    pub async fn clear(&self) {
        self.client.flush_group(&self.group).await;
    }

    /// 批量读取，结果保持输入顺序
    ///
    /// 任一键非法时不执行任何读取。
    pub async fn get_multiple<I, K>(&self, keys: I, default: Value) -> Result<Vec<(String, Value)>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let keys: Vec<String> = keys.into_iter().map(|k| k.as_ref().to_string()).collect();
        for key in &keys {
            validate_cache_key(key)?;
        }

        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let value = self.get(&key, default.clone()).await?;
            out.push((key, value));
        }
        Ok(out)
    }

    /// 批量写入
    pub async fn set_multiple<I, K>(&self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let values: Vec<(K, Value)> = values.into_iter().collect();
        for (key, _) in &values {
            validate_cache_key(key.as_ref())?;
        }
        for (key, value) in values {
            self.set(key.as_ref(), value).await?;
        }
        Ok(())
    }

    /// 批量删除
    pub async fn delete_multiple<I, K>(&self, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let keys: Vec<K> = keys.into_iter().collect();
        for key in &keys {
            validate_cache_key(key.as_ref())?;
        }
        for key in keys {
            self.delete(key.as_ref()).await?;
        }
        Ok(())
    }

    /// 键是否存在（存储的 null 视为不存在）
    pub async fn has(&self, key: &str) -> Result<bool> {
        let key = self.map_key(key)?;
        Ok(self
            .client
            .get(&key, &self.group)
            .await
            .is_some_and(|v| !v.is_null()))
    }
}
