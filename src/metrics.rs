//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了存储系统的指标收集功能。

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{span, Level};

/// 指标收集器
///
/// 用于收集和存储各客户端的运行时指标
#[derive(Clone, Debug, Default)]
pub struct Metrics {
    /// 请求总数统计
    /// key: "service:layer:op:result"
    pub requests_total: Arc<Mutex<HashMap<String, u64>>>,
    /// 操作耗时（累积时间和计数，用于计算平均值）
    /// key: "service:layer:op" -> (total_duration_secs, count)
    pub operation_duration: Arc<Mutex<HashMap<String, (f64, u64)>>>,
}

lazy_static! {
    /// 全局指标实例
    pub static ref GLOBAL_METRICS: Metrics = Metrics::default();
}

impl Metrics {
    /// 记录请求指标
    ///
    /// # 参数
    ///
    /// * `service` - 服务名称
    /// * `layer` - 层（memory/store/speculative）
    /// * `op` - 操作类型（get/set/delete/flush/preload）
    /// * `result` - 操作结果（hit/miss/ok/error/skipped）
    pub fn record_request(&self, service: &str, layer: &str, op: &str, result: &str) {
        let span = span!(Level::TRACE, "pit_request", service, layer, op, result);
        let _enter = span.enter();
        let key = format!("{}:{}:{}:{}", service, layer, op, result);
        let mut map = self
            .requests_total
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *map.entry(key).or_insert(0) += 1;
    }

    /// 记录操作耗时
    pub fn record_duration(&self, service: &str, layer: &str, op: &str, duration_secs: f64) {
        let key = format!("{}:{}:{}", service, layer, op);
        let mut map = self
            .operation_duration
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = map.entry(key).or_insert((0.0, 0));
        entry.0 += duration_secs;
        entry.1 += 1;
    }

    /// 读取单个请求计数
    pub fn request_count(&self, service: &str, layer: &str, op: &str, result: &str) -> u64 {
        let key = format!("{}:{}:{}:{}", service, layer, op, result);
        self.requests_total
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .copied()
            .unwrap_or(0)
    }

    /// 清空所有指标
    pub fn reset(&self) {
        self.requests_total
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.operation_duration
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// 获取指标字符串
///
/// 将所有指标格式化为字符串返回，用于监控系统采集
pub fn get_metrics_string() -> String {
    let metrics = &GLOBAL_METRICS;
    let reqs = metrics
        .requests_total
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    let dur = metrics
        .operation_duration
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    let mut req_keys: Vec<_> = reqs.keys().collect();
    req_keys.sort();

    let mut output = String::new();
    for k in req_keys {
        output.push_str(&format!(
            "pit_requests_total{{labels=\"{}\"}} {}\n",
            k, reqs[k]
        ));
    }
    for (k, (total, count)) in dur.iter() {
        let parts: Vec<&str> = k.split(':').collect();
        if parts.len() == 3 {
            output.push_str(&format!(
                "pit_operation_duration_seconds_sum{{service=\"{}\", layer=\"{}\", operation=\"{}\"}} {}\n",
                parts[0], parts[1], parts[2], total
            ));
            output.push_str(&format!(
                "pit_operation_duration_seconds_count{{service=\"{}\", layer=\"{}\", operation=\"{}\"}} {}\n",
                parts[0], parts[1], parts[2], count
            ));
        }
    }
    output
}
