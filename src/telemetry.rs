//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了日志和链路追踪的初始化。

use opentelemetry::global;
use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::trace::TracerProvider as SdkTracerProvider;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// 默认日志过滤规则
pub const DEFAULT_LOG_FILTER: &str = "info";

/// 初始化日志和 OpenTelemetry Tracing
///
/// 此函数应该在应用程序启动时调用一次。过滤规则优先使用 `filter`，
/// 其次是 `RUST_LOG`，最后是 [`DEFAULT_LOG_FILTER`]。
/// 全局 subscriber 已存在时不会覆盖。
///
/// # 参数
///
/// * `service_name` - 服务名称，作为 tracer 名称
/// * `filter` - 日志过滤规则
pub fn init_tracing(service_name: &str, filter: Option<&str>) {
    let env_filter = match filter {
        Some(f) => EnvFilter::new(f),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    // 没有配置 exporter，span 只在进程内传播
    let provider = SdkTracerProvider::builder().build();
    global::set_tracer_provider(provider.clone());
    let tracer = provider.tracer(service_name.to_string());

    let _ = Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init();
}
