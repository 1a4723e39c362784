//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! oxpit - 分组持久化键值存储
//!
//! 提供带进程内读穿透缓存的持久化存储客户端，以及按请求学习读取模式、
//! 在同一请求再次出现时批量预加载的预加载客户端。

#![doc(html_root_url = "https://docs.rs/oxpit/0.1.0")]

pub use serde;
pub use serde::{Deserialize, Serialize};
pub use serde_json;
pub use tokio;

pub mod adapter;
pub mod backend;
pub mod cli;
pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod manager;
pub mod metrics;
pub mod request;
pub mod serialization;
pub mod telemetry;
pub mod utils;

// Re-export commonly used items
pub use adapter::GroupCache;
pub use client::{Item, PitExt, PitOps, ReadyState, SpeculativeClient, StoreClient};
pub use config::Config;
pub use database::{PitStore, SeaOrmStore};
pub use error::{PitError, Result};
pub use manager::PitManager;
pub use request::{RequestIdentity, RequestUri};

/// oxpit 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
