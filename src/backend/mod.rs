//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了客户端使用的进程内缓存层。

pub mod items;

pub use items::{CachedValue, Items};
