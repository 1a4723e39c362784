//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了请求标识。预加载客户端用它作为读取记录的键。

use crate::error::Result;
use std::fmt;
use url::{form_urlencoded, ParseError, Url};

/// 提供稳定请求标识的特征
///
/// 同一个逻辑请求在不同生命周期中必须返回相同的字符串。
pub trait RequestIdentity {
    fn stable_identity(&self) -> String;
}

impl RequestIdentity for str {
    fn stable_identity(&self) -> String {
        self.to_string()
    }
}

impl RequestIdentity for String {
    fn stable_identity(&self) -> String {
        self.clone()
    }
}

impl<T: RequestIdentity + ?Sized> RequestIdentity for &T {
    fn stable_identity(&self) -> String {
        (**self).stable_identity()
    }
}

/// 解析只有路径的URI时使用的基准地址，不出现在标识中
const RELATIVE_BASE: &str = "http://relative.invalid/";

/// 规范化的请求URI
///
/// scheme 和 host 转为小写，默认端口省略，路径段和查询参数的百分号编码统一，
/// 查询参数排序，片段丢弃，因此等价的URI得到相同的标识。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUri {
    scheme: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    path: String,
    query: Vec<(String, String)>,
}

impl RequestUri {
    /// 解析URI，接受绝对URI（`https://host/path?q`）或只有路径的形式（`/path?q`）
    pub fn parse(uri: &str) -> Result<Self> {
        let (url, absolute) = match Url::parse(uri) {
            Ok(url) => (url, true),
            Err(ParseError::RelativeUrlWithoutBase) => (Url::parse(RELATIVE_BASE)?.join(uri)?, false),
            Err(e) => return Err(e.into()),
        };

        let path = match url.path_segments() {
            Some(segments) => {
                let segments: Vec<String> = segments.map(normalize_segment).collect();
                format!("/{}", segments.join("/"))
            }
            None => url.path().to_string(),
        };

        let mut query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        query.sort();

        if !absolute {
            return Ok(Self {
                scheme: None,
                host: None,
                port: None,
                path,
                query,
            });
        }

        Ok(Self {
            scheme: Some(url.scheme().to_string()),
            host: url.host_str().map(str::to_string),
            // port() 对默认端口返回 None
            port: url.port(),
            path,
            query,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// 非默认端口
    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

/// 先解码再按统一规则编码，`%7E` 与 `~` 得到同一形式
fn normalize_segment(segment: &str) -> String {
    match urlencoding::decode(segment) {
        Ok(decoded) => urlencoding::encode(&decoded).into_owned(),
        Err(_) => segment.to_string(),
    }
}

impl fmt::Display for RequestUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.scheme, &self.host) {
            (Some(scheme), Some(host)) => {
                write!(f, "{}://{}", scheme, host)?;
                if let Some(port) = self.port {
                    write!(f, ":{}", port)?;
                }
            }
            (Some(scheme), None) => write!(f, "{}:", scheme)?,
            _ => {}
        }
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&self.query)
                .finish();
            write!(f, "?{}", query)?;
        }
        Ok(())
    }
}

impl RequestIdentity for RequestUri {
    fn stable_identity(&self) -> String {
        self.to_string()
    }
}
