//! 能力探测 trait：下载开始前确认文件大小与 Range 支持。
//!
//! 默认实现为 [`HeadProbe`](crate::internal::downloader::impl_traits::impl_capability_probe::HeadProbe)，
//! 需要自定义探测方式（例如走缓存的元数据）时实现本 trait，通过下载器的 `with_probe` 注册。

use async_trait::async_trait;
use thiserror::Error;

use crate::internal::downloader::structs::content_descriptor::ContentDescriptor;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("探测请求失败: {0}")]
    Request(#[from] reqwest::Error),

    #[error("响应缺少 Content-Length")]
    MissingContentLength,

    #[error("Content-Length 无法解析: {0}")]
    InvalidContentLength(String),
}

#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    /// 探测远程文件。服务器不支持 Range 时返回 `supports_range = false`，而不是错误。
    async fn probe(&self, url: &str) -> Result<ContentDescriptor, ProbeError>;
}
