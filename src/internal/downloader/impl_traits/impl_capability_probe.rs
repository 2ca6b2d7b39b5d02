//! 基于 HEAD 请求的默认探测实现。

use async_trait::async_trait;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, HeaderMap};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::internal::downloader::structs::content_descriptor::ContentDescriptor;
use crate::internal::downloader::traits::capability_probe::{CapabilityProbe, ProbeError};

/// 发送 HEAD 请求，读取 `Content-Length` 与 `Accept-Ranges`。
///
/// 只有状态码为 200 且 `Accept-Ranges` 为 `bytes` 时才视为支持 Range。
#[derive(Debug, Clone)]
pub struct HeadProbe {
    client: Client,
}

impl HeadProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CapabilityProbe for HeadProbe {
    async fn probe(&self, url: &str) -> Result<ContentDescriptor, ProbeError> {
        let resp = self.client.head(url).send().await?;
        let status = resp.status();
        let headers = resp.headers();

        let accepts_bytes = headers
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("bytes"));

        let content_length = header_content_length(headers)?;

        debug!(target: "download", url, %status, content_length, accepts_bytes, "探测完成");

        Ok(ContentDescriptor {
            content_length,
            supports_range: status == StatusCode::OK && accepts_bytes,
        })
    }
}

/// HEAD 响应没有响应体，`Response::content_length` 取不到真实大小，只能读头部。
fn header_content_length(headers: &HeaderMap) -> Result<u64, ProbeError> {
    let raw = headers
        .get(CONTENT_LENGTH)
        .ok_or(ProbeError::MissingContentLength)?;
    let text = raw
        .to_str()
        .map_err(|_| ProbeError::InvalidContentLength(format!("{raw:?}")))?;
    text.trim()
        .parse::<u64>()
        .map_err(|_| ProbeError::InvalidContentLength(text.to_string()))
}
