//! 分段读取器：发起单段 Range 请求，提供可被「单次读取超时」和「共享取消信号」打断的读取。
//!
//! 每次 [`RangeReader::read`] 都重新计时；超时或取消时立即关闭响应体（连接随之释放），
//! 正在进行的读取 future 被直接丢弃，不会残留后台任务。

use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::header::RANGE;
use reqwest::{Client, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::download_error::DownloadError;
use super::range_segment::RangeSegment;

/// 打开分段读取器时的参数（形参超过 3 个，用 struct 承载）。
pub struct RangeReaderParams<'a> {
    pub client: &'a Client,
    pub url: &'a str,
    pub segment: RangeSegment,
    pub read_timeout: Duration,
    pub cancel: CancellationToken,
}

/// 单次读取的竞争结果。
enum ReadOutcome {
    Cancelled,
    TimedOut,
    Polled(Option<reqwest::Result<Bytes>>),
}

pub struct RangeReader {
    segment: RangeSegment,
    read_timeout: Duration,
    cancel: CancellationToken,
    body: Option<BoxStream<'static, reqwest::Result<Bytes>>>,
}

impl RangeReader {
    /// 发起 `Range: bytes=start-(end-1)` 请求，等待响应头。
    ///
    /// 等待响应头同样受 `read_timeout` 与取消信号约束。服务器必须返回 206；
    /// 只有分段本身就是整个文件时才接受 200。
    pub async fn open(params: RangeReaderParams<'_>) -> Result<Self, DownloadError> {
        let RangeReaderParams {
            client,
            url,
            segment,
            read_timeout,
            cancel,
        } = params;
        let index = segment.index;

        let request = client
            .get(url)
            .header(RANGE, segment.range_header())
            .build()
            .map_err(|source| DownloadError::CreateRequest { index, source })?;

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            res = tokio::time::timeout(read_timeout, client.execute(request)) => match res {
                Err(_) => {
                    return Err(DownloadError::ReadTimeout {
                        index,
                        timeout: read_timeout,
                    })
                }
                Ok(res) => res.map_err(|source| DownloadError::Request { index, source })?,
            },
        };

        let status = response.status();
        let whole_file = segment.start == 0 && response.content_length() == Some(segment.len());
        if status != StatusCode::PARTIAL_CONTENT && !(status == StatusCode::OK && whole_file) {
            return Err(DownloadError::RangeNotHonored { index, status });
        }

        debug!(target: "download", index, start = segment.start, end = segment.end, %status, "分段连接已建立");

        Ok(Self {
            segment,
            read_timeout,
            cancel,
            body: Some(response.bytes_stream().boxed()),
        })
    }

    pub fn segment(&self) -> RangeSegment {
        self.segment
    }

    /// 读取下一块数据；`Ok(None)` 表示响应体已结束。
    ///
    /// 三者先到先得：数据到达、`read_timeout` 到期、共享取消信号触发。
    /// 后两种情况会先关闭读取器再返回错误。
    pub async fn read(&mut self) -> Result<Option<Bytes>, DownloadError> {
        let index = self.segment.index;
        let Some(body) = self.body.as_mut() else {
            return Err(DownloadError::ReaderClosed { index });
        };

        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => ReadOutcome::Cancelled,
            res = tokio::time::timeout(self.read_timeout, body.next()) => match res {
                Ok(polled) => ReadOutcome::Polled(polled),
                Err(_) => ReadOutcome::TimedOut,
            },
        };

        match outcome {
            ReadOutcome::Polled(Some(Ok(chunk))) => Ok(Some(chunk)),
            ReadOutcome::Polled(None) => Ok(None),
            ReadOutcome::Polled(Some(Err(source))) => {
                self.close();
                Err(DownloadError::ReadBody { index, source })
            }
            ReadOutcome::TimedOut => {
                self.close();
                Err(DownloadError::ReadTimeout {
                    index,
                    timeout: self.read_timeout,
                })
            }
            ReadOutcome::Cancelled => {
                self.close();
                Err(DownloadError::Cancelled)
            }
        }
    }

    /// 关闭响应体并释放连接；可重复调用。
    pub fn close(&mut self) {
        if self.body.take().is_some() {
            debug!(target: "download", index = self.segment.index, "分段读取器已关闭");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.body.is_none()
    }
}

impl Drop for RangeReader {
    fn drop(&mut self) {
        self.close();
    }
}
