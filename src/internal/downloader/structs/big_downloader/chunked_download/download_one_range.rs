//! 分片下载：单个 worker，一个分段读取器配一个定位写入器，读到结束为止。

use std::fs::File;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::internal::downloader::structs::download_error::DownloadError;
use crate::internal::downloader::structs::positional_writer::{BytesWrittenCallback, PositionalWriter};
use crate::internal::downloader::structs::range_reader::{RangeReader, RangeReaderParams};
use crate::internal::downloader::structs::range_segment::RangeSegment;

/// 攒够这么多字节才交给阻塞线程池写一次
pub(crate) const WRITE_BATCH_SIZE: usize = 256 * 1024;

/// 执行单段 Range 下载时的参数（形参超过 3 个，用 struct 承载）。
pub(crate) struct DownloadOneRangeParams {
    pub client: Client,
    pub url: Arc<str>,
    pub segment: RangeSegment,
    pub file: Arc<File>,
    pub bytes_done: Arc<AtomicU64>,
    pub read_timeout: Duration,
    pub cancel: CancellationToken,
}

/// 把分段 `[start, end)` 的数据逐块写到文件的对应偏移，返回写入的字节数。
///
/// 数据先攒到 [`WRITE_BATCH_SIZE`] 再写入。分段数据比区间短或长都视为失败；
/// 超出区间的字节不会写入，以免覆盖相邻分段。
pub(crate) async fn download_one_range(params: DownloadOneRangeParams) -> Result<u64, DownloadError> {
    let DownloadOneRangeParams {
        client,
        url,
        segment,
        file,
        bytes_done,
        read_timeout,
        cancel,
    } = params;
    let index = segment.index;

    if segment.is_empty() {
        return Err(DownloadError::InvalidRange {
            index,
            start: segment.start,
            end: segment.end,
        });
    }

    let mut reader = RangeReader::open(RangeReaderParams {
        client: &client,
        url: &url,
        segment,
        read_timeout,
        cancel,
    })
    .await?;

    let on_written: BytesWrittenCallback = Arc::new(move |n| {
        bytes_done.fetch_add(n, Ordering::AcqRel);
    });
    let writer = Arc::new(PositionalWriter::new(file, segment.start, Some(on_written)));

    let expected = segment.len();
    let mut received: u64 = 0;
    let mut written: u64 = 0;
    let mut pending = BytesMut::new();

    while let Some(chunk) = reader.read().await? {
        received += chunk.len() as u64;
        if received > expected {
            reader.close();
            return Err(DownloadError::SegmentLengthMismatch {
                index,
                expected,
                actual: received,
            });
        }
        pending.extend_from_slice(&chunk);
        if pending.len() >= WRITE_BATCH_SIZE {
            written += write_chunk(&writer, pending.split().freeze()).await? as u64;
        }
    }
    reader.close();

    if !pending.is_empty() {
        written += write_chunk(&writer, pending.split().freeze()).await? as u64;
    }

    if written != expected {
        return Err(DownloadError::SegmentLengthMismatch {
            index,
            expected,
            actual: written,
        });
    }

    debug!(target: "download", index, written, "分段下载完成");
    Ok(written)
}

/// 文件写入放到阻塞线程池执行，不占用异步 worker 线程。
async fn write_chunk(writer: &Arc<PositionalWriter>, chunk: Bytes) -> Result<usize, DownloadError> {
    let writer = Arc::clone(writer);
    tokio::task::spawn_blocking(move || writer.write(&chunk))
        .await?
        .map_err(DownloadError::WriteFile)
}
