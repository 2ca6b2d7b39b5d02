//! 分片下载：为每个分段 spawn 一个 worker，以及等待全部 worker 结束并汇总首个错误。

use std::fs::File;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use reqwest::Client;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span, warn};

use crate::internal::downloader::structs::download_error::DownloadError;
use crate::internal::downloader::structs::range_segment::RangeSegment;

use super::download_one_range::{DownloadOneRangeParams, download_one_range};

/// 生成并 spawn 分段任务时的参数（形参超过 3 个，用 struct 承载）。
pub(super) struct SpawnRangeTasksParams<'a> {
    pub client: &'a Client,
    pub url: &'a str,
    pub segments: Vec<RangeSegment>,
    pub file: &'a Arc<File>,
    pub bytes_done: &'a Arc<AtomicU64>,
    pub read_timeout: Duration,
    pub cancel: &'a CancellationToken,
}

/// 每个分段一个任务，全部共享同一个取消信号。任务结果为该分段写入的字节数。
pub(super) fn spawn_range_tasks(params: SpawnRangeTasksParams<'_>) -> JoinSet<Result<u64, DownloadError>> {
    let url: Arc<str> = Arc::from(params.url);
    let mut tasks = JoinSet::new();

    for segment in params.segments {
        let span = info_span!(target: "download", "segment", index = segment.index, start = segment.start, end = segment.end);
        let worker = download_one_range(DownloadOneRangeParams {
            client: params.client.clone(),
            url: Arc::clone(&url),
            segment,
            file: Arc::clone(params.file),
            bytes_done: Arc::clone(params.bytes_done),
            read_timeout: params.read_timeout,
            cancel: params.cancel.clone(),
        });
        tasks.spawn(worker.instrument(span));
    }

    tasks
}

/// 等待所有分段任务结束。
///
/// 第一个失败的任务触发共享取消信号，其余任务在下一次读取时退出；之后到达的错误只记录日志。
/// 返回前所有任务都已结束。
pub(super) async fn join_first_error(
    mut tasks: JoinSet<Result<u64, DownloadError>>,
    cancel: &CancellationToken,
) -> Result<(), DownloadError> {
    let mut first_error: Option<DownloadError> = None;

    while let Some(joined) = tasks.join_next().await {
        let err = match joined {
            Ok(Ok(_)) => continue,
            Ok(Err(e)) => e,
            Err(join_err) => DownloadError::TaskJoin(join_err),
        };

        if first_error.is_none() {
            warn!(target: "download", error = %err, "分段失败，取消其余分段");
            cancel.cancel();
            first_error = Some(err);
        } else {
            debug!(target: "download", error = %err, "忽略后续分段错误");
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
