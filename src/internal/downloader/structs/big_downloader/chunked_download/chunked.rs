//! 分片下载：创建并预分配目标文件 + 多段 Range 并发写入 + 进度采样 + 结果校验。

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::internal::downloader::structs::big_downloader_config::BigDownloaderConfig;
use crate::internal::downloader::structs::download_error::DownloadError;
use crate::internal::downloader::structs::download_progress::DownloadProgress;
use crate::internal::downloader::structs::download_result::DownloadResult;
use crate::internal::downloader::structs::progress_reporter::{
    ProgressCallback, ProgressReporter, ProgressReporterParams,
};
use crate::internal::downloader::structs::range_segment::{effective_concurrency, plan_segments};
use crate::internal::states::unlock_reactive::UnlockReactiveProperty;

use super::destination::{PartialFileGuard, open_destination, preallocate};
use super::spawn_tasks::{SpawnRangeTasksParams, join_first_error, spawn_range_tasks};

/// 分片下载参数（形参超过 3 个，用 struct 承载）。
pub(crate) struct RunChunkedDownloadParams<'a> {
    pub client: Client,
    pub url: &'a str,
    pub save_path: PathBuf,
    pub content_length: u64,
    pub config: &'a BigDownloaderConfig,
    pub callback: Option<ProgressCallback>,
    pub progress: UnlockReactiveProperty<DownloadProgress>,
    pub cancel: &'a CancellationToken,
}

/// 分片下载入口：文件大小已由探测确认。
///
/// 目标文件一旦创建，任何失败都会删除它；成功时再核对一次文件大小。
pub(crate) async fn run_chunked_download(
    params: RunChunkedDownloadParams<'_>,
) -> Result<DownloadResult, DownloadError> {
    let save_path = params.save_path.clone();
    let content_length = params.content_length;

    let file = open_destination(&save_path).await?;
    let guard = PartialFileGuard::arm(&save_path);

    // file 在 transfer 内部被释放，删除文件时不再有打开的句柄
    let outcome = match transfer(file, params).await {
        Ok(()) => verify_size(&save_path, content_length).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => {
            guard.disarm();
            info!(target: "download", path = %save_path.display(), content_length, "下载完成");
            Ok(DownloadResult {
                save_path,
                content_length,
            })
        }
        Err(e) => {
            guard.remove().await;
            Err(e)
        }
    }
}

async fn transfer(
    file: tokio::fs::File,
    params: RunChunkedDownloadParams<'_>,
) -> Result<(), DownloadError> {
    let RunChunkedDownloadParams {
        client,
        url,
        content_length,
        config,
        callback,
        progress,
        cancel,
        ..
    } = params;

    let file = Arc::new(preallocate(file, content_length).await?);

    // 本次下载的共享取消信号：调用方取消或任一分段失败都会触发
    let job = cancel.child_token();
    // 下载 future 被中途丢弃时同样取消本次下载
    let _job_scope = job.clone().drop_guard();
    let bytes_done = Arc::new(AtomicU64::new(0));

    let reporter = ProgressReporter::spawn(ProgressReporterParams {
        bytes_done: Arc::clone(&bytes_done),
        total: content_length,
        interval: config.progress_interval,
        callback,
        progress,
        stop: job.clone(),
    });

    let concurrency = effective_concurrency(content_length, config.concurrency);
    let segments = plan_segments(content_length, concurrency);
    info!(target: "download", url, content_length, concurrency, "开始分片下载");

    let tasks = spawn_range_tasks(SpawnRangeTasksParams {
        client: &client,
        url,
        segments,
        file: &file,
        bytes_done: &bytes_done,
        read_timeout: config.read_timeout,
        cancel: &job,
    });

    let result = join_first_error(tasks, &job).await;

    job.cancel();
    reporter.stop().await;
    drop(file);

    result
}

async fn verify_size(path: &std::path::Path, expected: u64) -> Result<(), DownloadError> {
    let actual = tokio::fs::metadata(path)
        .await
        .map_err(DownloadError::StatFile)?
        .len();
    if actual != expected {
        return Err(DownloadError::IncompleteFile { expected, actual });
    }
    Ok(())
}
