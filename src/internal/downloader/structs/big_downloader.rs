//! 大文件分片下载器
//!
//! 对支持 Range 请求的 URL，把文件切成 N 段并发下载，各段直接写入目标文件的对应偏移。
//!
//! ## 功能特性
//!
//! - **分片并发下载**：`content_length / N` 等分，余数并入最后一段
//! - **可打断的读取**：每次读取都受「单次读取超时」和「共享取消信号」约束
//! - **快速失败**：任一分段失败即取消其余分段，返回第一个错误
//! - **不留残缺文件**：失败时删除目标文件，成功时核对文件大小
//! - **进度**：按固定间隔回调百分比，也可通过 `progress()` 监听字节数
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! # use bigfile_downloader::downloader::BigDownloader;
//! # use tokio_util::sync::CancellationToken;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = BigDownloader::new(8).on_progress(|pct| println!("下载进度: {pct:.2}%"));
//!
//! let cancel = CancellationToken::new();
//! // 文件名为空时取 URL 的最后一段
//! let result = downloader
//!     .download(&cancel, "https://example.com/big.zip", "")
//!     .await?;
//! println!("已保存到 {}", result.save_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! 同一个下载器同一时间只能执行一次下载，并发调用直接返回
//! [`DownloadError::AlreadyInProgress`]。

pub(crate) mod chunked_download;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::internal::downloader::functions::resolve_save_path::resolve_save_path;
use crate::internal::downloader::impl_traits::impl_capability_probe::HeadProbe;
use crate::internal::downloader::traits::capability_probe::CapabilityProbe;
use crate::internal::states::unlock_reactive::UnlockReactiveProperty;

use super::big_downloader_config::BigDownloaderConfig;
use super::content_descriptor::ContentDescriptor;
use super::download_error::DownloadError;
use super::download_progress::DownloadProgress;
use super::download_result::DownloadResult;
use super::download_status::DownloadStatus;
use super::progress_reporter::ProgressCallback;
use chunked_download::{RunChunkedDownloadParams, run_chunked_download};

/// 大文件分片下载器。
///
/// 拥有响应式属性：`progress()`（已写入字节数与总大小）、`status()`（下载状态）。
pub struct BigDownloader {
    config: BigDownloaderConfig,
    on_progress: Option<ProgressCallback>,
    probe: Option<Arc<dyn CapabilityProbe>>,
    downloading: AtomicBool,
    progress_state: UnlockReactiveProperty<DownloadProgress>,
    status_state: UnlockReactiveProperty<DownloadStatus>,
}

/// 下载期间持有；释放时清除「下载中」标志。
///
/// 下载 future 被中途丢弃时状态仍是 `Running`，此时改为 `Canceled`。
struct JobGuard<'a> {
    flag: &'a AtomicBool,
    status: &'a UnlockReactiveProperty<DownloadStatus>,
}

impl<'a> JobGuard<'a> {
    fn acquire(
        flag: &'a AtomicBool,
        status: &'a UnlockReactiveProperty<DownloadStatus>,
    ) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag, status })
    }
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        if self.status.get_current() == DownloadStatus::Running {
            self.status.update(DownloadStatus::Canceled);
        }
        self.flag.store(false, Ordering::Release);
    }
}

impl BigDownloader {
    /// 以 `concurrency` 个分段创建下载器，其余配置取默认值。
    pub fn new(concurrency: usize) -> Self {
        Self::with_config(BigDownloaderConfig {
            concurrency,
            ..Default::default()
        })
    }

    pub fn with_config(config: BigDownloaderConfig) -> Self {
        Self {
            config,
            on_progress: None,
            probe: None,
            downloading: AtomicBool::new(false),
            progress_state: UnlockReactiveProperty::new(DownloadProgress::default()),
            status_state: UnlockReactiveProperty::new(DownloadStatus::Idle),
        }
    }

    /// 设置分段数（并发数）
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// 设置单次读取超时
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// 设置建连超时
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// 设置进度采样间隔
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.config.progress_interval = interval;
        self
    }

    /// 注册进度回调；参数为 0～100 的百分比，同一次下载内单调不减，`download` 返回后不再调用。
    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(f));
        self
    }

    /// 替换默认的 HEAD 探测。
    pub fn with_probe(mut self, probe: impl CapabilityProbe + 'static) -> Self {
        self.probe = Some(Arc::new(probe));
        self
    }

    pub fn config(&self) -> &BigDownloaderConfig {
        &self.config
    }

    /// 是否有下载正在进行。
    pub fn is_downloading(&self) -> bool {
        self.downloading.load(Ordering::Acquire)
    }

    /// 内置的下载进度状态；返回可共享句柄，`.watch()` 后 `changed().await` 监听进度。
    pub fn progress(&self) -> UnlockReactiveProperty<DownloadProgress> {
        self.progress_state.clone()
    }

    /// 内置的下载状态。
    pub fn status(&self) -> UnlockReactiveProperty<DownloadStatus> {
        self.status_state.clone()
    }

    /// 下载 `url` 到 `filename`；`filename` 为空时取 URL 路径的最后一段。
    ///
    /// `cancel` 被取消时所有分段尽快退出，返回 [`DownloadError::Cancelled`]。
    /// 失败时目标文件不会留在磁盘上。
    pub async fn download(
        &self,
        cancel: &CancellationToken,
        url: &str,
        filename: impl AsRef<Path>,
    ) -> Result<DownloadResult, DownloadError> {
        let Some(_job) = JobGuard::acquire(&self.downloading, &self.status_state) else {
            return Err(DownloadError::AlreadyInProgress);
        };

        self.progress_state.update(DownloadProgress::default());
        self.status_state.update(DownloadStatus::Running);

        let result = self.run_job(cancel, url, filename.as_ref()).await;

        let status = match &result {
            Ok(_) => DownloadStatus::Finished,
            Err(e) if e.is_cancelled() => DownloadStatus::Canceled,
            Err(_) => DownloadStatus::Failed,
        };
        self.status_state.update(status);

        if let Err(e) = &result {
            warn!(target: "download", url, error = %e, "下载失败");
        }
        result
    }

    async fn run_job(
        &self,
        cancel: &CancellationToken,
        url: &str,
        filename: &Path,
    ) -> Result<DownloadResult, DownloadError> {
        let save_path = resolve_save_path(url, filename)?;
        let client = self.build_client()?;

        let descriptor = self.probe_content(&client, cancel, url).await?;
        let content_length = descriptor.content_length;
        info!(target: "download", url, content_length, path = %save_path.display(), "探测通过");

        self.progress_state.update(DownloadProgress {
            bytes_done: 0,
            total: content_length,
        });

        run_chunked_download(RunChunkedDownloadParams {
            client,
            url,
            save_path,
            content_length,
            config: &self.config,
            callback: self.on_progress.clone(),
            progress: self.progress_state.clone(),
            cancel,
        })
        .await
    }

    /// 每次下载一个客户端：不保留空闲连接，每个分段独占一条 HTTP/1.1 连接。
    fn build_client(&self) -> Result<Client, DownloadError> {
        Client::builder()
            .http1_only()
            .pool_max_idle_per_host(0)
            .connect_timeout(self.config.connect_timeout)
            .build()
            .map_err(DownloadError::BuildClient)
    }

    /// 探测文件大小与 Range 支持；探测本身同样响应取消。
    async fn probe_content(
        &self,
        client: &Client,
        cancel: &CancellationToken,
        url: &str,
    ) -> Result<ContentDescriptor, DownloadError> {
        let default_probe;
        let probe: &dyn CapabilityProbe = match &self.probe {
            Some(p) => p.as_ref(),
            None => {
                default_probe = HeadProbe::new(client.clone());
                &default_probe
            }
        };

        let descriptor = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            res = probe.probe(url) => res?,
        };

        if !descriptor.supports_range {
            return Err(DownloadError::CapabilityRejected {
                reason: "服务器未以 200 响应或未声明 Accept-Ranges: bytes".to_string(),
            });
        }
        if descriptor.content_length == 0 {
            return Err(DownloadError::ContentLengthZero);
        }
        Ok(descriptor)
    }
}

impl std::fmt::Debug for BigDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BigDownloader")
            .field("config", &self.config)
            .field("downloading", &self.is_downloading())
            .field("has_progress_callback", &self.on_progress.is_some())
            .field("has_custom_probe", &self.probe.is_some())
            .finish()
    }
}
