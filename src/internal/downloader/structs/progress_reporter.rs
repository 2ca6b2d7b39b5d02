//! 进度采样：按固定间隔读取累计字节计数，换算成百分比后回调并写入响应式进度。
//!
//! 共享取消信号结束后停止；停止前补发一次最新值。[`ProgressReporter::stop`] 等待任务
//! 真正退出，之后不会再有任何回调。[`ProgressReporter`] 被直接丢弃（例如下载 future
//! 被中途丢弃）时任务随之中止，不补发。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::internal::states::unlock_reactive::UnlockReactiveProperty;

use super::download_progress::{DownloadProgress, percent_of};

/// 进度回调，参数为 0～100 的百分比。
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// 启动采样任务时的参数（形参超过 3 个，用 struct 承载）。
pub struct ProgressReporterParams {
    pub bytes_done: Arc<AtomicU64>,
    pub total: u64,
    pub interval: Duration,
    pub callback: Option<ProgressCallback>,
    pub progress: UnlockReactiveProperty<DownloadProgress>,
    pub stop: CancellationToken,
}

pub struct ProgressReporter {
    stop: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    pub fn spawn(params: ProgressReporterParams) -> Self {
        let stop = params.stop.clone();
        let handle = tokio::spawn(run(params));
        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// 通知停止并等待任务退出。
    pub async fn stop(mut self) {
        self.stop.cancel();
        let Some(handle) = self.handle.take() else {
            return;
        };
        match handle.await {
            Err(e) if e.is_panic() => {
                warn!(target: "download", error = %e, "进度回调发生 panic，进度采样已终止");
            }
            _ => {}
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.stop.cancel();
            handle.abort();
        }
    }
}

struct Sampler {
    bytes_done: Arc<AtomicU64>,
    total: u64,
    callback: Option<ProgressCallback>,
    progress: UnlockReactiveProperty<DownloadProgress>,
    last_reported: u64,
}

impl Sampler {
    /// 计数为 0 时不回调；`only_if_changed` 时与上次相同也不回调。
    fn sample(&mut self, only_if_changed: bool) {
        let done = self.bytes_done.load(Ordering::Acquire).min(self.total);
        if done == 0 || (only_if_changed && done == self.last_reported) {
            return;
        }
        self.last_reported = done;

        self.progress.update(DownloadProgress {
            bytes_done: done,
            total: self.total,
        });

        let pct = percent_of(done, self.total);
        trace!(target: "download", done, total = self.total, pct, "进度采样");
        if let Some(cb) = &self.callback {
            cb(pct);
        }
    }
}

async fn run(params: ProgressReporterParams) {
    let ProgressReporterParams {
        bytes_done,
        total,
        interval,
        callback,
        progress,
        stop,
    } = params;

    let mut sampler = Sampler {
        bytes_done,
        total,
        callback,
        progress,
        last_reported: 0,
    };

    // tokio 的 interval 不接受 0
    let interval = interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            _ = ticker.tick() => sampler.sample(false),
        }
    }

    sampler.sample(true);
}
