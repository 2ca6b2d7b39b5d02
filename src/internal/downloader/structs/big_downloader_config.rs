use std::time::Duration;

/// 默认并发分段数
pub const DEFAULT_CONCURRENCY: usize = 4;

/// 默认单次读取超时
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(20);

/// 默认建连超时
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// 默认进度采样间隔
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct BigDownloaderConfig {
    /// 分段数（即并发 worker 数）；0 按 1 处理
    pub concurrency: usize,
    /// 单次读取的超时，每次读取重新计时，不是整个下载的超时
    pub read_timeout: Duration,
    /// 建立连接的超时
    pub connect_timeout: Duration,
    /// 进度回调的采样间隔
    pub progress_interval: Duration,
}

impl Default for BigDownloaderConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            read_timeout: DEFAULT_READ_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}
