/// 内部模块
mod internal;

#[cfg(test)]
mod tests;

/// 下载器：入口 [`downloader::BigDownloader`] 与分段读写的组成部件
pub mod downloader {
    use crate::internal;
    // 结构体模型
    pub use internal::downloader::structs::*;
    pub use internal::downloader::structs::big_downloader_config::{
        DEFAULT_CONCURRENCY, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PROGRESS_INTERVAL,
        DEFAULT_READ_TIMEOUT,
    };
    // 能力探测
    pub use internal::downloader::impl_traits::impl_capability_probe::HeadProbe;
    pub use internal::downloader::traits::capability_probe::{CapabilityProbe, ProbeError};
    // 工具函数
    pub use internal::downloader::functions::resolve_save_path::resolve_save_path;
}

pub mod states {
    pub mod unlock_reactive {
        use crate::internal;
        pub use internal::states::unlock_reactive::*;
    }
}

pub use downloader::{BigDownloader, DownloadError, DownloadErrorKind, DownloadResult};
