//! 分片下载：目标文件的创建、预分配，以及失败时的清理。

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tracing::{debug, warn};

use crate::internal::downloader::structs::download_error::DownloadError;

/// 以「截断 + 创建 + 只写」打开目标文件。
pub(super) async fn open_destination(path: &Path) -> Result<File, DownloadError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(DownloadError::OpenFile)
}

/// 把文件扩展到最终大小，之后各分段的定位写入不会再改变文件长度。
pub(super) async fn preallocate(file: File, len: u64) -> Result<std::fs::File, DownloadError> {
    file.set_len(len)
        .await
        .map_err(DownloadError::PreallocateFile)?;
    Ok(file.into_std().await)
}

/// 未完成文件的守卫：除非显式 [`disarm`](Self::disarm)，否则删除目标文件。
///
/// 正常失败路径走 [`remove`](Self::remove)；下载 future 被中途丢弃时由 `Drop` 兜底删除。
#[derive(Debug)]
pub(super) struct PartialFileGuard {
    path: Option<PathBuf>,
}

impl PartialFileGuard {
    pub(super) fn arm(path: &Path) -> Self {
        Self {
            path: Some(path.to_path_buf()),
        }
    }

    /// 下载成功，保留文件。
    pub(super) fn disarm(mut self) {
        self.path = None;
    }

    pub(super) async fn remove(mut self) {
        if let Some(path) = self.path.take() {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(target: "download", path = %path.display(), "已删除未完成的文件"),
                Err(e) => warn!(target: "download", path = %path.display(), error = %e, "删除未完成的文件失败"),
            }
        }
    }
}

impl Drop for PartialFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            warn!(target: "download", path = %path.display(), "下载被中断，删除未完成的文件");
            let _ = std::fs::remove_file(&path);
        }
    }
}
