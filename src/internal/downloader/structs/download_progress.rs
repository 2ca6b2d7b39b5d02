/// 下载进度：响应式状态，记录已写入字节数与文件总大小。
///
/// 调用方通过下载器的 `progress()` 读取或监听；进度比例可用 [`DownloadProgress::pct`] 获取。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DownloadProgress {
    /// 已写入目标文件的字节数
    pub bytes_done: u64,
    /// 文件总大小（字节），探测完成前为 0
    pub total: u64,
}

impl DownloadProgress {
    /// 进度百分比（0～100），保留两位小数；总大小为 0 时返回 0。
    pub fn pct(&self) -> f64 {
        percent_of(self.bytes_done, self.total)
    }
}

/// `round2(100 * done / total)`，结果钳制在 `[0, 100]`。
pub(crate) fn percent_of(done: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = done as f64 / total as f64 * 100.0;
    ((raw * 100.0).round() / 100.0).clamp(0.0, 100.0)
}
