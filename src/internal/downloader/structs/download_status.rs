/// 下载状态（由下载器内部维护，外部只读监听）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadStatus {
    #[default]
    Idle,
    Running,
    Finished,
    Failed,
    Canceled,
}
