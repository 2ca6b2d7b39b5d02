use std::path::PathBuf;

/// 单次下载成功的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    /// 实际保存的路径（文件名为空时由 URL 推断）
    pub save_path: PathBuf,
    /// 写入的总字节数，等于探测得到的文件大小
    pub content_length: u64,
}
