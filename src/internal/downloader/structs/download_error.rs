//! 下载相关错误类型。

use std::time::Duration;

use thiserror::Error;

use crate::internal::downloader::traits::capability_probe::ProbeError;

/// 错误的抽象分类：调用方只关心「哪一类失败」时按它匹配即可。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadErrorKind {
    /// 同一个下载器上已有下载在进行
    AlreadyInProgress,
    /// 探测失败，或服务器不支持 Range 请求
    CapabilityRejected,
    /// 目标文件无法创建或预分配
    FileSetupFailed,
    /// 分段区间非法（start >= end）
    InvalidRange,
    /// 分段请求构造或发送失败
    ConnectionFailed,
    /// 单次读取超时
    ReadTimeout,
    /// 共享取消信号被触发（兄弟分段失败或调用方取消）
    Cancelled,
    /// 写入目标文件失败
    WriteFailed,
    /// 最终文件或某个分段的字节数与预期不符
    IncompleteTransfer,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("下载正在进行中")]
    AlreadyInProgress,

    #[error("请求失败或缺少 Accept-Ranges 头部: {reason}")]
    CapabilityRejected { reason: String },

    #[error("探测请求失败: {0}")]
    Probe(#[from] ProbeError),

    #[error("文件大小为 0")]
    ContentLengthZero,

    #[error("无法从 URL 推断文件名: {url}")]
    NoFileName { url: String },

    #[error("构建 HTTP 客户端失败: {0}")]
    BuildClient(#[source] reqwest::Error),

    #[error("打开文件失败: {0}")]
    OpenFile(#[source] std::io::Error),

    #[error("预分配文件空间失败: {0}")]
    PreallocateFile(#[source] std::io::Error),

    #[error("分段 {index} 区间非法: start({start}) >= end({end})")]
    InvalidRange { index: usize, start: u64, end: u64 },

    #[error("分段 {index} 创建 HTTP 请求失败: {source}")]
    CreateRequest {
        index: usize,
        #[source]
        source: reqwest::Error,
    },

    #[error("分段 {index} HTTP 请求失败: {source}")]
    Request {
        index: usize,
        #[source]
        source: reqwest::Error,
    },

    #[error("分段 {index} 服务器未返回部分内容，状态码 {status}")]
    RangeNotHonored {
        index: usize,
        status: reqwest::StatusCode,
    },

    #[error("分段 {index} 读取响应体失败: {source}")]
    ReadBody {
        index: usize,
        #[source]
        source: reqwest::Error,
    },

    #[error("分段 {index} 读取器已关闭")]
    ReaderClosed { index: usize },

    #[error("分段 {index} 数据读取超时（{timeout:?}）")]
    ReadTimeout { index: usize, timeout: Duration },

    #[error("下载被取消")]
    Cancelled,

    #[error("写入文件失败: {0}")]
    WriteFile(#[source] std::io::Error),

    #[error("分段任务失败: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("分段 {index} 字节数不符: 预期 {expected}，实际 {actual}")]
    SegmentLengthMismatch {
        index: usize,
        expected: u64,
        actual: u64,
    },

    #[error("读取文件信息失败: {0}")]
    StatFile(#[source] std::io::Error),

    #[error("下载的文件不完整: 预期 {expected} 字节，实际 {actual} 字节")]
    IncompleteFile { expected: u64, actual: u64 },
}

impl DownloadError {
    /// 归入的抽象错误类别。
    pub fn kind(&self) -> DownloadErrorKind {
        match self {
            Self::AlreadyInProgress => DownloadErrorKind::AlreadyInProgress,
            Self::CapabilityRejected { .. } | Self::Probe(_) | Self::ContentLengthZero => {
                DownloadErrorKind::CapabilityRejected
            }
            Self::NoFileName { .. } | Self::OpenFile(_) | Self::PreallocateFile(_) => {
                DownloadErrorKind::FileSetupFailed
            }
            Self::InvalidRange { .. } => DownloadErrorKind::InvalidRange,
            Self::BuildClient(_)
            | Self::CreateRequest { .. }
            | Self::Request { .. }
            | Self::RangeNotHonored { .. }
            | Self::ReadBody { .. }
            | Self::ReaderClosed { .. } => DownloadErrorKind::ConnectionFailed,
            Self::ReadTimeout { .. } => DownloadErrorKind::ReadTimeout,
            Self::Cancelled => DownloadErrorKind::Cancelled,
            Self::WriteFile(_) | Self::TaskJoin(_) => DownloadErrorKind::WriteFailed,
            Self::SegmentLengthMismatch { .. } | Self::StatFile(_) | Self::IncompleteFile { .. } => {
                DownloadErrorKind::IncompleteTransfer
            }
        }
    }

    /// 是否为共享取消信号引起的连带失败（而非首个致命错误）。
    pub fn is_cancelled(&self) -> bool {
        self.kind() == DownloadErrorKind::Cancelled
    }
}
