pub mod big_downloader;
pub mod big_downloader_config;
pub mod content_descriptor;
pub mod download_error;
pub mod download_progress;
pub mod download_result;
pub mod download_status;
pub mod positional_writer;
pub mod progress_reporter;
pub mod range_reader;
pub mod range_segment;

// 重导出公共类型
pub use big_downloader::BigDownloader;
pub use big_downloader_config::BigDownloaderConfig;
pub use content_descriptor::ContentDescriptor;
pub use download_error::{DownloadError, DownloadErrorKind};
pub use download_progress::DownloadProgress;
pub use download_result::DownloadResult;
pub use download_status::DownloadStatus;
pub use positional_writer::{BytesWrittenCallback, PositionalWriter};
pub use progress_reporter::ProgressCallback;
pub use range_reader::{RangeReader, RangeReaderParams};
pub use range_segment::{RangeSegment, effective_concurrency, plan_segments};
