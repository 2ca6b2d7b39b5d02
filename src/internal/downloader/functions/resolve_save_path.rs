use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use url::Url;

use crate::internal::downloader::structs::download_error::DownloadError;

/// 决定保存路径：`filename` 非空时原样使用，为空时取 URL 路径的最后一段（解码百分号编码）。
///
/// URL 以 `/` 结尾、无法解析或最后一段解码后不是合法文件名时返回 [`DownloadError::NoFileName`]。
pub fn resolve_save_path(url: &str, filename: &Path) -> Result<PathBuf, DownloadError> {
    if !filename.as_os_str().is_empty() {
        return Ok(filename.to_path_buf());
    }

    let no_file_name = || DownloadError::NoFileName {
        url: url.to_string(),
    };

    let parsed = Url::parse(url).map_err(|_| no_file_name())?;
    let last = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .ok_or_else(no_file_name)?;

    let decoded = percent_decode_str(last)
        .decode_utf8()
        .map_err(|_| no_file_name())?;

    // 解码后可能出现路径分隔符，不允许借此写到别的目录
    if decoded.contains(['/', '\\']) || decoded == "." || decoded == ".." {
        return Err(no_file_name());
    }

    Ok(PathBuf::from(decoded.into_owned()))
}
