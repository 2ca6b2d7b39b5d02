use std::path::{Path, PathBuf};

use crate::downloader::{DownloadErrorKind, resolve_save_path};

#[test]
fn explicit_filename_is_used_as_is() {
    let path = resolve_save_path("http://host/a/b.bin", Path::new("/tmp/out.bin")).unwrap();
    assert_eq!(path, PathBuf::from("/tmp/out.bin"));
}

#[test]
fn empty_filename_takes_last_url_segment() {
    let path = resolve_save_path("http://host/dir/archive.tar.gz?sig=1#frag", Path::new("")).unwrap();
    assert_eq!(path, PathBuf::from("archive.tar.gz"));
}

#[test]
fn last_segment_is_percent_decoded() {
    let path = resolve_save_path("http://host/files/my%20file%E6%96%87.zip", Path::new("")).unwrap();
    assert_eq!(path, PathBuf::from("my file文.zip"));
}

#[test]
fn urls_without_file_name_are_rejected() {
    for url in [
        "http://host/dir/",
        "http://host",
        "not a url",
        "http://host/a%2Fb",
        "http://host/..%2F..%2Fetc",
        "http://host/%2E%2E",
    ] {
        let err = resolve_save_path(url, Path::new("")).unwrap_err();
        assert_eq!(err.kind(), DownloadErrorKind::FileSetupFailed, "{url}");
    }
}
