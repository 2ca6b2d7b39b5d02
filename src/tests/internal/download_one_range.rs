use std::fs::File;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::downloader::{DownloadErrorKind, RangeSegment};
use crate::internal::downloader::structs::big_downloader::chunked_download::download_one_range::{
    DownloadOneRangeParams, WRITE_BATCH_SIZE, download_one_range,
};
use crate::tests::{MockBehavior, MockServer, payload};

fn params(url: &str, segment: RangeSegment, file: Arc<File>, bytes_done: &Arc<AtomicU64>) -> DownloadOneRangeParams {
    DownloadOneRangeParams {
        client: Client::new(),
        url: Arc::from(url),
        segment,
        file,
        bytes_done: Arc::clone(bytes_done),
        read_timeout: Duration::from_secs(5),
        cancel: CancellationToken::new(),
    }
}

#[tokio::test]
async fn writes_segment_larger_than_one_batch() {
    let data = payload(3 * WRITE_BATCH_SIZE + 777);
    let server = MockServer::start(data.clone(), MockBehavior::Serve).await;
    let tmp = tempfile::NamedTempFile::new().unwrap();
    let file = tmp.reopen().unwrap();
    file.set_len(data.len() as u64).unwrap();
    let bytes_done = Arc::new(AtomicU64::new(0));

    let segment = RangeSegment {
        index: 1,
        start: 1_000,
        end: data.len() as u64,
    };
    let written = download_one_range(params(&server.url("w.bin"), segment, Arc::new(file), &bytes_done))
        .await
        .unwrap();

    assert_eq!(written, segment.len());
    assert_eq!(bytes_done.load(Ordering::SeqCst), segment.len());
    let content = std::fs::read(tmp.path()).unwrap();
    assert_eq!(&content[1_000..], &data[1_000..]);
    assert!(content[..1_000].iter().all(|b| *b == 0));
}

#[tokio::test]
async fn empty_segment_is_invalid_range() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    let bytes_done = Arc::new(AtomicU64::new(0));
    let segment = RangeSegment {
        index: 4,
        start: 100,
        end: 100,
    };

    // 不会发出请求，地址无关紧要
    let err = download_one_range(params(
        "http://127.0.0.1:9/never.bin",
        segment,
        Arc::new(tmp.reopen().unwrap()),
        &bytes_done,
    ))
    .await
    .unwrap_err();

    assert_eq!(err.kind(), DownloadErrorKind::InvalidRange, "{err}");
    assert_eq!(bytes_done.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn write_error_is_write_failed() {
    let data = payload(4_000);
    let server = MockServer::start(data, MockBehavior::Serve).await;
    let tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.as_file().set_len(4_000).unwrap();
    // 只读句柄，定位写入必然失败
    let read_only = File::open(tmp.path()).unwrap();
    let bytes_done = Arc::new(AtomicU64::new(0));

    let err = download_one_range(params(
        &server.url("ro.bin"),
        RangeSegment {
            index: 0,
            start: 0,
            end: 4_000,
        },
        Arc::new(read_only),
        &bytes_done,
    ))
    .await
    .unwrap_err();

    assert_eq!(err.kind(), DownloadErrorKind::WriteFailed, "{err}");
    assert_eq!(bytes_done.load(Ordering::SeqCst), 0);
}
