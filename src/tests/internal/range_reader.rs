use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::downloader::{DownloadError, RangeReader, RangeReaderParams, RangeSegment};
use crate::tests::{MockBehavior, MockServer, STALL_PREFIX, payload};

async fn open_reader(
    client: &Client,
    url: &str,
    segment: RangeSegment,
    read_timeout: Duration,
    cancel: &CancellationToken,
) -> Result<RangeReader, DownloadError> {
    RangeReader::open(RangeReaderParams {
        client,
        url,
        segment,
        read_timeout,
        cancel: cancel.clone(),
    })
    .await
}

async fn read_to_end(reader: &mut RangeReader) -> Result<Vec<u8>, DownloadError> {
    let mut out = Vec::new();
    while let Some(chunk) = reader.read().await? {
        out.extend_from_slice(&chunk);
    }
    Ok(out)
}

#[tokio::test]
async fn reads_exactly_the_requested_range() {
    let data = payload(50_000);
    let server = MockServer::start(data.clone(), MockBehavior::Serve).await;
    let client = Client::new();
    let segment = RangeSegment {
        index: 2,
        start: 12_345,
        end: 40_000,
    };

    let mut reader = open_reader(
        &client,
        &server.url("r.bin"),
        segment,
        Duration::from_secs(5),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(reader.segment(), segment);
    let body = read_to_end(&mut reader).await.unwrap();
    assert_eq!(body, &data[12_345..40_000]);
    assert_eq!(server.range_requests(), 1);
}

#[tokio::test]
async fn stalled_body_times_out_and_closes() {
    let server = MockServer::start(payload(10_000), MockBehavior::StallAll).await;
    let client = Client::new();
    let segment = RangeSegment {
        index: 0,
        start: 0,
        end: 5_000,
    };

    let mut reader = open_reader(
        &client,
        &server.url("stall.bin"),
        segment,
        Duration::from_millis(200),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let first = reader.read().await.unwrap().unwrap();
    assert_eq!(first.len(), STALL_PREFIX);

    let err = reader.read().await.unwrap_err();
    assert!(matches!(err, DownloadError::ReadTimeout { index: 0, .. }), "{err}");
    assert!(reader.is_closed());
    assert!(matches!(
        reader.read().await,
        Err(DownloadError::ReaderClosed { index: 0 })
    ));
}

#[tokio::test]
async fn cancellation_interrupts_pending_read() {
    let server = MockServer::start(payload(10_000), MockBehavior::StallAll).await;
    let client = Client::new();
    let cancel = CancellationToken::new();
    let segment = RangeSegment {
        index: 1,
        start: 100,
        end: 9_000,
    };

    let mut reader = open_reader(
        &client,
        &server.url("cancel.bin"),
        segment,
        Duration::from_secs(30),
        &cancel,
    )
    .await
    .unwrap();
    reader.read().await.unwrap();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = tokio::time::timeout(Duration::from_secs(5), reader.read())
        .await
        .expect("取消后读取应立即返回")
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(reader.is_closed());
}

#[tokio::test]
async fn open_respects_cancellation() {
    let server = MockServer::start(payload(1_000), MockBehavior::Serve).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = open_reader(
        &Client::new(),
        &server.url("c.bin"),
        RangeSegment {
            index: 0,
            start: 0,
            end: 500,
        },
        Duration::from_secs(5),
        &cancel,
    )
    .await
    .err()
    .unwrap();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn close_is_idempotent() {
    let server = MockServer::start(payload(1_000), MockBehavior::Serve).await;
    let mut reader = open_reader(
        &Client::new(),
        &server.url("close.bin"),
        RangeSegment {
            index: 3,
            start: 0,
            end: 1_000,
        },
        Duration::from_secs(5),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(!reader.is_closed());
    reader.close();
    reader.close();
    assert!(reader.is_closed());
    assert!(matches!(
        reader.read().await,
        Err(DownloadError::ReaderClosed { index: 3 })
    ));
}

#[tokio::test]
async fn full_response_to_partial_range_is_rejected() {
    let server = MockServer::start(payload(1_000), MockBehavior::IgnoreRange).await;
    let err = open_reader(
        &Client::new(),
        &server.url("ignored.bin"),
        RangeSegment {
            index: 1,
            start: 500,
            end: 1_000,
        },
        Duration::from_secs(5),
        &CancellationToken::new(),
    )
    .await
    .err()
    .unwrap();

    assert!(
        matches!(err, DownloadError::RangeNotHonored { index: 1, status } if status == reqwest::StatusCode::OK),
        "{err}"
    );
}

#[tokio::test]
async fn full_response_accepted_when_segment_is_whole_file() {
    let data = payload(1_000);
    let server = MockServer::start(data.clone(), MockBehavior::IgnoreRange).await;
    let mut reader = open_reader(
        &Client::new(),
        &server.url("whole.bin"),
        RangeSegment {
            index: 0,
            start: 0,
            end: 1_000,
        },
        Duration::from_secs(5),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(read_to_end(&mut reader).await.unwrap(), data.as_ref());
}
