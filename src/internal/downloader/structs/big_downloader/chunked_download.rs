mod chunked;
mod destination;
pub(crate) mod download_one_range;
mod spawn_tasks;

pub(super) use chunked::{RunChunkedDownloadParams, run_chunked_download};
