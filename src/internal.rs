pub mod downloader;
pub mod states;
