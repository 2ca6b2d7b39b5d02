//! 定位写入器：从固定偏移开始顺序写入共享文件句柄，写完推进偏移并上报字节数。
//!
//! 多个写入器共享同一个 [`File`]，各自只写自己的分段区间，彼此之间不加锁；
//! 互斥锁只保护单个写入器自己的「取偏移 → 写入 → 推进偏移」序列。

use std::fs::File;
use std::io;
use std::sync::{Arc, Mutex};

/// 每次成功写入后回调，参数为本次写入的字节数。
pub type BytesWrittenCallback = Arc<dyn Fn(u64) + Send + Sync>;

pub struct PositionalWriter {
    file: Arc<File>,
    offset: Mutex<u64>,
    on_written: Option<BytesWrittenCallback>,
}

impl PositionalWriter {
    pub fn new(file: Arc<File>, start_offset: u64, on_written: Option<BytesWrittenCallback>) -> Self {
        Self {
            file,
            offset: Mutex::new(start_offset),
            on_written,
        }
    }

    /// 下一次写入的位置。
    pub fn offset(&self) -> u64 {
        match self.offset.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// 在当前偏移写入全部数据，成功后推进偏移并触发回调。失败原样返回，不重试。
    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        {
            let mut offset = self
                .offset
                .lock()
                .map_err(|_| io::Error::other("写入偏移锁已中毒"))?;
            write_all_at(&self.file, buf, *offset)?;
            *offset += buf.len() as u64;
        }

        if let Some(cb) = &self.on_written {
            cb(buf.len() as u64);
        }
        Ok(buf.len())
    }
}

impl io::Write for PositionalWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        PositionalWriter::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for PositionalWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionalWriter")
            .field("offset", &self.offset())
            .field("has_callback", &self.on_written.is_some())
            .finish()
    }
}

#[cfg(unix)]
fn write_all_at(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(buf, offset)
}

#[cfg(windows)]
fn write_all_at(file: &File, mut buf: &[u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_write(buf, offset) {
            Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero)),
            Ok(n) => {
                buf = &buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
