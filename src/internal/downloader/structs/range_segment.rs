//! 分段规划：把 `[0, content_length)` 切成 N 段首尾相接、互不重叠的半开区间。

/// 单个分段：在整体中的半开区间 `[start, end)`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSegment {
    /// 分段序号，从 0 开始
    pub index: usize,
    /// 起始偏移（含）
    pub start: u64,
    /// 结束偏移（不含）
    pub end: u64,
}

impl RangeSegment {
    /// 分段字节数；区间非法时为 0。
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// 对应的 Range 请求头：`bytes=start-(end-1)`，HTTP 的上界是闭区间。
    pub fn range_header(&self) -> String {
        format!("bytes={}-{}", self.start, self.end.saturating_sub(1))
    }
}

/// 按并发数切分。
///
/// `part_size = content_length / concurrency`，前 N-1 段各占 `part_size`，
/// 余数全部并入最后一段。`concurrency` 为 0 时按 1 处理。
/// 当 `concurrency > content_length` 时前面的段会是空区间，由调用方决定如何处理。
pub fn plan_segments(content_length: u64, concurrency: usize) -> Vec<RangeSegment> {
    let n = concurrency.max(1);
    let part_size = content_length / n as u64;

    (0..n)
        .map(|index| {
            let start = index as u64 * part_size;
            let end = if index == n - 1 {
                content_length
            } else {
                start + part_size
            };
            RangeSegment { index, start, end }
        })
        .collect()
}

/// 实际使用的并发数：至少 1，且不超过文件字节数，保证每段非空。
pub fn effective_concurrency(content_length: u64, concurrency: usize) -> usize {
    let cap = usize::try_from(content_length).unwrap_or(usize::MAX);
    concurrency.max(1).min(cap.max(1))
}
