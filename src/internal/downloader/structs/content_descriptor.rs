/// 探测得到的远程文件描述，一次下载内不可变。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentDescriptor {
    /// 文件总字节数
    pub content_length: u64,
    /// 服务器是否以 200 响应并声明 `Accept-Ranges: bytes`
    pub supports_range: bool,
}
