//! 下载器领域模块：分段规划、分段读取、定位写入、进度采样与总体编排。
//!
//! 对外导出以 [`crate::downloader`] 为准，此处仅做模块划分。

pub mod functions;
pub mod impl_traits;
pub mod structs;
pub mod traits;
