//! # UnlockReactiveProperty
//!
//! 轻量级的响应式属性容器，读写不阻塞，适合高频更新场景（如下载进度）。
//! 内部直接复用 [`super::reactive_core::ReactiveProperty`]。
//!
//! ## 使用示例
//! ```rust,no_run
//! use bigfile_downloader::states::unlock_reactive::UnlockReactiveProperty;
//!
//! let prop = UnlockReactiveProperty::new(0);
//! prop.update(1);
//! prop.update(2);
//! assert_eq!(prop.get_current(), 2);
//! ```

pub use super::reactive_core::{PropertyWatcher, ReactivePropertyError as UnlockReactivePropertyError};

/// 轻量级响应式属性容器。
pub type UnlockReactiveProperty<T> = super::reactive_core::ReactiveProperty<T>;
