//! # ReactiveProperty：响应式属性内核
//!
//! 基于 [`tokio::sync::watch`]：写入不阻塞、读取拿快照、监听者异步等待变化。
//! 下载器用它对外暴露进度与状态。
//!
//! 本模块**不对外导出**，外部通过 [`super::unlock_reactive`] 使用。

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

// ──────────────────────────── Error ────────────────────────────

/// 响应式属性统一错误类型
#[derive(Debug, Error)]
pub enum ReactivePropertyError {
    /// 所有属性句柄都已销毁，监听器不会再收到新值
    #[error("属性已被销毁")]
    Destroyed,
}

// ──────────────────────────── ReactiveProperty ────────────────────────────

/// 响应式属性内核：提供 new / update / update_field / get_current / watch 等基础能力。
///
/// clone 得到的是同一个属性的共享句柄。
#[derive(Debug)]
pub struct ReactiveProperty<T> {
    sender: Arc<watch::Sender<T>>,
}

impl<T> Clone for ReactiveProperty<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T> ReactiveProperty<T>
where
    T: Clone + Send + Sync,
{
    /// 创建一个新的响应式属性。
    pub fn new(value: T) -> Self {
        let (sender, _) = watch::channel(value);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// 替换属性的值，所有监听者都会收到通知。没有监听者时同样生效。
    pub fn update(&self, new_value: T) -> &Self {
        self.sender.send_replace(new_value);
        self
    }

    /// 使用闭包原地修改属性的部分字段。
    pub fn update_field<F>(&self, updater: F) -> &Self
    where
        F: FnOnce(&mut T),
    {
        self.sender.send_modify(updater);
        self
    }

    /// 获取当前属性值的快照（会 clone）。
    pub fn get_current(&self) -> T {
        self.sender.borrow().clone()
    }

    /// 对当前值应用转换函数，不 clone 整个值。
    pub fn map<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.sender.borrow())
    }

    /// 创建一个监听器，用于异步监听属性值的变化。
    pub fn watch(&self) -> PropertyWatcher<T> {
        PropertyWatcher {
            receiver: self.sender.subscribe(),
        }
    }
}

// ──────────────────────────── PropertyWatcher ────────────────────────────

/// 属性监听器，用于异步接收属性值的变化。
#[derive(Debug)]
pub struct PropertyWatcher<T> {
    receiver: watch::Receiver<T>,
}

impl<T> PropertyWatcher<T>
where
    T: Clone + Send + Sync,
{
    /// 异步等待属性值的变化，返回新值。
    pub async fn changed(&mut self) -> Result<T, ReactivePropertyError> {
        self.receiver
            .changed()
            .await
            .map_err(|_| ReactivePropertyError::Destroyed)?;
        Ok(self.receiver.borrow_and_update().clone())
    }

    /// 挂起直到当前值满足条件；当前值已满足时立即返回。
    pub async fn wait_until<F>(&mut self, predicate: F) -> Result<T, ReactivePropertyError>
    where
        F: FnMut(&T) -> bool,
    {
        let value = self
            .receiver
            .wait_for(predicate)
            .await
            .map_err(|_| ReactivePropertyError::Destroyed)?;
        Ok(value.clone())
    }

    /// 同步获取当前值的克隆。
    pub fn borrow(&self) -> T {
        self.receiver.borrow().clone()
    }
}
