//! 取消令牌

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 跨线程取消标志
///
/// 克隆共享同一个标志，通常一份交给信号处理器，一份交给运动循环。
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// 创建未取消的令牌
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// 是否已请求取消
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// 清除取消标志
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }
}
