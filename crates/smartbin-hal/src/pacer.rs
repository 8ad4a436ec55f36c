//! 步进延时
//!
//! 运动序列的每一步之后都要等待固定时长（默认 100ms）。
//! 延时通过 [`Pacer`] 注入：生产环境使用 `spin_sleep` 实现低抖动延时，
//! 测试中替换为只记录、不休眠的实现。

use spin_sleep::SpinSleeper;
use std::time::Duration;
use tracing::trace;

/// 延时源
pub trait Pacer {
    /// 阻塞等待 `duration`
    fn pause(&mut self, duration: Duration);
}

impl<T: Pacer + ?Sized> Pacer for Box<T> {
    fn pause(&mut self, duration: Duration) {
        (**self).pause(duration)
    }
}

/// 基于 `spin_sleep` 的实时延时
///
/// 先交给 OS 休眠，最后一小段自旋，抖动远小于 `std::thread::sleep`。
#[derive(Debug, Clone, Default)]
pub struct SpinPacer {
    sleeper: SpinSleeper,
}

impl SpinPacer {
    /// 创建默认延时源
    pub fn new() -> Self {
        Self::default()
    }
}

impl Pacer for SpinPacer {
    fn pause(&mut self, duration: Duration) {
        trace!("pause {:?}", duration);
        self.sleeper.sleep(duration);
    }
}
