//! 满桶检测
//!
//! 连续采样测距传感器取平均值，低于阈值即判定为满。
//! 判满后进入指示灯闪烁锁存，不再返回。

use crate::controller::BinController;
use crate::error::MotionError;
use smartbin_hal::{Indicator, RangeSensor, ServoBank};
use std::convert::Infallible;
use tracing::{debug, error};

impl<S, R, I> BinController<S, R, I>
where
    S: ServoBank,
    R: RangeSensor,
    I: Indicator,
{
    /// 读取一次距离
    pub fn get_distance(&mut self) -> Result<f64, MotionError> {
        Ok(self.hw.sensor.read()?)
    }

    /// 连续采样 `fullness_samples` 次的平均距离
    ///
    /// 采样之间没有延时，任何一次失败立即返回。
    pub fn average_distance(&mut self) -> Result<f64, MotionError> {
        let samples = self.config.fullness_samples;
        let mut sum = 0.0;
        for _ in 0..samples {
            sum += self.get_distance()?;
        }
        let average = sum / samples as f64;
        debug!("average distance over {} samples: {:.2}", samples, average);
        Ok(average)
    }

    /// 平均距离严格小于 `full_threshold` 时为满
    pub fn is_full(&mut self) -> Result<bool, MotionError> {
        Ok(self.average_distance()? < self.config.full_threshold)
    }

    /// 检查是否满桶
    ///
    /// 未满时返回 `Ok(false)`。判满后进入锁存：指示灯按 `blink_half_period`
    /// 亮灭交替，永不返回 `Ok`，只有指示灯出错时才以错误退出。
    pub fn check_fullness(&mut self) -> Result<bool, MotionError> {
        if self.is_full()? {
            match self.latch_full()? {}
        }
        Ok(false)
    }

    fn latch_full(&mut self) -> Result<Infallible, MotionError> {
        error!("bin full, latching indicator");
        let half_period = self.config.blink_half_period();
        loop {
            self.hw.indicator.set(true)?;
            self.pacer.pause(half_period);
            self.hw.indicator.set(false)?;
            self.pacer.pause(half_period);
        }
    }
}
