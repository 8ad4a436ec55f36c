//! 硬件接口
//!
//! 控制器只依赖这里定义的 trait，具体的舵机/超声波/LED 驱动由外部实现。

use crate::channel::ChannelId;
use crate::error::HalError;

/// 舵机组（执行器接口）
///
/// 单轴角度执行器的集合，按通道寻址。`angle` 是已经过标定变换的物理角度（度）。
pub trait ServoBank {
    /// 命令指定通道转到 `angle`
    fn set_angle(&mut self, channel: ChannelId, angle: f64) -> Result<(), HalError>;
}

/// 测距传感器接口
pub trait RangeSensor {
    /// 阻塞读取一次距离（传感器原生单位，超声波为 cm）
    ///
    /// 超时返回 [`HalError::Timeout`]。
    fn read(&mut self) -> Result<f64, HalError>;
}

/// 指示灯接口
pub trait Indicator {
    /// 打开或关闭指示灯
    fn set(&mut self, on: bool) -> Result<(), HalError>;
}

impl<T: ServoBank + ?Sized> ServoBank for Box<T> {
    fn set_angle(&mut self, channel: ChannelId, angle: f64) -> Result<(), HalError> {
        (**self).set_angle(channel, angle)
    }
}

impl<T: RangeSensor + ?Sized> RangeSensor for Box<T> {
    fn read(&mut self) -> Result<f64, HalError> {
        (**self).read()
    }
}

impl<T: Indicator + ?Sized> Indicator for Box<T> {
    fn set(&mut self, on: bool) -> Result<(), HalError> {
        (**self).set(on)
    }
}

/// 垃圾桶硬件句柄集合
///
/// 由控制器独占持有，替代全局单例。
#[derive(Debug)]
pub struct BinHardware<S, R, I> {
    /// 舵机组
    pub servos: S,
    /// 测距传感器
    pub sensor: R,
    /// 满桶指示灯
    pub indicator: I,
}

impl<S, R, I> BinHardware<S, R, I>
where
    S: ServoBank,
    R: RangeSensor,
    I: Indicator,
{
    /// 组装硬件句柄
    pub fn new(servos: S, sensor: R, indicator: I) -> Self {
        Self {
            servos,
            sensor,
            indicator,
        }
    }
}
