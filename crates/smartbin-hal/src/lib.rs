//! # SmartBin HAL - 硬件抽象层
//!
//! 桶盖控制器依赖的抽象硬件接口：
//!
//! - [`ServoBank`] - 按通道寻址的舵机组
//! - [`RangeSensor`] - 超声波测距
//! - [`Indicator`] - 满桶指示灯
//! - [`Pacer`] - 步进延时
//!
//! 具体的 GPIO/PWM 驱动不在本 crate 范围内。
//!
//! ## Feature Flags
//!
//! - `mock` - 启用 [`mock`] 模块（模拟硬件，无需树莓派）

mod channel;
mod device;
mod error;
mod pacer;

#[cfg(feature = "mock")]
pub mod mock;

pub use channel::{CHANNEL_COUNT, ChannelArray, ChannelId, InvalidChannel};
pub use device::{BinHardware, Indicator, RangeSensor, ServoBank};
pub use error::HalError;
pub use pacer::{Pacer, SpinPacer};
