//! 硬件层错误类型定义

use crate::channel::ChannelId;
use thiserror::Error;

/// 硬件通信错误
///
/// 控制器不做任何重试，这些错误原样向上传播。
#[derive(Error, Debug)]
pub enum HalError {
    /// 舵机通信失败
    #[error("Actuator {channel} communication failed: {message}")]
    Actuator {
        channel: ChannelId,
        message: String,
    },

    /// 测距超时（未收到回波）
    #[error("Range sensor timeout")]
    Timeout,

    /// 测距传感器错误
    #[error("Range sensor error: {0}")]
    Sensor(String),

    /// 指示灯错误
    #[error("Indicator error: {0}")]
    Indicator(String),

    /// 底层 IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
