//! 运动控制层错误类型定义

use smartbin_config::ConfigError;
use smartbin_hal::HalError;
use thiserror::Error;

/// 运动控制错误
#[derive(Error, Debug)]
pub enum MotionError {
    /// 硬件通信错误（原样传播，不重试）
    #[error("Hardware error: {0}")]
    Hal(#[from] HalError),

    /// 配置或标定存储错误
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// 已有运动序列在执行
    #[error("Motion sequence already in progress")]
    Busy,

    /// 运动序列被取消
    #[error("Motion sequence cancelled")]
    Cancelled,

    /// 运动服务线程已退出
    #[error("Motion service closed")]
    ServiceClosed,
}
