//! # SmartBin Config - 标定存储与控制器配置
//!
//! ## 包含模块
//!
//! - `store` - 标定偏移的键值存储（文件 / 内存）
//! - `profile` - 控制器配置（TOML）

mod error;
pub mod profile;
pub mod store;

pub use error::ConfigError;
pub use profile::{ChannelProfile, ControllerConfig};
pub use store::{
    CalibrationStore, FileCalibrationStore, MemoryCalibrationStore, calibration_key,
    read_calibration, write_calibration,
};
