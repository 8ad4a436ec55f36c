//! # SmartBin Motion - 垃圾桶盖运动控制
//!
//! 四个舵机通道的开盖/关盖编排、标定与满桶检测。
//!
//! ## 包含模块
//!
//! - `controller` - [`BinController`]：通道状态、标定变换、阻塞式序列
//! - `state` - 运动状态机（`begin_open` / `begin_close` / `tick`）
//! - `choreography` - 开盖扫动、让位回缩、关盖斜坡的参数
//! - `fullness` - 满桶检测与指示灯锁存
//! - `service` - [`MotionService`]：工作线程 + 命令通道
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use smartbin_config::{ControllerConfig, FileCalibrationStore};
//! use smartbin_hal::{BinHardware, ChannelId};
//! use smartbin_motion::BinController;
//!
//! let hw = BinHardware::new(servos, sensor, indicator);
//! let store = FileCalibrationStore::open("smartbin.conf")?;
//! let mut bin = BinController::new(hw, store, ControllerConfig::default())?;
//!
//! bin.open(ChannelId::P2)?;
//! bin.close_all()?;
//! bin.check_fullness()?;
//! ```

mod cancel;
pub mod choreography;
mod controller;
mod error;
mod fullness;
mod service;
pub mod state;

pub use cancel::CancelToken;
pub use controller::{BinController, drive_angle};
pub use error::MotionError;
pub use service::{MotionHandle, MotionService};
pub use state::{MotionState, OpenPhase, Tick};
