//! 命令定义和实现

pub mod calibrate;
pub mod config;
pub mod motion;
pub mod open;
pub mod sensor;
pub mod sweep;

pub use calibrate::CalibrateCommand;
pub use config::ConfigCommand;
pub use open::OpenCommand;
pub use sensor::FullnessCommand;
pub use sweep::SweepCommand;
