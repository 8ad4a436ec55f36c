//! 全局参数与控制器构建
//!
//! 每条命令都是 one-shot：加载配置、打开标定文件、构建控制器（含归位），执行后退出。

use anyhow::{Context, Result, anyhow};
use clap::Args;
use smartbin_config::{ControllerConfig, FileCalibrationStore};
use smartbin_hal::BinHardware;
use smartbin_hal::mock::{SimIndicator, SimRangeSensor, SimServoBank};
use smartbin_motion::BinController;
use std::path::PathBuf;
use tracing::info;

/// 运行在模拟硬件上的控制器
pub type SimBin = BinController<SimServoBank, SimRangeSensor, SimIndicator>;

/// 默认标定文件：`<config_dir>/smartbin/smartbin.conf`
pub fn default_calibration_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow!("无法确定配置目录"))?;
    path.push("smartbin");
    path.push("smartbin.conf");
    Ok(path)
}

/// 全局参数
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// 标定文件路径
    #[arg(long, global = true)]
    pub calibration: Option<PathBuf>,

    /// 控制器配置（TOML）
    #[arg(long, global = true)]
    pub profile: Option<PathBuf>,

    /// 模拟测距读数（cm）
    #[arg(long, global = true, default_value_t = 50.0)]
    pub sim_distance: f64,
}

impl GlobalArgs {
    /// 标定文件路径（命令行参数优先）
    pub fn calibration_path(&self) -> Result<PathBuf> {
        match &self.calibration {
            Some(path) => Ok(path.clone()),
            None => default_calibration_path(),
        }
    }

    /// 加载控制器配置，未指定时使用默认值
    pub fn load_profile(&self) -> Result<ControllerConfig> {
        match &self.profile {
            Some(path) => ControllerConfig::load_from_file(path)
                .with_context(|| format!("加载配置失败: {}", path.display())),
            None => Ok(ControllerConfig::default()),
        }
    }

    /// 构建控制器并归位
    pub fn connect(&self) -> Result<SimBin> {
        let config = self.load_profile()?;
        let path = self.calibration_path()?;
        let store = FileCalibrationStore::open(&path)
            .with_context(|| format!("打开标定文件失败: {}", path.display()))?;
        info!("calibration file: {}", path.display());

        let hw = BinHardware::new(
            SimServoBank::new(),
            SimRangeSensor::constant(self.sim_distance),
            SimIndicator::new(),
        );
        BinController::new(hw, store, config).context("控制器初始化失败")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartbin_hal::ChannelId;
    use std::fs;
    use tempfile::TempDir;

    fn args(dir: &TempDir) -> GlobalArgs {
        GlobalArgs {
            calibration: Some(dir.path().join("smartbin.conf")),
            profile: None,
            sim_distance: 42.0,
        }
    }

    #[test]
    fn test_default_calibration_path() {
        if let Ok(path) = default_calibration_path() {
            assert!(path.ends_with("smartbin/smartbin.conf"));
        }
    }

    #[test]
    fn test_connect_with_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let mut bin = args(&dir).connect().unwrap();

        assert_eq!(bin.calibration_offset(ChannelId::P1), 90.0);
        assert_eq!(bin.get_distance().unwrap(), 42.0);
    }

    #[test]
    fn test_connect_reads_calibration_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("smartbin.conf"),
            "# smartbin calibration\nsmartbin_servo_p3 = 77\n",
        )
        .unwrap();

        let bin = args(&dir).connect().unwrap();
        assert_eq!(bin.calibration_offset(ChannelId::P3), 77.0);
    }

    #[test]
    fn test_connect_with_profile() {
        let dir = TempDir::new().unwrap();
        let profile = dir.path().join("profile.toml");
        fs::write(&profile, "step_delay_ms = 5\n").unwrap();

        let mut global = args(&dir);
        global.profile = Some(profile);
        let bin = global.connect().unwrap();
        assert_eq!(bin.config().step_delay_ms, 5);
    }

    #[test]
    fn test_connect_rejects_bad_profile() {
        let dir = TempDir::new().unwrap();
        let profile = dir.path().join("profile.toml");
        fs::write(&profile, "fullness_samples = 0\n").unwrap();

        let mut global = args(&dir);
        global.profile = Some(profile);
        let err = global.connect().err().unwrap();
        assert!(err.to_string().contains("加载配置失败"));
    }
}
