//! # 控制器配置
//!
//! 每个通道的开盖角度、硬限位、默认标定值，以及步进时序和满桶判定参数。
//! 默认值与出厂结构一致，可以用 TOML 文件覆盖：
//!
//! ```toml
//! step_delay_ms = 100
//! full_threshold = 10.0
//!
//! [[channels]]
//! open_angle = 55
//! default_calibration = 55.0
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use smartbin_hal::{CHANNEL_COUNT, ChannelArray};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 单个通道的静态参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelProfile {
    /// 开盖扫动角度（度）
    pub open_angle: i32,

    /// 角度下限（度）
    #[serde(default = "default_min_angle")]
    pub min_angle: f64,

    /// 角度上限（度）
    #[serde(default = "default_max_angle")]
    pub max_angle: f64,

    /// 存储中没有标定值时使用的默认偏移（度）
    pub default_calibration: f64,
}

impl ChannelProfile {
    /// 把角度钳位到 `[min_angle, max_angle]`
    pub fn clamp(&self, angle: f64) -> f64 {
        angle.clamp(self.min_angle, self.max_angle)
    }

    /// 钳位后向零取整
    ///
    /// 非整数限位时，取整结果再收进限位内的整数区间。
    pub fn clamp_whole(&self, angle: f64) -> i32 {
        let lo = self.min_angle.ceil();
        let hi = self.max_angle.floor();
        self.clamp(angle).trunc().clamp(lo, hi) as i32
    }
}

fn default_min_angle() -> f64 {
    -360.0
}

fn default_max_angle() -> f64 {
    360.0
}

/// 控制器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// 运动序列每一步之后的延时（ms）
    pub step_delay_ms: u64,

    /// 满桶阈值：平均距离严格小于此值判定为满（传感器原生单位）
    pub full_threshold: f64,

    /// 满桶判定的采样次数
    pub fullness_samples: usize,

    /// 满桶指示灯亮/灭各持续的时间（ms）
    pub blink_half_period_ms: u64,

    /// 通道参数（必须正好 4 个，按 P0-P3 顺序）
    pub channels: Vec<ChannelProfile>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: 100,
            full_threshold: 10.0,
            fullness_samples: 10,
            blink_half_period_ms: 300,
            channels: vec![
                ChannelProfile {
                    open_angle: 55,
                    min_angle: -360.0,
                    max_angle: 360.0,
                    default_calibration: 55.0,
                },
                ChannelProfile {
                    open_angle: 40,
                    min_angle: -360.0,
                    max_angle: 360.0,
                    default_calibration: 90.0,
                },
                ChannelProfile {
                    open_angle: 45,
                    min_angle: -360.0,
                    max_angle: 360.0,
                    default_calibration: -25.0,
                },
                ChannelProfile {
                    open_angle: 55,
                    min_angle: -360.0,
                    max_angle: 360.0,
                    default_calibration: 80.0,
                },
            ],
        }
    }
}

impl ControllerConfig {
    /// 从 TOML 文本解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ControllerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 序列化为 TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channels.len() != CHANNEL_COUNT {
            return Err(ConfigError::Invalid(format!(
                "expected {} channels, found {}",
                CHANNEL_COUNT,
                self.channels.len()
            )));
        }
        if self.fullness_samples == 0 {
            return Err(ConfigError::Invalid(
                "fullness_samples must be > 0".to_string(),
            ));
        }
        if !self.full_threshold.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "full_threshold must be finite, got {}",
                self.full_threshold
            )));
        }

        for (i, ch) in self.channels.iter().enumerate() {
            if !(ch.min_angle.is_finite() && ch.max_angle.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "channel P{} limits must be finite",
                    i
                )));
            }
            if ch.min_angle > ch.max_angle {
                return Err(ConfigError::Invalid(format!(
                    "channel P{}: min_angle {} > max_angle {}",
                    i, ch.min_angle, ch.max_angle
                )));
            }
            if ch.min_angle.ceil() > ch.max_angle.floor() {
                return Err(ConfigError::Invalid(format!(
                    "channel P{}: no whole-degree angle within [{}, {}]",
                    i, ch.min_angle, ch.max_angle
                )));
            }
            if ch.open_angle < 0 {
                return Err(ConfigError::Invalid(format!(
                    "channel P{}: open_angle must be >= 0, got {}",
                    i, ch.open_angle
                )));
            }
            if !ch.default_calibration.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "channel P{}: default_calibration must be finite",
                    i
                )));
            }
        }

        Ok(())
    }

    /// 校验并转换为通道数组
    pub fn channel_profiles(&self) -> Result<ChannelArray<ChannelProfile>, ConfigError> {
        self.validate()?;
        let arr: [ChannelProfile; CHANNEL_COUNT] = self
            .channels
            .as_slice()
            .try_into()
            .map_err(|_| ConfigError::Invalid("channel count mismatch".to_string()))?;
        Ok(ChannelArray::new(arr))
    }

    /// 步进延时
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// 指示灯半周期
    pub fn blink_half_period(&self) -> Duration {
        Duration::from_millis(self.blink_half_period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartbin_hal::ChannelId;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ControllerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.step_delay(), Duration::from_millis(100));
        assert_eq!(config.blink_half_period(), Duration::from_millis(300));

        let profiles = config.channel_profiles().unwrap();
        let open: Vec<i32> = profiles.iter().map(|p| p.open_angle).collect();
        assert_eq!(open, vec![55, 40, 45, 55]);
        assert_eq!(profiles[ChannelId::P2].default_calibration, -25.0);
        assert_eq!(profiles[ChannelId::P3].max_angle, 360.0);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ControllerConfig::from_toml_str("step_delay_ms = 20\n").unwrap();
        assert_eq!(config.step_delay_ms, 20);
        assert_eq!(config.full_threshold, 10.0);
        assert_eq!(config.channels.len(), 4);
    }

    #[test]
    fn test_channel_limits_default_when_omitted() {
        let toml = r#"
[[channels]]
open_angle = 30
default_calibration = 0.0

[[channels]]
open_angle = 30
default_calibration = 0.0
min_angle = -90.0
max_angle = 90.0

[[channels]]
open_angle = 30
default_calibration = 0.0

[[channels]]
open_angle = 30
default_calibration = 0.0
"#;
        let config = ControllerConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.channels[0].min_angle, -360.0);
        assert_eq!(config.channels[1].max_angle, 90.0);
    }

    #[test]
    fn test_rejects_wrong_channel_count() {
        let toml = r#"
[[channels]]
open_angle = 30
default_calibration = 0.0
"#;
        let err = ControllerConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{:?}", err);
    }

    #[test]
    fn test_rejects_inverted_limits() {
        let mut config = ControllerConfig::default();
        config.channels[2].min_angle = 10.0;
        config.channels[2].max_angle = -10.0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("P2"));
        assert!(config.channel_profiles().is_err());
    }

    #[test]
    fn test_rejects_zero_samples() {
        let config = ControllerConfig {
            fullness_samples: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_clamp() {
        let profile = ChannelProfile {
            open_angle: 40,
            min_angle: -45.0,
            max_angle: 45.0,
            default_calibration: 0.0,
        };
        assert_eq!(profile.clamp(100.0), 45.0);
        assert_eq!(profile.clamp(-100.0), -45.0);
        assert_eq!(profile.clamp(12.5), 12.5);
    }

    #[test]
    fn test_clamp_whole_truncates_toward_zero() {
        let profile = ChannelProfile {
            open_angle: 40,
            min_angle: -360.0,
            max_angle: 360.0,
            default_calibration: 0.0,
        };
        assert_eq!(profile.clamp_whole(37.9), 37);
        assert_eq!(profile.clamp_whole(-37.9), -37);
        assert_eq!(profile.clamp_whole(1000.0), 360);
        assert_eq!(profile.clamp_whole(-1000.0), -360);

        let offset = ChannelProfile {
            min_angle: 10.5,
            max_angle: 20.5,
            ..profile
        };
        assert_eq!(offset.clamp_whole(0.0), 11);
        assert_eq!(offset.clamp_whole(99.0), 20);
    }

    #[test]
    fn test_rejects_limits_without_whole_degree() {
        let mut config = ControllerConfig::default();
        config.channels[0].min_angle = 10.2;
        config.channels[0].max_angle = 10.8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.toml");

        let mut config = ControllerConfig::default();
        config.step_delay_ms = 50;
        config.channels[1].open_angle = 35;
        config.save_to_file(&path).unwrap();

        let loaded = ControllerConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
