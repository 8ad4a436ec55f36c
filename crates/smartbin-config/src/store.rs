//! # 标定存储
//!
//! 每个舵机通道的标定偏移以 `smartbin_servo_p{n}` 为键持久化。
//!
//! 文件格式为逐行 `key = value`：
//!
//! ```text
//! # smartbin calibration
//! smartbin_servo_p0 = 55
//! smartbin_servo_p1 = 90
//! ```
//!
//! 空行和 `#` 开头的行被忽略。文件只在打开时读取一次，
//! 之后每次 `set` 都同步重写整个文件。

use crate::error::ConfigError;
use smartbin_hal::ChannelId;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const FILE_HEADER: &str = "# smartbin calibration";

/// 键值存储接口
pub trait CalibrationStore {
    /// 读取 `key`，不存在时返回 `default`
    fn get(&self, key: &str, default: &str) -> String;

    /// 写入 `key` 并立即持久化
    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError>;
}

impl<T: CalibrationStore + ?Sized> CalibrationStore for Box<T> {
    fn get(&self, key: &str, default: &str) -> String {
        (**self).get(key, default)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        (**self).set(key, value)
    }
}

/// 通道对应的存储键
pub fn calibration_key(channel: ChannelId) -> String {
    format!("smartbin_servo_p{}", channel.index())
}

/// 读取通道标定值
///
/// 键不存在时返回 `default`；值不是合法浮点数时返回 [`ConfigError::InvalidValue`]。
pub fn read_calibration<S: CalibrationStore + ?Sized>(
    store: &S,
    channel: ChannelId,
    default: f64,
) -> Result<f64, ConfigError> {
    let key = calibration_key(channel);
    let raw = store.get(&key, &default.to_string());
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(ConfigError::InvalidValue { key, value: raw })
}

/// 写入通道标定值
pub fn write_calibration<S: CalibrationStore + ?Sized>(
    store: &mut S,
    channel: ChannelId,
    value: f64,
) -> Result<(), ConfigError> {
    store.set(&calibration_key(channel), &value.to_string())
}

/// 内存存储（测试、模拟运行）
#[derive(Debug, Clone, Default)]
pub struct MemoryCalibrationStore {
    entries: BTreeMap<String, String>,
}

impl MemoryCalibrationStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一个键值
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

impl CalibrationStore for MemoryCalibrationStore {
    fn get(&self, key: &str, default: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// 文件存储
#[derive(Debug, Clone)]
pub struct FileCalibrationStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileCalibrationStore {
    /// 打开存储文件
    ///
    /// 文件不存在视为空存储（第一次 `set` 时创建）。
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            parse_entries(&fs::read_to_string(&path)?)
        } else {
            debug!("calibration file {} not found, using defaults", path.display());
            BTreeMap::new()
        };

        Ok(Self { path, entries })
    }

    /// 存储文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 是否存有 `key`
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// 写回磁盘（先写临时文件再 rename）
    fn persist(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut content = String::from(FILE_HEADER);
        content.push('\n');
        for (key, value) in &self.entries {
            content.push_str(&format!("{} = {}\n", key, value));
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CalibrationStore for FileCalibrationStore {
    fn get(&self, key: &str, default: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let previous = self.entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist() {
            // 磁盘写入失败时回滚内存副本
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        debug!("persisted {} = {} to {}", key, value, self.path.display());
        Ok(())
    }
}

fn parse_entries(content: &str) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) => {
                entries.insert(key.trim().to_string(), value.trim().to_string());
            },
            None => warn!("ignoring malformed calibration line {}: {:?}", lineno + 1, line),
        }
    }
    entries
}
