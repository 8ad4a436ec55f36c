//! 记录调用顺序的 Mock
//!
//! 存储和舵机写入同一条事件流，用来验证“先持久化、后动作”。

use smartbin_config::{CalibrationStore, ConfigError};
use smartbin_hal::{ChannelId, HalError, ServoBank};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// 共享事件流
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

/// 写入事件流的存储
#[derive(Debug)]
pub struct OrderedStore {
    log: EventLog,
    entries: BTreeMap<String, String>,
    fail: bool,
}

impl OrderedStore {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            entries: BTreeMap::new(),
            fail: false,
        }
    }

    /// 所有写入都失败
    pub fn failing(log: EventLog) -> Self {
        Self {
            fail: true,
            ..Self::new(log)
        }
    }
}

impl CalibrationStore for OrderedStore {
    fn get(&self, key: &str, default: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        if self.fail {
            return Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only store",
            )));
        }
        self.log.push(format!("store {}={}", key, value));
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// 写入事件流的舵机组
#[derive(Debug)]
pub struct OrderedServos {
    log: EventLog,
}

impl OrderedServos {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl ServoBank for OrderedServos {
    fn set_angle(&mut self, channel: ChannelId, angle: f64) -> Result<(), HalError> {
        self.log.push(format!("servo {} {}", channel, angle));
        Ok(())
    }
}
