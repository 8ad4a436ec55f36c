//! Mock 硬件
//!
//! 无硬件依赖的模拟实现，供测试与 CLI 模拟运行使用。
//! 每个模拟设备都带一个可克隆的句柄（共享 `Arc<Mutex<..>>`），
//! 设备被移动进控制器后仍可从外部观察和注入状态。

use crate::channel::ChannelId;
use crate::device::{Indicator, RangeSensor, ServoBank};
use crate::error::HalError;
use crate::pacer::Pacer;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

// ==================== 舵机 ====================

/// 一条舵机命令
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoCommand {
    pub channel: ChannelId,
    pub angle: f64,
}

#[derive(Debug, Default)]
struct ServoShared {
    commands: Vec<ServoCommand>,
    /// 成功这么多条命令之后开始失败
    fail_after: Option<usize>,
}

/// 模拟舵机组
///
/// 记录收到的每一条命令。
#[derive(Debug, Clone, Default)]
pub struct SimServoBank {
    shared: Arc<Mutex<ServoShared>>,
}

impl SimServoBank {
    /// 创建模拟舵机组
    pub fn new() -> Self {
        Self::default()
    }

    /// 前 `n` 条命令成功，之后的命令都返回通信错误
    pub fn fail_after(self, n: usize) -> Self {
        self.shared.lock().fail_after = Some(n);
        self
    }

    /// 获取观察句柄
    pub fn log(&self) -> ServoLog {
        ServoLog {
            shared: self.shared.clone(),
        }
    }
}

impl ServoBank for SimServoBank {
    fn set_angle(&mut self, channel: ChannelId, angle: f64) -> Result<(), HalError> {
        let mut shared = self.shared.lock();
        if let Some(limit) = shared.fail_after
            && shared.commands.len() >= limit
        {
            return Err(HalError::Actuator {
                channel,
                message: "simulated bus failure".to_string(),
            });
        }
        trace!("sim servo {} -> {:.1}", channel, angle);
        shared.commands.push(ServoCommand { channel, angle });
        Ok(())
    }
}

/// 模拟舵机组的观察句柄
#[derive(Debug, Clone)]
pub struct ServoLog {
    shared: Arc<Mutex<ServoShared>>,
}

impl ServoLog {
    /// 所有已接受的命令（按时间顺序）
    pub fn commands(&self) -> Vec<ServoCommand> {
        self.shared.lock().commands.clone()
    }

    /// 已接受的命令数量
    pub fn len(&self) -> usize {
        self.shared.lock().commands.len()
    }

    /// 是否没有任何命令
    pub fn is_empty(&self) -> bool {
        self.shared.lock().commands.is_empty()
    }

    /// 指定通道最后一次收到的物理角度
    pub fn last_angle(&self, channel: ChannelId) -> Option<f64> {
        self.shared
            .lock()
            .commands
            .iter()
            .rev()
            .find(|c| c.channel == channel)
            .map(|c| c.angle)
    }

    /// 清空记录
    pub fn clear(&self) {
        self.shared.lock().commands.clear();
    }
}

// ==================== 测距 ====================

#[derive(Debug, Clone, Copy)]
enum Reading {
    Distance(f64),
    Timeout,
}

#[derive(Debug)]
struct SensorShared {
    /// 预设读数，读完后使用 `fallback`
    script: VecDeque<Reading>,
    fallback: Reading,
    reads: usize,
}

/// 模拟测距传感器
#[derive(Debug, Clone)]
pub struct SimRangeSensor {
    shared: Arc<Mutex<SensorShared>>,
}

impl SimRangeSensor {
    /// 始终返回固定距离
    pub fn constant(distance: f64) -> Self {
        Self::with_fallback(VecDeque::new(), Reading::Distance(distance))
    }

    /// 依次返回给定读数，用完后重复最后一个（空序列视为 0.0）
    pub fn sequence(samples: impl IntoIterator<Item = f64>) -> Self {
        let script: VecDeque<Reading> = samples.into_iter().map(Reading::Distance).collect();
        let fallback = script.back().copied().unwrap_or(Reading::Distance(0.0));
        Self::with_fallback(script, fallback)
    }

    /// 始终超时
    pub fn timing_out() -> Self {
        Self::with_fallback(VecDeque::new(), Reading::Timeout)
    }

    fn with_fallback(script: VecDeque<Reading>, fallback: Reading) -> Self {
        Self {
            shared: Arc::new(Mutex::new(SensorShared {
                script,
                fallback,
                reads: 0,
            })),
        }
    }

    /// 获取控制句柄
    pub fn handle(&self) -> SensorHandle {
        SensorHandle {
            shared: self.shared.clone(),
        }
    }
}

impl RangeSensor for SimRangeSensor {
    fn read(&mut self) -> Result<f64, HalError> {
        let mut shared = self.shared.lock();
        shared.reads += 1;
        let reading = match shared.script.pop_front() {
            Some(r) => r,
            None => shared.fallback,
        };
        match reading {
            Reading::Distance(d) => Ok(d),
            Reading::Timeout => Err(HalError::Timeout),
        }
    }
}

/// 模拟测距传感器的控制句柄
#[derive(Debug, Clone)]
pub struct SensorHandle {
    shared: Arc<Mutex<SensorShared>>,
}

impl SensorHandle {
    /// 之后的读数固定为 `distance`（清空剩余预设）
    pub fn set_distance(&self, distance: f64) {
        let mut shared = self.shared.lock();
        shared.script.clear();
        shared.fallback = Reading::Distance(distance);
    }

    /// 在预设队列末尾追加一次超时
    pub fn push_timeout(&self) {
        self.shared.lock().script.push_back(Reading::Timeout);
    }

    /// 累计读取次数
    pub fn reads(&self) -> usize {
        self.shared.lock().reads
    }
}

// ==================== 指示灯 ====================

#[derive(Debug, Default)]
struct IndicatorShared {
    states: Vec<bool>,
    fail_after: Option<usize>,
}

/// 模拟指示灯
#[derive(Debug, Clone, Default)]
pub struct SimIndicator {
    shared: Arc<Mutex<IndicatorShared>>,
}

impl SimIndicator {
    /// 创建模拟指示灯
    pub fn new() -> Self {
        Self::default()
    }

    /// 前 `n` 次切换成功，之后返回错误
    pub fn fail_after(self, n: usize) -> Self {
        self.shared.lock().fail_after = Some(n);
        self
    }

    /// 获取观察句柄
    pub fn log(&self) -> IndicatorLog {
        IndicatorLog {
            shared: self.shared.clone(),
        }
    }
}

impl Indicator for SimIndicator {
    fn set(&mut self, on: bool) -> Result<(), HalError> {
        let mut shared = self.shared.lock();
        if let Some(limit) = shared.fail_after
            && shared.states.len() >= limit
        {
            return Err(HalError::Indicator("simulated pin failure".to_string()));
        }
        shared.states.push(on);
        Ok(())
    }
}

/// 模拟指示灯的观察句柄
#[derive(Debug, Clone)]
pub struct IndicatorLog {
    shared: Arc<Mutex<IndicatorShared>>,
}

impl IndicatorLog {
    /// 所有切换记录
    pub fn states(&self) -> Vec<bool> {
        self.shared.lock().states.clone()
    }
}

// ==================== 延时 ====================

/// 只记录、不休眠的延时源
#[derive(Debug, Clone, Default)]
pub struct RecordingPacer {
    pauses: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingPacer {
    /// 创建记录延时源
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有记录到的延时
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().clone()
    }

    /// 延时次数
    pub fn count(&self) -> usize {
        self.pauses.lock().len()
    }
}

impl Pacer for RecordingPacer {
    fn pause(&mut self, duration: Duration) {
        self.pauses.lock().push(duration);
    }
}
