//! 测试辅助函数
//!
//! 提供快速创建测试环境的工具函数。

use smartbin_config::{ControllerConfig, MemoryCalibrationStore};
use smartbin_hal::mock::{
    IndicatorLog, RecordingPacer, SensorHandle, ServoCommand, ServoLog, SimIndicator,
    SimRangeSensor, SimServoBank,
};
use smartbin_hal::{BinHardware, ChannelId, Pacer};
use smartbin_motion::{BinController, CancelToken};
use std::time::Duration;

/// 控制器构造时的归位命令数
pub const HOMING_COMMANDS: usize = 4;

pub type SimController = BinController<SimServoBank, SimRangeSensor, SimIndicator>;

/// 测试配置
#[derive(Debug, Clone)]
pub struct RigConfig {
    /// 模拟测距读数
    pub distance: f64,
    /// 归位之后再成功多少条舵机命令
    pub servo_fail_after: Option<usize>,
    /// 指示灯成功切换次数
    pub indicator_fail_after: Option<usize>,
    /// 控制器配置
    pub config: ControllerConfig,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            distance: 50.0,
            servo_fail_after: None,
            indicator_fail_after: None,
            config: ControllerConfig::default(),
        }
    }
}

/// 模拟硬件 + 控制器 + 观察句柄
pub struct Rig {
    pub controller: SimController,
    pub servos: ServoLog,
    pub sensor: SensorHandle,
    pub leds: IndicatorLog,
    pub pacer: RecordingPacer,
}

impl Rig {
    /// 归位之后的舵机命令
    pub fn motion_commands(&self) -> Vec<ServoCommand> {
        self.servos.commands().split_off(HOMING_COMMANDS)
    }

    /// 所有通道的指令角度
    pub fn angles(&self) -> [i32; 4] {
        self.controller.commanded_angles().into_array()
    }
}

/// 快速创建标准测试环境
pub fn setup_rig() -> Rig {
    setup_rig_with(RigConfig::default())
}

/// 使用自定义配置创建测试环境
pub fn setup_rig_with(cfg: RigConfig) -> Rig {
    let mut servos = SimServoBank::new();
    if let Some(n) = cfg.servo_fail_after {
        servos = servos.fail_after(HOMING_COMMANDS + n);
    }
    let mut indicator = SimIndicator::new();
    if let Some(n) = cfg.indicator_fail_after {
        indicator = indicator.fail_after(n);
    }
    let sensor = SimRangeSensor::constant(cfg.distance);

    let servo_log = servos.log();
    let sensor_handle = sensor.handle();
    let leds = indicator.log();
    let pacer = RecordingPacer::new();

    let hw = BinHardware::new(servos, sensor, indicator);
    let controller = BinController::new(hw, MemoryCalibrationStore::new(), cfg.config)
        .expect("controller construction failed")
        .with_pacer(pacer.clone());

    Rig {
        controller,
        servos: servo_log,
        sensor: sensor_handle,
        leds,
        pacer,
    }
}

/// 第 `after` 次延时时触发取消的延时源
#[derive(Debug, Clone)]
pub struct CancellingPacer {
    token: CancelToken,
    after: usize,
    count: usize,
}

impl CancellingPacer {
    pub fn new(token: CancelToken, after: usize) -> Self {
        Self {
            token,
            after,
            count: 0,
        }
    }
}

impl Pacer for CancellingPacer {
    fn pause(&mut self, _duration: Duration) {
        self.count += 1;
        if self.count == self.after {
            self.token.cancel();
        }
    }
}

/// 某通道收到的所有物理角度
pub fn angles_for(commands: &[ServoCommand], channel: ChannelId) -> Vec<f64> {
    commands
        .iter()
        .filter(|c| c.channel == channel)
        .map(|c| c.angle)
        .collect()
}
