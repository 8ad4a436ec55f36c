//! 垃圾桶运动控制器
//!
//! [`BinController`] 独占硬件句柄，维护每个通道的标定偏移与指令角度，
//! 并驱动开盖/关盖状态机。
//!
//! # 角度约定
//!
//! - **指令角度**：通道相对自身零位的逻辑角度（整数度），关闭位置为 0
//! - **驱动角度**：真正发给舵机的角度，`-(指令角度 - 标定偏移)`
//!
//! 舵机永远只接收经过变换的驱动角度；只有标定归位会直接发送原始标定值。

use crate::cancel::CancelToken;
use crate::choreography::{
    CLEARANCE_STEPS, CLOSE_STEPS, SWEEP_STEPS, clearance_angles, clearance_for, close_step,
    sweep_angle,
};
use crate::error::MotionError;
use crate::state::{MotionState, OpenPhase, Tick};
use smartbin_config::{
    CalibrationStore, ChannelProfile, ConfigError, ControllerConfig, calibration_key,
    read_calibration, write_calibration,
};
use smartbin_hal::{
    BinHardware, ChannelArray, ChannelId, HalError, Indicator, Pacer, RangeSensor, ServoBank,
    SpinPacer,
};
use tracing::{debug, info, trace, warn};

/// 指令角度到驱动角度的标定变换
#[inline]
pub fn drive_angle(commanded: i32, calibration_offset: f64) -> f64 {
    -(commanded as f64 - calibration_offset)
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ChannelState {
    pub(crate) calibration_offset: f64,
    pub(crate) commanded_angle: i32,
}

/// 垃圾桶运动控制器
pub struct BinController<S, R, I> {
    pub(crate) hw: BinHardware<S, R, I>,
    store: Box<dyn CalibrationStore + Send>,
    pub(crate) pacer: Box<dyn Pacer + Send>,
    profiles: ChannelArray<ChannelProfile>,
    pub(crate) channels: ChannelArray<ChannelState>,
    pub(crate) config: ControllerConfig,
    motion: MotionState,
}

impl<S, R, I> BinController<S, R, I>
where
    S: ServoBank,
    R: RangeSensor,
    I: Indicator,
{
    /// 创建控制器并归位
    ///
    /// 1. 从存储读取每个通道的标定偏移（缺失时使用配置中的默认值）
    /// 2. 按 P0-P3 顺序把每个舵机转到原始标定值
    /// 3. 所有指令角度置 0
    ///
    /// # 错误
    ///
    /// - 配置不合法或存储中的标定值无法解析：[`MotionError::Config`]
    /// - 归位时舵机通信失败：[`MotionError::Hal`]
    pub fn new<C>(
        hardware: BinHardware<S, R, I>,
        store: C,
        config: ControllerConfig,
    ) -> Result<Self, MotionError>
    where
        C: CalibrationStore + Send + 'static,
    {
        let profiles = config.channel_profiles()?;

        let mut offsets = [0.0; smartbin_hal::CHANNEL_COUNT];
        for ch in ChannelId::ALL {
            offsets[ch.index()] =
                read_calibration(&store, ch, profiles[ch].default_calibration)?;
        }
        let channels = ChannelArray::from(offsets).map(|calibration_offset| ChannelState {
            calibration_offset,
            commanded_angle: 0,
        });

        let mut controller = Self {
            hw: hardware,
            store: Box::new(store),
            pacer: Box::new(SpinPacer::new()),
            profiles,
            channels,
            config,
            motion: MotionState::Idle,
        };

        for ch in ChannelId::ALL {
            let offset = controller.channels[ch].calibration_offset;
            debug!("homing {} to {}", ch, offset);
            controller.hw.servos.set_angle(ch, offset)?;
        }
        info!("bin controller ready, offsets {:?}", offsets);

        Ok(controller)
    }

    /// 替换延时源（测试中注入不休眠的实现）
    pub fn with_pacer<P>(mut self, pacer: P) -> Self
    where
        P: Pacer + Send + 'static,
    {
        self.pacer = Box::new(pacer);
        self
    }

    // ==================== 单通道操作 ====================

    /// 设置通道指令角度
    ///
    /// 请求值钳位到通道限位并向零取整后记为新的指令角度，
    /// 经标定变换后向舵机发送恰好一条命令。
    ///
    /// 运动序列执行期间返回 [`MotionError::Busy`]。
    pub fn set_channel_angle(
        &mut self,
        channel: ChannelId,
        requested: f64,
    ) -> Result<(), MotionError> {
        self.ensure_idle()?;
        self.drive(channel, requested)?;
        Ok(())
    }

    /// 标定通道并立即归位
    ///
    /// 先同步写入存储，成功后才更新内存中的偏移并把舵机转到原始标定值。
    /// 写入失败时舵机不动，偏移保持不变。归位后该通道指令角度为 0。
    pub fn calibrate_channel(&mut self, channel: ChannelId, value: f64) -> Result<(), MotionError> {
        self.ensure_idle()?;
        if !value.is_finite() {
            return Err(ConfigError::InvalidValue {
                key: calibration_key(channel),
                value: value.to_string(),
            }
            .into());
        }

        write_calibration(&mut *self.store, channel, value)?;

        let state = &mut self.channels[channel];
        state.calibration_offset = value;
        state.commanded_angle = 0;
        self.hw.servos.set_angle(channel, value)?;
        info!("calibrated {} to {}", channel, value);
        Ok(())
    }

    /// 所有通道立即回到 0（无延时）
    pub fn reset(&mut self) -> Result<(), MotionError> {
        self.ensure_idle()?;
        self.reset_channels()?;
        Ok(())
    }

    // ==================== 阻塞式序列 ====================

    /// 打开 `channel` 的盖子（阻塞）
    ///
    /// 主扫动 10 步 + 让位回缩 5 步，每步之后等待 `step_delay`。
    pub fn open(&mut self, channel: ChannelId) -> Result<(), MotionError> {
        self.begin_open(channel)?;
        self.run_to_completion()
    }

    /// 所有通道一起回到 0（阻塞）
    pub fn close_all(&mut self) -> Result<(), MotionError> {
        self.begin_close()?;
        self.run_to_completion()
    }

    /// 可取消的 [`open`](Self::open)
    pub fn open_cancellable(
        &mut self,
        channel: ChannelId,
        token: &CancelToken,
    ) -> Result<(), MotionError> {
        self.begin_open(channel)?;
        self.run_cancellable(token)
    }

    /// 可取消的 [`close_all`](Self::close_all)
    pub fn close_all_cancellable(&mut self, token: &CancelToken) -> Result<(), MotionError> {
        self.begin_close()?;
        self.run_cancellable(token)
    }

    // ==================== 状态机 ====================

    /// 开始开盖序列
    pub fn begin_open(&mut self, channel: ChannelId) -> Result<(), MotionError> {
        self.ensure_idle()?;
        info!(
            "opening {} (open_angle {})",
            channel, self.profiles[channel].open_angle
        );
        self.motion = MotionState::Opening {
            target: channel,
            phase: OpenPhase::Sweep,
            step: 1,
        };
        Ok(())
    }

    /// 开始关盖序列
    ///
    /// 每个通道的步长按此刻的指令角度计算，之后不再变化。
    pub fn begin_close(&mut self) -> Result<(), MotionError> {
        self.ensure_idle()?;
        let steps = self.channels.map(|c| close_step(c.commanded_angle));
        info!(
            "closing all from {:?}",
            self.commanded_angles().into_array()
        );
        self.motion = MotionState::Closing { step: 0, steps };
        Ok(())
    }

    /// 推进状态机一个时间片
    ///
    /// 硬件错误会中止当前序列（状态回到 `Idle`），通道停在最后一次指令的位置。
    pub fn tick(&mut self) -> Result<Tick, MotionError> {
        let state = std::mem::replace(&mut self.motion, MotionState::Idle);
        match self.step_state(state) {
            Ok((next, tick)) => {
                self.motion = next;
                Ok(tick)
            },
            Err(e) => {
                warn!("motion sequence aborted: {}", e);
                Err(e.into())
            },
        }
    }

    /// 中止当前序列
    ///
    /// 通道保持在最后一次指令的位置。返回是否真的中止了一个序列。
    pub fn cancel(&mut self) -> bool {
        let was = std::mem::replace(&mut self.motion, MotionState::Idle);
        if was.is_idle() {
            return false;
        }
        warn!(
            "motion sequence cancelled at {:?}",
            self.commanded_angles().into_array()
        );
        true
    }

    /// 一直推进到序列结束
    ///
    /// 每个 `Stepped` 之后等待 `step_delay`。
    pub fn run_to_completion(&mut self) -> Result<(), MotionError> {
        let delay = self.config.step_delay();
        loop {
            match self.tick()? {
                Tick::Stepped => self.pacer.pause(delay),
                Tick::Finished => return Ok(()),
            }
        }
    }

    /// 可取消地推进到序列结束
    ///
    /// 每次 tick 之前检查 `token`；已取消时中止序列并返回 [`MotionError::Cancelled`]。
    pub fn run_cancellable(&mut self, token: &CancelToken) -> Result<(), MotionError> {
        let delay = self.config.step_delay();
        loop {
            if token.is_cancelled() {
                self.cancel();
                return Err(MotionError::Cancelled);
            }
            match self.tick()? {
                Tick::Stepped => self.pacer.pause(delay),
                Tick::Finished => return Ok(()),
            }
        }
    }

    // ==================== 访问器 ====================

    /// 通道当前的指令角度
    pub fn commanded_angle(&self, channel: ChannelId) -> i32 {
        self.channels[channel].commanded_angle
    }

    /// 所有通道的指令角度
    pub fn commanded_angles(&self) -> ChannelArray<i32> {
        self.channels.map(|c| c.commanded_angle)
    }

    /// 通道的标定偏移
    pub fn calibration_offset(&self, channel: ChannelId) -> f64 {
        self.channels[channel].calibration_offset
    }

    /// 通道静态参数
    pub fn profile(&self, channel: ChannelId) -> &ChannelProfile {
        &self.profiles[channel]
    }

    /// 控制器配置
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// 当前运动状态
    pub fn motion_state(&self) -> MotionState {
        self.motion
    }

    /// 是否空闲
    pub fn is_idle(&self) -> bool {
        self.motion.is_idle()
    }

    /// 硬件句柄
    pub fn hardware(&self) -> &BinHardware<S, R, I> {
        &self.hw
    }

    // ==================== 内部 ====================

    fn ensure_idle(&self) -> Result<(), MotionError> {
        if self.motion.is_idle() {
            Ok(())
        } else {
            Err(MotionError::Busy)
        }
    }

    /// 钳位、取整、记录，然后发送一条舵机命令
    fn drive(&mut self, channel: ChannelId, requested: f64) -> Result<(), HalError> {
        let profile = &self.profiles[channel];
        let commanded = if requested.is_nan() {
            profile.clamp_whole(0.0)
        } else {
            profile.clamp_whole(requested)
        };
        if requested.is_nan() || profile.clamp(requested) != requested {
            warn!(
                "{} request {} clamped to {} (limits [{}, {}])",
                channel, requested, commanded, profile.min_angle, profile.max_angle
            );
        }

        let state = &mut self.channels[channel];
        state.commanded_angle = commanded;
        let angle = drive_angle(commanded, state.calibration_offset);
        trace!("{} commanded {} -> drive {}", channel, commanded, angle);
        self.hw.servos.set_angle(channel, angle)
    }

    fn reset_channels(&mut self) -> Result<(), HalError> {
        for ch in ChannelId::ALL {
            self.drive(ch, 0.0)?;
        }
        Ok(())
    }

    fn step_state(&mut self, state: MotionState) -> Result<(MotionState, Tick), HalError> {
        match state {
            MotionState::Idle => Ok((MotionState::Idle, Tick::Finished)),

            MotionState::Opening {
                target,
                phase: OpenPhase::Sweep,
                step,
            } => {
                let angle = sweep_angle(self.profiles[target].open_angle, step);
                self.drive(target, angle as f64)?;
                debug!("open {} sweep {}/{}: {}", target, step, SWEEP_STEPS, angle);

                let next = if step < SWEEP_STEPS {
                    MotionState::Opening {
                        target,
                        phase: OpenPhase::Sweep,
                        step: step + 1,
                    }
                } else {
                    MotionState::Opening {
                        target,
                        phase: OpenPhase::Clearance,
                        step: 0,
                    }
                };
                Ok((next, Tick::Stepped))
            },

            MotionState::Opening {
                target,
                phase: OpenPhase::Clearance,
                step,
            } if step < CLEARANCE_STEPS => {
                let group = clearance_for(target);
                let (full, half) = clearance_angles(step);
                self.drive(group.full, full as f64)?;
                self.drive(group.half_a, half as f64)?;
                self.drive(group.half_b, half as f64)?;
                debug!(
                    "open {} clearance {}/{}: {}={} {}={} {}={}",
                    target,
                    step + 1,
                    CLEARANCE_STEPS,
                    group.full,
                    full,
                    group.half_a,
                    half,
                    group.half_b,
                    half
                );

                Ok((
                    MotionState::Opening {
                        target,
                        phase: OpenPhase::Clearance,
                        step: step + 1,
                    },
                    Tick::Stepped,
                ))
            },

            MotionState::Opening { target, .. } => {
                info!(
                    "open {} complete: {:?}",
                    target,
                    self.commanded_angles().into_array()
                );
                Ok((MotionState::Idle, Tick::Finished))
            },

            MotionState::Closing { step, steps } if step < CLOSE_STEPS => {
                for ch in ChannelId::ALL {
                    let current = self.channels[ch].commanded_angle;
                    if current != 0 {
                        self.drive(ch, (current - steps[ch]) as f64)?;
                    }
                }
                debug!(
                    "close {}/{}: {:?}",
                    step + 1,
                    CLOSE_STEPS,
                    self.commanded_angles().into_array()
                );

                Ok((
                    MotionState::Closing {
                        step: step + 1,
                        steps,
                    },
                    Tick::Stepped,
                ))
            },

            MotionState::Closing { .. } => {
                self.reset_channels()?;
                info!("close complete");
                Ok((MotionState::Idle, Tick::Finished))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartbin_config::MemoryCalibrationStore;
    use smartbin_hal::mock::{RecordingPacer, ServoLog, SimIndicator, SimRangeSensor, SimServoBank};

    type SimController = BinController<SimServoBank, SimRangeSensor, SimIndicator>;

    fn controller() -> (SimController, ServoLog) {
        controller_with(SimServoBank::new(), MemoryCalibrationStore::new())
    }

    fn controller_with(
        servos: SimServoBank,
        store: MemoryCalibrationStore,
    ) -> (SimController, ServoLog) {
        let log = servos.log();
        let hw = BinHardware::new(servos, SimRangeSensor::constant(50.0), SimIndicator::new());
        let c = BinController::new(hw, store, ControllerConfig::default())
            .unwrap()
            .with_pacer(RecordingPacer::new());
        (c, log)
    }

    #[test]
    fn test_drive_angle() {
        assert_eq!(drive_angle(0, 55.0), 55.0);
        assert_eq!(drive_angle(40, -25.0), -65.0);
        assert_eq!(drive_angle(-20, 90.0), 110.0);
    }

    #[test]
    fn test_new_homes_to_raw_offsets() {
        let (c, log) = controller();
        let angles: Vec<f64> = log.commands().iter().map(|cmd| cmd.angle).collect();
        assert_eq!(angles, vec![55.0, 90.0, -25.0, 80.0]);
        assert_eq!(c.commanded_angles().into_array(), [0; 4]);
        assert!(c.is_idle());
    }

    #[test]
    fn test_new_uses_stored_offsets() {
        let store = MemoryCalibrationStore::new().with("smartbin_servo_p1", "12.5");
        let (c, log) = controller_with(SimServoBank::new(), store);
        assert_eq!(c.calibration_offset(ChannelId::P1), 12.5);
        assert_eq!(log.last_angle(ChannelId::P1), Some(12.5));
    }

    #[test]
    fn test_new_rejects_garbage_offset() {
        let store = MemoryCalibrationStore::new().with("smartbin_servo_p3", "abc");
        let hw = BinHardware::new(
            SimServoBank::new(),
            SimRangeSensor::constant(50.0),
            SimIndicator::new(),
        );
        let err = BinController::new(hw, store, ControllerConfig::default())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            MotionError::Config(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_new_propagates_homing_failure() {
        let hw = BinHardware::new(
            SimServoBank::new().fail_after(2),
            SimRangeSensor::constant(50.0),
            SimIndicator::new(),
        );
        let err = BinController::new(hw, MemoryCalibrationStore::new(), ControllerConfig::default())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            MotionError::Hal(HalError::Actuator {
                channel: ChannelId::P2,
                ..
            })
        ));
    }

    #[test]
    fn test_set_channel_angle_clamps_and_truncates() {
        let (mut c, log) = controller();
        log.clear();

        c.set_channel_angle(ChannelId::P0, 37.9).unwrap();
        assert_eq!(c.commanded_angle(ChannelId::P0), 37);
        assert_eq!(log.last_angle(ChannelId::P0), Some(-(37.0 - 55.0)));

        c.set_channel_angle(ChannelId::P0, 1000.0).unwrap();
        assert_eq!(c.commanded_angle(ChannelId::P0), 360);

        c.set_channel_angle(ChannelId::P0, -37.9).unwrap();
        assert_eq!(c.commanded_angle(ChannelId::P0), -37);

        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_set_channel_angle_nan_goes_to_zero() {
        let (mut c, _log) = controller();
        c.set_channel_angle(ChannelId::P2, 30.0).unwrap();
        c.set_channel_angle(ChannelId::P2, f64::NAN).unwrap();
        assert_eq!(c.commanded_angle(ChannelId::P2), 0);
    }

    #[test]
    fn test_failed_command_keeps_requested_angle() {
        // 4 条归位命令成功，第 5 条失败
        let (mut c, _log) = controller_with(SimServoBank::new().fail_after(4), Default::default());
        let err = c.set_channel_angle(ChannelId::P1, 20.0).unwrap_err();
        assert!(matches!(err, MotionError::Hal(_)));
        assert_eq!(c.commanded_angle(ChannelId::P1), 20);
    }

    #[test]
    fn test_tick_sequence_counts() {
        let (mut c, _log) = controller();
        c.begin_open(ChannelId::P1).unwrap();

        let mut stepped = 0;
        while c.tick().unwrap() == Tick::Stepped {
            stepped += 1;
        }
        assert_eq!(stepped, 15);
        assert!(c.is_idle());

        c.begin_close().unwrap();
        let mut stepped = 0;
        while c.tick().unwrap() == Tick::Stepped {
            stepped += 1;
        }
        assert_eq!(stepped, 10);
        assert_eq!(c.commanded_angles().into_array(), [0; 4]);
    }

    #[test]
    fn test_idle_tick_is_finished() {
        let (mut c, log) = controller();
        let before = log.len();
        assert_eq!(c.tick().unwrap(), Tick::Finished);
        assert_eq!(log.len(), before);
    }

    #[test]
    fn test_busy_while_armed() {
        let (mut c, _log) = controller();
        c.begin_open(ChannelId::P0).unwrap();

        assert!(matches!(c.begin_open(ChannelId::P1), Err(MotionError::Busy)));
        assert!(matches!(c.begin_close(), Err(MotionError::Busy)));
        assert!(matches!(c.reset(), Err(MotionError::Busy)));
        assert!(matches!(
            c.set_channel_angle(ChannelId::P0, 1.0),
            Err(MotionError::Busy)
        ));
        assert!(matches!(
            c.calibrate_channel(ChannelId::P0, 1.0),
            Err(MotionError::Busy)
        ));

        assert!(c.cancel());
        assert!(!c.cancel());
        assert!(c.begin_close().is_ok());
    }

    #[test]
    fn test_calibrate_rejects_non_finite() {
        let (mut c, log) = controller();
        let before = log.len();
        let err = c.calibrate_channel(ChannelId::P0, f64::INFINITY).unwrap_err();
        assert!(matches!(
            err,
            MotionError::Config(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(c.calibration_offset(ChannelId::P0), 55.0);
        assert_eq!(log.len(), before);
    }

    #[test]
    fn test_calibrate_rehomes_raw_value() {
        let (mut c, log) = controller();
        c.set_channel_angle(ChannelId::P3, 20.0).unwrap();
        c.calibrate_channel(ChannelId::P3, 70.0).unwrap();

        assert_eq!(log.last_angle(ChannelId::P3), Some(70.0));
        assert_eq!(c.calibration_offset(ChannelId::P3), 70.0);
        assert_eq!(c.commanded_angle(ChannelId::P3), 0);
    }
}
