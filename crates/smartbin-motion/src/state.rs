//! 运动状态机
//!
//! 把阻塞的开盖/关盖循环拆成显式状态，每次 `tick()` 推进一个时间片。
//! 阻塞式 API 和 [`MotionService`](crate::MotionService) 都由它驱动。

use smartbin_hal::{ChannelArray, ChannelId};

/// 开盖阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenPhase {
    /// 目标通道主扫动
    Sweep,
    /// 相邻通道让位回缩
    Clearance,
}

/// 控制器运动状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionState {
    /// 空闲
    #[default]
    Idle,

    /// 开盖中
    ///
    /// `step` 是下一步要执行的序号：主扫动 1..=10，让位回缩 0..5。
    Opening {
        target: ChannelId,
        phase: OpenPhase,
        step: i32,
    },

    /// 关盖中
    ///
    /// `steps` 是开始关盖时按当时角度算出的固定步长。
    Closing {
        step: i32,
        steps: ChannelArray<i32>,
    },
}

impl MotionState {
    /// 是否空闲
    pub fn is_idle(&self) -> bool {
        matches!(self, MotionState::Idle)
    }
}

/// 单次 `tick()` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// 执行了一步，下一次 tick 前需要等待步进延时
    Stepped,
    /// 序列在本次 tick 中结束，状态机回到 `Idle`
    Finished,
}
