//! 开盖/关盖编排参数
//!
//! 开盖分两段：
//!
//! 1. **主扫动**：目标通道从 0 分 10 步转到 `open_angle`，步长 `open_angle / 10`（整数除法）。
//!    最后一步停在 `10 * (open_angle / 10)`，最多比 `open_angle` 少 9 度，不做补偿。
//! 2. **让位回缩**：另外三个通道向负方向回缩，`deg` 取 0, -10, -20, -30, -40。
//!    全回缩通道转到 `deg`，两个半回缩通道转到 `deg / 2`。
//!
//! 关盖时每个通道的步长在开始时固定为 `angle / 10`（向零取整），走 10 步后强制归零。

use smartbin_hal::ChannelId;

/// 主扫动步数
pub const SWEEP_STEPS: i32 = 10;

/// 让位回缩步数（含 0 度这一步）
pub const CLEARANCE_STEPS: i32 = 5;

/// 让位回缩每步角度
pub const CLEARANCE_STEP_DEG: i32 = -10;

/// 关盖斜坡步数
pub const CLOSE_STEPS: i32 = 10;

/// 让位通道组
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clearance {
    /// 全幅回缩
    pub full: ChannelId,
    /// 半幅回缩 A
    pub half_a: ChannelId,
    /// 半幅回缩 B
    pub half_b: ChannelId,
}

/// 打开 `target` 时需要让位的通道
pub const fn clearance_for(target: ChannelId) -> Clearance {
    use ChannelId::*;
    match target {
        P0 => Clearance {
            full: P2,
            half_a: P3,
            half_b: P1,
        },
        P1 => Clearance {
            full: P3,
            half_a: P0,
            half_b: P2,
        },
        P2 => Clearance {
            full: P0,
            half_a: P1,
            half_b: P3,
        },
        P3 => Clearance {
            full: P1,
            half_a: P0,
            half_b: P2,
        },
    }
}

/// 主扫动第 `step` 步（1..=10）的角度
#[inline]
pub fn sweep_angle(open_angle: i32, step: i32) -> i32 {
    (open_angle / SWEEP_STEPS) * step
}

/// 让位回缩第 `step` 步（0..5）的（全幅, 半幅）角度
#[inline]
pub fn clearance_angles(step: i32) -> (i32, i32) {
    let deg = CLEARANCE_STEP_DEG * step;
    (deg, deg / 2)
}

/// 关盖斜坡的固定步长
#[inline]
pub fn close_step(angle: i32) -> i32 {
    angle / CLOSE_STEPS
}
