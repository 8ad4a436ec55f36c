//! 关盖与归零命令

use crate::session::SimBin;
use anyhow::{Context, Result};
use smartbin_motion::{CancelToken, MotionError};

/// 所有盖子回到关闭位置
pub fn close(bin: &mut SimBin, token: &CancelToken) -> Result<()> {
    println!("⏳ 关盖...");
    match bin.close_all_cancellable(token) {
        Ok(()) => {
            println!("✅ 已关盖");
            Ok(())
        },
        Err(MotionError::Cancelled) => {
            println!(
                "⚠️ 关盖被中断，通道停在 {:?}",
                bin.commanded_angles().into_array()
            );
            Ok(())
        },
        Err(e) => Err(e).context("关盖失败"),
    }
}

/// 所有通道立即归零
pub fn reset(bin: &mut SimBin) -> Result<()> {
    bin.reset().context("归零失败")?;
    println!("✅ 已归零");
    Ok(())
}
