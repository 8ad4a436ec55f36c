//! 舵机自检
//!
//! 单个通道以 1 度步进扫过 0 → +35 → -35 → 0，每步间隔 10ms。

use crate::category::parse_channel;
use crate::session::SimBin;
use anyhow::{Context, Result};
use clap::Args;
use smartbin_hal::{ChannelId, Pacer, SpinPacer};
use smartbin_motion::CancelToken;
use std::time::Duration;

/// 默认扫动幅度（度）
const SWEEP_EXTENT: i32 = 35;

/// 每步间隔
const SWEEP_STEP_DELAY: Duration = Duration::from_millis(10);

/// 自检命令参数
#[derive(Args, Debug)]
pub struct SweepCommand {
    /// 通道（0-3 或 p0-p3）
    #[arg(value_parser = parse_channel)]
    pub channel: ChannelId,

    /// 扫动幅度（度）
    #[arg(long, default_value_t = SWEEP_EXTENT)]
    pub extent: i32,
}

/// 扫动角度序列：0 → +extent → -extent → 0
pub fn sweep_angles(extent: i32) -> Vec<i32> {
    let extent = extent.abs();
    (0..=extent)
        .chain((-extent..extent).rev())
        .chain(-extent + 1..=0)
        .collect()
}

impl SweepCommand {
    pub fn execute(&self, bin: &mut SimBin, token: &CancelToken) -> Result<()> {
        self.run(bin, token, &mut SpinPacer::new())
    }

    fn run(&self, bin: &mut SimBin, token: &CancelToken, pacer: &mut dyn Pacer) -> Result<()> {
        println!("🔄 {} 自检: 0 → {} → {} → 0", self.channel, self.extent.abs(), -self.extent.abs());

        for angle in sweep_angles(self.extent) {
            if token.is_cancelled() {
                println!("⚠️ 自检被中断，归零...");
                token.reset();
                bin.reset().context("归零失败")?;
                return Ok(());
            }
            bin.set_channel_angle(self.channel, angle as f64)
                .with_context(|| format!("{} 转到 {} 失败", self.channel, angle))?;
            pacer.pause(SWEEP_STEP_DELAY);
        }

        println!("✅ 自检完成");
        Ok(())
    }
}
