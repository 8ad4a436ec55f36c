//! 标定命令

use crate::category::parse_channel;
use crate::session::SimBin;
use anyhow::{Context, Result};
use clap::Args;
use smartbin_hal::ChannelId;

/// 标定命令参数
#[derive(Args, Debug)]
pub struct CalibrateCommand {
    /// 通道（0-3 或 p0-p3）
    #[arg(value_parser = parse_channel)]
    pub channel: ChannelId,

    /// 标定偏移（度），写入标定文件后舵机立即转到该角度
    #[arg(allow_negative_numbers = true)]
    pub value: f64,
}

impl CalibrateCommand {
    pub fn execute(&self, bin: &mut SimBin) -> Result<()> {
        let previous = bin.calibration_offset(self.channel);
        bin.calibrate_channel(self.channel, self.value)
            .with_context(|| format!("标定 {} 失败", self.channel))?;
        println!(
            "✅ {} 标定: {} → {}",
            self.channel, previous, self.value
        );
        Ok(())
    }
}
