//! 测距与满桶检测命令

use crate::session::SimBin;
use anyhow::{Context, Result};
use clap::Args;

/// 读取一次距离
pub fn distance(bin: &mut SimBin) -> Result<()> {
    let d = bin.get_distance().context("测距失败")?;
    println!("📏 距离: {:.1} cm", d);
    Ok(())
}

/// 满桶检测参数
#[derive(Args, Debug)]
pub struct FullnessCommand {
    /// 只报告平均距离和结果，不进入指示灯锁存
    #[arg(long)]
    pub no_latch: bool,
}

impl FullnessCommand {
    pub fn execute(&self, bin: &mut SimBin) -> Result<()> {
        if self.no_latch {
            let average = bin.average_distance().context("测距失败")?;
            let full = average < bin.config().full_threshold;
            println!(
                "📏 平均距离: {:.1} cm（阈值 {:.1}）: {}",
                average,
                bin.config().full_threshold,
                if full { "已满" } else { "未满" }
            );
            return Ok(());
        }
        report_fullness(bin)
    }
}

/// 满桶检测；满桶时进入锁存，只能按两次 Ctrl+C 退出
pub fn report_fullness(bin: &mut SimBin) -> Result<()> {
    println!("🔍 满桶检测...（满桶时指示灯闪烁，按两次 Ctrl+C 退出）");
    bin.check_fullness().context("满桶检测失败")?;
    println!("✅ 未满");
    Ok(())
}
