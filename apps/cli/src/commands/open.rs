//! 开盖命令
//!
//! 开盖 → 保持 → 关盖 → 满桶检测，对应一次完整的投放流程。

use crate::category::{WasteCategory, parse_channel};
use crate::commands::sensor;
use crate::session::SimBin;
use anyhow::{Context, Result, bail};
use clap::Args;
use smartbin_hal::{ChannelId, Pacer, SpinPacer};
use smartbin_motion::{CancelToken, MotionError};
use std::io::BufRead;
use std::time::Duration;

/// 保持期间检查中断的间隔
const HOLD_POLL: Duration = Duration::from_millis(50);

/// 开盖命令参数
#[derive(Args, Debug)]
pub struct OpenCommand {
    /// 通道（0-3 或 p0-p3）
    #[arg(value_parser = parse_channel, required_unless_present = "category")]
    pub channel: Option<ChannelId>,

    /// 按垃圾类别选择通道
    #[arg(long, value_enum, conflicts_with = "channel")]
    pub category: Option<WasteCategory>,

    /// 开盖后保持的时间（ms），不指定时等待回车
    #[arg(long)]
    pub hold_ms: Option<u64>,
}

impl OpenCommand {
    /// 要打开的通道
    pub fn target(&self) -> Result<ChannelId> {
        match (self.channel, self.category) {
            (Some(channel), _) => Ok(channel),
            (None, Some(category)) => Ok(category.channel()),
            (None, None) => bail!("需要指定通道或 --category"),
        }
    }

    /// 执行一次投放流程
    pub fn execute(&self, bin: &mut SimBin, token: &CancelToken) -> Result<()> {
        let channel = self.target()?;
        match self.category {
            Some(category) => println!("🗑️  打开 {}（{}）...", channel, category),
            None => println!("🗑️  打开 {}...", channel),
        }

        match bin.open_cancellable(channel, token) {
            Ok(()) => println!("✅ 已打开: {:?}", bin.commanded_angles().into_array()),
            Err(MotionError::Cancelled) => {
                println!("⚠️ 开盖被中断，正在关盖...");
                token.reset();
                bin.close_all().context("关盖失败")?;
                println!("✅ 已关盖");
                return Ok(());
            },
            Err(e) => return Err(e).context("开盖失败"),
        }

        self.hold(token)?;
        token.reset();

        println!("⏳ 关盖...");
        match bin.close_all_cancellable(token) {
            Ok(()) => println!("✅ 已关盖"),
            Err(MotionError::Cancelled) => {
                println!(
                    "⚠️ 关盖被中断，通道停在 {:?}",
                    bin.commanded_angles().into_array()
                );
                return Ok(());
            },
            Err(e) => return Err(e).context("关盖失败"),
        }

        sensor::report_fullness(bin)
    }

    fn hold(&self, token: &CancelToken) -> Result<()> {
        match self.hold_ms {
            Some(ms) => {
                println!("⏱️  保持 {} ms（Ctrl+C 提前关盖）", ms);
                let mut pacer = SpinPacer::new();
                let mut remaining = Duration::from_millis(ms);
                while !remaining.is_zero() && !token.is_cancelled() {
                    let slice = remaining.min(HOLD_POLL);
                    pacer.pause(slice);
                    remaining -= slice;
                }
            },
            None => {
                println!("⏎  投放完成后按回车关盖");
                let mut line = String::new();
                std::io::stdin()
                    .lock()
                    .read_line(&mut line)
                    .context("读取输入失败")?;
            },
        }
        Ok(())
    }
}
