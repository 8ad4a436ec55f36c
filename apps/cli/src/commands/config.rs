//! 配置管理命令
//!
//! 查看生效的控制器配置与标定值，或导出默认配置作为模板。

use crate::session::GlobalArgs;
use anyhow::{Context, Result, bail};
use clap::Subcommand;
use smartbin_config::{
    ControllerConfig, FileCalibrationStore, calibration_key, read_calibration,
};
use smartbin_hal::ChannelId;
use std::path::{Path, PathBuf};

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 显示生效的配置和标定值
    Show,

    /// 导出默认控制器配置
    Init {
        /// 输出路径
        path: PathBuf,

        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub fn execute(&self, global: &GlobalArgs) -> Result<()> {
        match self {
            ConfigCommand::Show => Self::show_(global),
            ConfigCommand::Init { path, force } => Self::init_(path, *force),
        }
    }

    fn show_(global: &GlobalArgs) -> Result<()> {
        let config = global.load_profile()?;
        let path = global.calibration_path()?;

        match &global.profile {
            Some(p) => println!("# 控制器配置: {}", p.display()),
            None => println!("# 控制器配置: (默认)"),
        }
        print!("{}", config.to_toml_string().context("序列化配置失败")?);
        println!();

        println!("# 标定文件: {}", path.display());
        for line in calibration_lines(&path, &config)? {
            println!("{}", line);
        }
        Ok(())
    }

    fn init_(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!("{} 已存在（使用 --force 覆盖）", path.display());
        }
        ControllerConfig::default()
            .save_to_file(path)
            .with_context(|| format!("写入配置失败: {}", path.display()))?;
        println!("✅ 已写入默认配置: {}", path.display());
        Ok(())
    }
}

/// 每个通道生效的标定值（文件中没有时标注为默认值）
fn calibration_lines(path: &Path, config: &ControllerConfig) -> Result<Vec<String>> {
    let store = FileCalibrationStore::open(path)
        .with_context(|| format!("打开标定文件失败: {}", path.display()))?;
    let profiles = config.channel_profiles()?;

    let mut lines = Vec::new();
    for ch in ChannelId::ALL {
        let default = profiles[ch].default_calibration;
        let value = read_calibration(&store, ch, default)?;
        let source = if store.contains_key(&calibration_key(ch)) { "" } else { "  (默认)" };
        lines.push(format!("{}: {}{}", ch, value, source));
    }
    Ok(lines)
}
