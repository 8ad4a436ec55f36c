//! # SmartBin CLI
//!
//! SmartBin 垃圾桶盖控制的命令行前端。
//!
//! 舵机/超声波/LED 的真实驱动不在本仓库，命令运行在模拟硬件上，
//! 标定值写入真实的标定文件。
//!
//! ```bash
//! # 按类别开盖，保持 3 秒后关盖并检查是否满桶
//! smartbin-cli open --category compost --hold-ms 3000
//!
//! # 按通道开盖，回车后关盖
//! smartbin-cli open 2
//!
//! # 标定 P1 并立即归位
//! smartbin-cli calibrate 1 88.5
//!
//! # 舵机自检
//! smartbin-cli sweep 0
//! ```
//!
//! 第一次 Ctrl+C 中断当前动作，第二次强制退出（退出码 130）。

use anyhow::Result;
use clap::{Parser, Subcommand};

mod category;
mod commands;
mod session;
mod signal;

use commands::{
    CalibrateCommand, ConfigCommand, FullnessCommand, OpenCommand, SweepCommand,
};
use session::GlobalArgs;

/// SmartBin CLI - 垃圾桶盖控制命令行工具
#[derive(Parser, Debug)]
#[command(name = "smartbin-cli")]
#[command(about = "Command-line front-end for the SmartBin lid controller", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 打开一个盖子，保持后关盖并检查是否满桶
    Open {
        #[command(flatten)]
        args: OpenCommand,
    },

    /// 所有盖子回到关闭位置
    Close,

    /// 所有通道立即归零
    Reset,

    /// 读取一次距离
    Distance,

    /// 满桶检测（满桶时指示灯持续闪烁）
    Fullness {
        #[command(flatten)]
        args: FullnessCommand,
    },

    /// 标定通道并立即归位
    Calibrate {
        #[command(flatten)]
        args: CalibrateCommand,
    },

    /// 舵机自检扫动
    Sweep {
        #[command(flatten)]
        args: SweepCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("smartbin_cli=info".parse()?)
                .add_directive("smartbin_motion=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Config(cmd) = &cli.command {
        return cmd.execute(&cli.global);
    }

    let token = signal::install_interrupt_handler()?;
    let mut bin = cli.global.connect()?;

    match cli.command {
        Commands::Open { args } => args.execute(&mut bin, &token),

        Commands::Close => commands::motion::close(&mut bin, &token),

        Commands::Reset => commands::motion::reset(&mut bin),

        Commands::Distance => commands::sensor::distance(&mut bin),

        Commands::Fullness { args } => args.execute(&mut bin),

        Commands::Calibrate { args } => args.execute(&mut bin),

        Commands::Sweep { args } => args.execute(&mut bin, &token),

        Commands::Config(_) => Ok(()),
    }
}
