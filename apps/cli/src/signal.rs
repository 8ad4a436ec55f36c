//! Ctrl+C 处理
//!
//! 第一次中断设置取消令牌，当前动作在下一步之前停止；
//! 第二次中断直接退出进程（满桶锁存只能这样退出）。

use anyhow::{Context, Result};
use smartbin_motion::CancelToken;
use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 强制退出时的退出码
pub const FORCED_EXIT_CODE: i32 = 130;

/// 注册中断处理器，返回与之关联的取消令牌
pub fn install_interrupt_handler() -> Result<CancelToken> {
    let token = CancelToken::new();
    let handler_token = token.clone();
    let presses = AtomicUsize::new(0);

    ctrlc::set_handler(move || {
        if presses.fetch_add(1, Ordering::SeqCst) == 0 {
            eprintln!("\n🛑 收到中断信号，正在停止当前动作（再按一次强制退出）...");
            handler_token.cancel();
        } else {
            eprintln!("\n强制退出");
            process::exit(FORCED_EXIT_CODE);
        }
    })
    .context("注册 Ctrl+C 处理器失败")?;

    Ok(token)
}
