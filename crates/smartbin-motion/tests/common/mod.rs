//! 集成测试公共模块
//!
//! - `helpers` - 快速搭建模拟硬件 + 控制器
//! - `mock_store` - 记录调用顺序的存储与舵机

#![allow(dead_code)]

pub mod helpers;
pub mod mock_store;
