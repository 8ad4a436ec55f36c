//! 通道索引和数组
//!
//! 垃圾桶有 4 个舵机通道（P0-P3），每个通道驱动一个桶盖。
//! 使用枚举提供编译期安全的通道索引，越界索引在类型层面无法表示。
//!
//! # 示例
//!
//! ```rust
//! use smartbin_hal::{ChannelArray, ChannelId};
//!
//! let mut angles = ChannelArray::new([0i32; 4]);
//! angles[ChannelId::P2] = 45;
//!
//! assert_eq!(angles[ChannelId::P2], 45);
//! assert_eq!(ChannelId::from_index(4), None);
//! ```

use std::fmt;
use std::ops::{Index, IndexMut};

/// 通道数量
pub const CHANNEL_COUNT: usize = 4;

/// 舵机通道
///
/// 对应扩展板上的 P0-P3 舵机接口。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelId {
    /// 通道 0
    P0 = 0,
    /// 通道 1
    P1 = 1,
    /// 通道 2
    P2 = 2,
    /// 通道 3
    P3 = 3,
}

impl ChannelId {
    /// 所有通道（按索引顺序）
    pub const ALL: [ChannelId; CHANNEL_COUNT] =
        [ChannelId::P0, ChannelId::P1, ChannelId::P2, ChannelId::P3];

    /// 获取通道索引（0-3）
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 从索引创建通道（范围检查）
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ChannelId::P0),
            1 => Some(ChannelId::P1),
            2 => Some(ChannelId::P2),
            3 => Some(ChannelId::P3),
            _ => None,
        }
    }

    /// 获取通道名称
    pub const fn name(self) -> &'static str {
        match self {
            ChannelId::P0 => "P0",
            ChannelId::P1 => "P1",
            ChannelId::P2 => "P2",
            ChannelId::P3 => "P3",
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 通道索引越界
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid channel index: {0} (expected 0-3)")]
pub struct InvalidChannel(pub usize);

impl TryFrom<usize> for ChannelId {
    type Error = InvalidChannel;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        ChannelId::from_index(index).ok_or(InvalidChannel(index))
    }
}

/// 通道数组
///
/// 4 通道定长容器，只能用 [`ChannelId`] 索引。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelArray<T> {
    data: [T; CHANNEL_COUNT],
}

impl<T: Copy> Copy for ChannelArray<T> {}

impl<T> ChannelArray<T> {
    /// 创建新的通道数组
    pub const fn new(data: [T; CHANNEL_COUNT]) -> Self {
        Self { data }
    }

    /// 迭代所有元素（按 P0-P3 顺序）
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    /// 按通道迭代
    pub fn iter_channels(&self) -> impl Iterator<Item = (ChannelId, &T)> {
        ChannelId::ALL.into_iter().zip(self.data.iter())
    }

    /// 逐元素映射
    pub fn map<U, F>(self, f: F) -> ChannelArray<U>
    where
        F: FnMut(T) -> U,
    {
        ChannelArray {
            data: self.data.map(f),
        }
    }

    /// 借用底层数组
    pub fn as_array(&self) -> &[T; CHANNEL_COUNT] {
        &self.data
    }

    /// 取出底层数组
    pub fn into_array(self) -> [T; CHANNEL_COUNT] {
        self.data
    }
}

impl<T> Index<ChannelId> for ChannelArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, channel: ChannelId) -> &T {
        &self.data[channel.index()]
    }
}

impl<T> IndexMut<ChannelId> for ChannelArray<T> {
    #[inline]
    fn index_mut(&mut self, channel: ChannelId) -> &mut T {
        &mut self.data[channel.index()]
    }
}

impl<T> From<[T; CHANNEL_COUNT]> for ChannelArray<T> {
    fn from(data: [T; CHANNEL_COUNT]) -> Self {
        Self::new(data)
    }
}

impl<T: Default> Default for ChannelArray<T> {
    fn default() -> Self {
        Self {
            data: Default::default(),
        }
    }
}
