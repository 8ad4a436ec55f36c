//! 垃圾类别与通道解析

use clap::ValueEnum;
use smartbin_hal::ChannelId;
use std::fmt;

/// 垃圾类别
///
/// 每个类别对应一个固定的盖子通道。
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WasteCategory {
    /// 其他垃圾
    Trash,
    /// 可回收物
    Recycle,
    /// 厨余
    Compost,
    /// 电子垃圾
    Electronics,
}

impl WasteCategory {
    /// 类别对应的通道
    pub const fn channel(self) -> ChannelId {
        match self {
            WasteCategory::Trash => ChannelId::P0,
            WasteCategory::Recycle => ChannelId::P1,
            WasteCategory::Compost => ChannelId::P2,
            WasteCategory::Electronics => ChannelId::P3,
        }
    }
}

impl fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WasteCategory::Trash => "trash",
            WasteCategory::Recycle => "recycle",
            WasteCategory::Compost => "compost",
            WasteCategory::Electronics => "electronics",
        };
        f.write_str(name)
    }
}

/// 解析通道参数：`0`-`3` 或 `p0`-`p3`（大小写不敏感）
pub fn parse_channel(s: &str) -> Result<ChannelId, String> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix('p')
        .or_else(|| trimmed.strip_prefix('P'))
        .unwrap_or(trimmed);

    let index: usize = digits
        .parse()
        .map_err(|_| format!("invalid channel '{}', expected 0-3 or p0-p3", s))?;
    ChannelId::try_from(index).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_mapping() {
        assert_eq!(WasteCategory::Trash.channel(), ChannelId::P0);
        assert_eq!(WasteCategory::Recycle.channel(), ChannelId::P1);
        assert_eq!(WasteCategory::Compost.channel(), ChannelId::P2);
        assert_eq!(WasteCategory::Electronics.channel(), ChannelId::P3);
    }

    #[test]
    fn test_category_display_matches_value_names() {
        for category in WasteCategory::value_variants() {
            let parsed = WasteCategory::from_str(&category.to_string(), false).unwrap();
            assert_eq!(parsed, *category);
        }
    }

    #[test]
    fn test_parse_channel() {
        assert_eq!(parse_channel("0"), Ok(ChannelId::P0));
        assert_eq!(parse_channel("3"), Ok(ChannelId::P3));
        assert_eq!(parse_channel("p2"), Ok(ChannelId::P2));
        assert_eq!(parse_channel("P1"), Ok(ChannelId::P1));
        assert_eq!(parse_channel(" 1 "), Ok(ChannelId::P1));
    }

    #[test]
    fn test_parse_channel_rejects_out_of_range() {
        assert!(parse_channel("4").is_err());
        assert!(parse_channel("p9").is_err());
        assert!(parse_channel("-1").is_err());
        assert!(parse_channel("lid").is_err());
        assert!(parse_channel("").is_err());
    }
}
