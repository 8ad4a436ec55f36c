//! 配置层错误类型定义

use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 读写配置文件失败
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML 解析失败
    #[error("Failed to parse profile: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML 序列化失败
    #[error("Failed to serialize profile: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// 存储中的值无法解析
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    /// 配置内容不合法
    #[error("Invalid profile: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            key: "smartbin_servo_p1".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for smartbin_servo_p1: \"abc\""
        );

        let err = ConfigError::Invalid("expected 4 channels, found 3".to_string());
        assert!(err.to_string().contains("expected 4 channels"));
    }
}
