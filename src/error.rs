//! 能力注册表错误处理系统
//!
//! 统一的错误类型，所有错误均为本地、同步、可由调用方恢复

use thiserror::Error;

/// 注册表统一错误类型
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Capability '{capability}' is already registered")]
    AlreadyRegistered { capability: String },

    #[error("Capability '{capability}' is not registered")]
    NotRegistered { capability: String },

    #[error("Host '{host}' for '{capability}' is already registered")]
    DuplicateHost { capability: String, host: String },

    #[error("Capability '{capability}' {reason}")]
    MissingHost { capability: String, reason: String },

    #[error("Host '{host}' must not implement Capability")]
    InvalidHost { host: String },

    #[error("Capability class '{capability}' could not be constructed: {reason}")]
    ConstructionFailure { capability: String, reason: String },

    #[error("Host '{host}' has no event channel to attach listeners of '{capability}'")]
    MissingEventChannel { capability: String, host: String },

    #[error("Capability '{capability}' callback failed: {message}")]
    Callback { capability: String, message: String },

    #[error("Maximum number of capabilities reached ({limit})")]
    CapacityExceeded { limit: usize },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl RegistryError {
    /// 创建未注册错误
    pub fn not_registered(capability: &str) -> Self {
        Self::NotRegistered {
            capability: capability.to_string(),
        }
    }

    /// 创建缺少宿主错误
    pub fn missing_host(capability: &str, reason: &str) -> Self {
        Self::MissingHost {
            capability: capability.to_string(),
            reason: reason.to_string(),
        }
    }

    /// 创建回调失败错误
    pub fn callback(capability: &str, message: impl std::fmt::Display) -> Self {
        Self::Callback {
            capability: capability.to_string(),
            message: message.to_string(),
        }
    }

    /// 创建配置相关错误
    pub fn config(message: &str) -> Self {
        Self::Config {
            message: message.to_string(),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, RegistryError>;
