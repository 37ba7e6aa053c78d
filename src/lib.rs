//! 能力注册表 - 跨插件共享服务的发现与生命周期管理
//!
//! 独立加载的宿主（插件）发布并消费共享能力，彼此之间没有静态依赖
//!
//! # 架构分层
//!
//! - **插件层**: 宿主与能力契约、能力生命周期、注册表
//! - **核心基础层**: 宿主事件通道
//! - **配置与错误**: YAML配置、统一错误类型
//!
//! # 特性
//!
//! - **顺序无关**: 需求可以先于能力注册声明
//! - **宿主故障转移**: 总是解析到一个启用中的宿主
//! - **幂等生命周期**: 每个启用周期最多初始化一次

pub mod types;
pub mod error;
pub mod core;
pub mod plugins;
pub mod config;

// 重新导出核心类型
pub use types::*;
pub use error::*;
pub use crate::core::*;
pub use plugins::*;
pub use config::{ConfigManager, LoggingConfig, RegistryConfig, RegistrySettings};

/// 框架信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const FRAMEWORK_NAME: &str = "CapabilityRegistry";

/// 初始化日志系统，重复调用为空操作
pub fn initialize(logging: &LoggingConfig) -> Result<()> {
    let installed = tracing_subscriber::fmt()
        .with_max_level(logging.level.as_tracing_level())
        .with_target(logging.verbose)
        .with_thread_names(logging.verbose)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Initializing {} v{}", FRAMEWORK_NAME, VERSION);
    }
    Ok(())
}

/// 按配置创建注册表并初始化日志
pub fn build_registry(config: &RegistryConfig) -> Result<CapabilityRegistry> {
    initialize(&config.logging)?;
    Ok(CapabilityRegistry::with_settings(config.registry.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_info() {
        assert_eq!(FRAMEWORK_NAME, "CapabilityRegistry");
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_initialize_twice() {
        let logging = LoggingConfig::default();
        assert!(initialize(&logging).is_ok());
        assert!(initialize(&logging).is_ok());
    }

    #[test]
    fn test_build_registry_uses_settings() {
        let mut config = RegistryConfig::default();
        config.registry.max_capabilities = 3;

        let registry = build_registry(&config).unwrap();
        assert_eq!(registry.settings().max_capabilities, 3);
        assert!(registry.is_empty());
    }
}
