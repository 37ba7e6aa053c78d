//! 能力注册表配置管理
//!
//! 支持YAML配置文件驱动的注册表设置与日志设置

use crate::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 注册表配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// 注册表设置
    pub registry: RegistrySettings,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 注册表设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// 最大能力数量
    pub max_capabilities: usize,
    /// 是否允许按类别延迟构造能力
    pub lazy_construction: bool,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            max_capabilities: 1000,
            lazy_construction: true,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,
    /// 是否输出目标模块与线程名
    pub verbose: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            verbose: false,
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// 配置管理器
#[derive(Debug)]
pub struct ConfigManager {
    config: RegistryConfig,
}

impl ConfigManager {
    /// 从文件加载配置
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RegistryError::config(&format!("Failed to read config file: {}", e)))?;

        let config: RegistryConfig = serde_yaml::from_str(&content)
            .map_err(|e| RegistryError::config(&format!("Failed to parse config file: {}", e)))?;

        let manager = Self { config };
        manager.validate()?;
        Ok(manager)
    }

    /// 创建默认配置
    pub fn new_default() -> Self {
        Self {
            config: RegistryConfig::default(),
        }
    }

    /// 保存配置到文件
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(&self.config)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// 获取配置
    pub fn get_config(&self) -> &RegistryConfig {
        &self.config
    }

    /// 获取可变配置
    pub fn get_config_mut(&mut self) -> &mut RegistryConfig {
        &mut self.config
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        if self.config.registry.max_capabilities == 0 {
            return Err(RegistryError::config("max_capabilities must be positive"));
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }
}

/// 生成默认配置文件
pub async fn generate_default_config_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let config_manager = ConfigManager::new_default();
    config_manager.save_to_file(path).await?;
    Ok(())
}
