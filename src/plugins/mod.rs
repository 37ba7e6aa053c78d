//! 能力插件层模块
//!
//! 宿主与能力契约、能力生命周期、能力注册表

pub mod core;
pub mod lifecycle;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

// 重新导出核心组件
pub use self::core::*;
pub use lifecycle::*;
pub use registry::*;
