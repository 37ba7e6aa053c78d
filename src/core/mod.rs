//! 核心基础层模块
//!
//! 宿主事件通道等基础设施

pub mod event_channel;

pub use event_channel::*;
