//! 宿主事件通道
//!
//! 宿主对外暴露的同步事件订阅通道，`register_events` 将能力的监听器挂到这里

use crate::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// 宿主事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEvent {
    /// 事件类型
    pub event_type: String,
    /// 事件数据
    pub payload: serde_json::Value,
}

impl HostEvent {
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}

/// 事件监听器
pub trait EventListener: Send + Sync {
    /// 监听器名称
    fn name(&self) -> &str;

    /// 关注的事件类型，为空表示接收全部事件
    fn interests(&self) -> Vec<String> {
        Vec::new()
    }

    /// 处理事件
    fn handle(&self, event: &HostEvent) -> Result<()>;
}

/// 宿主事件通道
#[derive(Default)]
pub struct EventChannel {
    listeners: RwLock<Vec<Arc<dyn EventListener>>>,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 订阅事件
    pub fn subscribe(&self, listener: Arc<dyn EventListener>) {
        info!("Registered event listener {}", listener.name());
        self.listeners.write().push(listener);
    }

    /// 发布事件，返回收到该事件的监听器数量
    pub fn publish(&self, event: &HostEvent) -> usize {
        // 先复制监听器列表，处理器内部可以再次订阅
        let listeners: Vec<_> = self.listeners.read().iter().cloned().collect();
        let mut delivered = 0;

        for listener in listeners {
            let interests = listener.interests();
            if !interests.is_empty() && !interests.iter().any(|t| t == &event.event_type) {
                continue;
            }
            delivered += 1;
            if let Err(e) = listener.handle(event) {
                debug!("Event listener {} failed: {:?}", listener.name(), e);
            }
        }

        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
