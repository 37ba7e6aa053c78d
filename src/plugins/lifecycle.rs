//! 能力生命周期管理
//!
//! 每个已注册能力的宿主集合、宿主故障转移选择，以及幂等的 init/disable 状态机

use super::core::{capability_name, same_host, Capability, Host};
use crate::core::EventListener;
use crate::types::{CapabilityId, CapabilityKind};
use crate::{RegistryError, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 能力生命周期状态
#[derive(Clone)]
pub enum LifecycleState {
    /// 未初始化
    Uninitialized,
    /// 已初始化，记录 init 时使用的宿主
    Initialized { host: Arc<dyn Host> },
}

impl std::fmt::Debug for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("Uninitialized"),
            Self::Initialized { host } => f
                .debug_struct("Initialized")
                .field("host", &host.name())
                .finish(),
        }
    }
}

/// 已注册的能力
pub struct RegisteredCapability {
    id: CapabilityId,
    capability: Arc<dyn Capability>,
    /// 候选宿主，按挂载顺序保存
    hosts: Vec<Arc<dyn Host>>,
    state: LifecycleState,
    events_registered: bool,
}

impl RegisteredCapability {
    pub(crate) fn new(id: CapabilityId, capability: Arc<dyn Capability>) -> Self {
        Self {
            id,
            capability,
            hosts: Vec::new(),
            state: LifecycleState::Uninitialized,
            events_registered: false,
        }
    }

    pub fn id(&self) -> CapabilityId {
        self.id
    }

    pub fn capability(&self) -> &Arc<dyn Capability> {
        &self.capability
    }

    pub fn kind(&self) -> CapabilityKind {
        self.capability.kind()
    }

    pub fn name(&self) -> &'static str {
        capability_name(self.capability.as_ref())
    }

    pub fn hosts(&self) -> &[Arc<dyn Host>] {
        &self.hosts
    }

    pub fn has_host(&self, host: &Arc<dyn Host>) -> bool {
        self.hosts.iter().any(|h| same_host(h, host))
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, LifecycleState::Initialized { .. })
    }

    /// init 时使用的宿主，未初始化时为空
    pub fn initializer_host(&self) -> Option<&Arc<dyn Host>> {
        match &self.state {
            LifecycleState::Initialized { host } => Some(host),
            LifecycleState::Uninitialized => None,
        }
    }

    pub fn events_registered(&self) -> bool {
        self.events_registered
    }

    /// 挂载宿主，同一宿主只能挂载一次
    pub(crate) fn register_host(&mut self, host: Arc<dyn Host>) -> Result<()> {
        if self.has_host(&host) {
            return Err(RegistryError::DuplicateHost {
                capability: self.name().to_string(),
                host: host.name().to_string(),
            });
        }
        self.hosts.push(host);
        Ok(())
    }

    /// 选出当前可以服务该能力的宿主
    ///
    /// 启用中的自托管能力优先，其次是第一个启用的外部宿主
    pub fn next_host(&self) -> Result<Arc<dyn Host>> {
        if let Some(host) = Arc::clone(&self.capability).as_host() {
            if host.is_enabled() {
                return Ok(host);
            }
        }

        if self.hosts.is_empty() {
            return Err(RegistryError::missing_host(
                self.name(),
                "is disabled and nobody registered a host for it",
            ));
        }

        self.hosts
            .iter()
            .find(|host| host.is_enabled())
            .cloned()
            .ok_or_else(|| {
                RegistryError::missing_host(
                    self.name(),
                    "is disabled and all registered hosts are disabled too",
                )
            })
    }

    /// 初始化能力（已初始化时为空操作）
    pub(crate) fn init(&mut self) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }

        let host = self.next_host()?;
        self.capability
            .init(&host)
            .map_err(|e| RegistryError::callback(self.name(), e))?;

        info!("Capability '{}' initialized by '{}'", self.name(), host.name());
        self.state = LifecycleState::Initialized { host };
        Ok(())
    }

    /// 停用能力（未初始化时为空操作）
    ///
    /// 使用 init 时记录的宿主，而不是重新选择
    pub(crate) fn disable(&mut self) {
        let host = match std::mem::replace(&mut self.state, LifecycleState::Uninitialized) {
            LifecycleState::Initialized { host } => host,
            LifecycleState::Uninitialized => return,
        };

        if let Err(e) = self.capability.disable(&host) {
            warn!("Capability '{}' failed to disable cleanly: {}", self.name(), e);
        }
        info!("Capability '{}' disabled via '{}'", self.name(), host.name());
    }

    /// 将监听器挂到当前宿主的事件通道上，只注册一次
    pub(crate) fn register_events(&mut self, listener: Arc<dyn EventListener>) -> Result<()> {
        if self.events_registered {
            return Ok(());
        }

        let host = self.next_host()?;
        let channel = host.events().ok_or_else(|| RegistryError::MissingEventChannel {
            capability: self.name().to_string(),
            host: host.name().to_string(),
        })?;
        channel.subscribe(listener);

        debug!("Events of '{}' registered on '{}'", self.name(), host.name());
        self.events_registered = true;
        Ok(())
    }
}

impl std::fmt::Debug for RegisteredCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredCapability")
            .field("id", &self.id)
            .field("capability", &self.name())
            .field("hosts", &self.hosts.iter().map(|h| h.name()).collect::<Vec<_>>())
            .field("state", &self.state)
            .field("events_registered", &self.events_registered)
            .finish()
    }
}
