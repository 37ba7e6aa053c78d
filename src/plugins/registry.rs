//! 能力注册表
//!
//! 跨插件的能力目录：注册、延迟需求解析、宿主挂载、按类别初始化与停用

use super::core::{capability_name, default_factory, same_host, Capability, CapabilityFactory, Host};
use super::lifecycle::RegisteredCapability;
use crate::config::RegistrySettings;
use crate::core::EventListener;
use crate::types::{CapabilityId, CapabilityKind};
use crate::{RegistryError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 声明需求的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// 能力已注册，宿主已挂载
    Satisfied(CapabilityId),
    /// 能力尚未注册，需求已记入延迟表
    Deferred,
}

/// 能力注册表
///
/// 单线程使用，无内部锁；`Capability::load` 通过 `&mut` 参数重入注册表
pub struct CapabilityRegistry {
    /// 已注册能力，按注册顺序排列
    entries: BTreeMap<CapabilityId, RegisteredCapability>,
    /// 延迟需求：类别 -> 等待中的宿主，`None` 为来自 load 的占位
    pending: HashMap<CapabilityKind, Vec<Option<Arc<dyn Host>>>>,
    /// 按类别延迟构造能力的工厂
    factories: HashMap<CapabilityKind, CapabilityFactory>,
    settings: RegistrySettings,
    next_id: u64,
}

impl CapabilityRegistry {
    /// 创建使用默认设置的注册表
    pub fn new() -> Self {
        Self::with_settings(RegistrySettings::default())
    }

    pub fn with_settings(settings: RegistrySettings) -> Self {
        Self {
            entries: BTreeMap::new(),
            pending: HashMap::new(),
            factories: HashMap::new(),
            settings,
            next_id: 1,
        }
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// 注册能力
    ///
    /// 同一实例只能注册一次。注册后立即把该类别的延迟需求并入宿主集合，
    /// 然后调用 `load`，`load` 可以回调注册表
    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Result<CapabilityId> {
        let name = capability_name(capability.as_ref());

        if self.entries.values().any(|e| same_capability(e.capability(), &capability)) {
            return Err(RegistryError::AlreadyRegistered {
                capability: name.to_string(),
            });
        }

        if self.entries.len() >= self.settings.max_capabilities {
            return Err(RegistryError::CapacityExceeded {
                limit: self.settings.max_capabilities,
            });
        }

        let id = CapabilityId::new(self.next_id);
        self.next_id += 1;

        debug_assert!(
            Arc::clone(&capability)
                .as_host()
                .map_or(true, |host| host.as_capability().is_some()),
            "capability '{}' overrides as_host without as_capability",
            name
        );

        let kind = capability.kind();
        self.entries.insert(id, RegisteredCapability::new(id, capability.clone()));
        self.flush_pending(id, kind);

        capability.load(self);

        info!("'{}' registered as new capability {}", name, id);
        Ok(id)
    }

    /// 注册能力并挂载它的宿主
    pub fn register_with_host(
        &mut self,
        capability: Arc<dyn Capability>,
        host: Arc<dyn Host>,
    ) -> Result<CapabilityId> {
        validate_host(&host)?;
        let id = self.register(capability)?;

        // 宿主可能已经通过延迟需求并入
        let already_attached = self.entries.get(&id).map_or(false, |e| e.has_host(&host));
        if !already_attached {
            self.register_host(id, host)?;
        }
        Ok(id)
    }

    /// 为已注册能力挂载宿主
    pub fn register_host(&mut self, id: CapabilityId, host: Arc<dyn Host>) -> Result<()> {
        validate_host(&host)?;
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or_else(|| RegistryError::not_registered(&id.to_string()))?;

        let host_name = host.name().to_string();
        entry.register_host(host)?;

        debug!("'{}' registered as host for '{}'", host_name, entry.name());
        Ok(())
    }

    /// 按类别挂载宿主，不回退到延迟表
    pub fn register_host_for_kind(&mut self, kind: CapabilityKind, host: Arc<dyn Host>) -> Result<CapabilityId> {
        validate_host(&host)?;
        let id = self
            .find(kind)
            .ok_or_else(|| RegistryError::not_registered(kind.short_name()))?;
        self.register_host(id, host)?;
        Ok(id)
    }

    /// 声明对某类能力的需求
    ///
    /// 能力已注册时直接挂载宿主；否则记入延迟表，待该类别注册时并入。
    /// 在 `load` 中调用时宿主可以为 `None`
    pub fn require(&mut self, kind: CapabilityKind, host: Option<Arc<dyn Host>>) -> Result<Requirement> {
        if let Some(host) = &host {
            validate_host(host)?;
        }

        match (self.find(kind), host) {
            (Some(id), Some(host)) => match self.register_host(id, host) {
                Ok(()) | Err(RegistryError::DuplicateHost { .. }) => Ok(Requirement::Satisfied(id)),
                Err(e) => Err(e),
            },
            (Some(id), None) => Ok(Requirement::Satisfied(id)),
            (None, host) => {
                let waiting = self.pending.entry(kind).or_default();
                if !waiting.iter().any(|w| same_slot(w, &host)) {
                    debug!(
                        "'{}' deferred requirement on '{}'",
                        host.as_ref().map_or("<load>", |h| h.name()),
                        kind.short_name()
                    );
                    waiting.push(host);
                }
                Ok(Requirement::Deferred)
            }
        }
    }

    /// 为能力类别登记工厂，用于延迟构造
    pub fn register_factory(&mut self, kind: CapabilityKind, factory: CapabilityFactory) {
        self.factories.insert(kind, factory);
    }

    /// 以 `Default` 作为类别 `T` 的工厂
    pub fn register_default_factory<T>(&mut self)
    where
        T: Capability + Default + 'static,
    {
        self.register_factory(CapabilityKind::of::<T>(), default_factory::<T>());
    }

    /// 初始化已注册能力
    pub fn init_capability(&mut self, id: CapabilityId) -> Result<()> {
        self.entries
            .get_mut(&id)
            .ok_or_else(|| RegistryError::not_registered(&id.to_string()))?
            .init()
    }

    /// 按类别初始化能力，在宿主启用阶段调用
    ///
    /// 尚无实例但存在延迟需求时，通过工厂构造新实例并注册
    pub fn init_kind(&mut self, kind: CapabilityKind) -> Result<CapabilityId> {
        if let Some(id) = self.find(kind) {
            self.init_capability(id)?;
            return Ok(id);
        }

        if !self.pending.contains_key(&kind) || !self.settings.lazy_construction {
            return Err(RegistryError::not_registered(kind.short_name()));
        }

        info!(
            "Capability class '{}' is not yet initialized. Creating new instance.",
            kind.short_name()
        );

        let id = match self.construct(kind).and_then(|capability| self.register(capability)) {
            Ok(id) => id,
            Err(e) => {
                warn!("Capability class '{}' could not be created: {}", kind.short_name(), e);
                self.pending.remove(&kind);
                return Err(e);
            }
        };

        self.init_capability(id)?;
        Ok(id)
    }

    /// 停用并移除能力，未注册时为空操作
    pub fn disable_capability(&mut self, id: CapabilityId) {
        if let Some(mut entry) = self.entries.remove(&id) {
            entry.disable();
            info!("Capability '{}' removed from registry", entry.name());
        }
    }

    /// 按类别停用并移除能力
    pub fn disable_kind(&mut self, kind: CapabilityKind) {
        if let Some(id) = self.find(kind) {
            self.disable_capability(id);
        }
    }

    /// 为能力注册事件监听器，只注册一次
    pub fn register_events(&mut self, id: CapabilityId, listener: Arc<dyn EventListener>) -> Result<()> {
        self.entries
            .get_mut(&id)
            .ok_or_else(|| RegistryError::not_registered(&id.to_string()))?
            .register_events(listener)
    }

    /// 获取当前可以服务该能力的宿主
    pub fn host_for(&self, id: CapabilityId) -> Result<Arc<dyn Host>> {
        self.entries
            .get(&id)
            .ok_or_else(|| RegistryError::not_registered(&id.to_string()))?
            .next_host()
    }

    /// 按类别查找最早注册的实例
    pub fn find(&self, kind: CapabilityKind) -> Option<CapabilityId> {
        self.entries
            .values()
            .find(|entry| entry.kind() == kind)
            .map(|entry| entry.id())
    }

    pub fn get(&self, id: CapabilityId) -> Option<&RegisteredCapability> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: CapabilityId) -> bool {
        self.entries.contains_key(&id)
    }

    /// 获取具体类型的能力
    pub fn downcast<T: Capability + 'static>(&self, id: CapabilityId) -> Option<&T> {
        self.entries.get(&id)?.capability().as_any().downcast_ref::<T>()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = CapabilityId> + '_ {
        self.entries.keys().copied()
    }

    /// 某类别的延迟需求
    pub fn pending_hosts(&self, kind: CapabilityKind) -> Option<&[Option<Arc<dyn Host>>]> {
        self.pending.get(&kind).map(Vec::as_slice)
    }

    pub fn is_pending(&self, kind: CapabilityKind) -> bool {
        self.pending.contains_key(&kind)
    }

    /// 注册表诊断快照
    pub fn snapshot(&self) -> RegistrySnapshot {
        let capabilities: Vec<_> = self
            .entries
            .values()
            .map(|entry| CapabilitySnapshot {
                id: entry.id(),
                class: entry.kind().name().to_string(),
                hosts: entry.hosts().iter().map(|h| h.name().to_string()).collect(),
                initialized: entry.is_initialized(),
                initializer_host: entry.initializer_host().map(|h| h.name().to_string()),
                events_registered: entry.events_registered(),
            })
            .collect();

        let pending: BTreeMap<_, _> = self
            .pending
            .iter()
            .map(|(kind, hosts)| {
                let names: Vec<Option<String>> = hosts
                    .iter()
                    .map(|h| h.as_ref().map(|h| h.name().to_string()))
                    .collect();
                (kind.name().to_string(), names)
            })
            .collect();

        RegistrySnapshot { capabilities, pending }
    }

    fn construct(&self, kind: CapabilityKind) -> Result<Arc<dyn Capability>> {
        let factory = self
            .factories
            .get(&kind)
            .ok_or_else(|| RegistryError::ConstructionFailure {
                capability: kind.short_name().to_string(),
                reason: "missing valid constructor".to_string(),
            })?;

        let capability = factory().map_err(|e| RegistryError::ConstructionFailure {
            capability: kind.short_name().to_string(),
            reason: format!("{:#}", e),
        })?;

        if capability.kind() != kind {
            return Err(RegistryError::ConstructionFailure {
                capability: kind.short_name().to_string(),
                reason: format!("factory produced '{}'", capability.kind().short_name()),
            });
        }
        Ok(capability)
    }

    /// 把类别的延迟需求并入新注册的实例
    fn flush_pending(&mut self, id: CapabilityId, kind: CapabilityKind) {
        let Some(waiting) = self.pending.remove(&kind) else {
            return;
        };
        let Some(entry) = self.entries.get_mut(&id) else {
            return;
        };

        for host in waiting.into_iter().flatten() {
            if entry.has_host(&host) {
                continue;
            }
            debug!("'{}' registered as host for '{}' (deferred)", host.name(), entry.name());
            if let Err(e) = entry.register_host(host) {
                warn!("Deferred host could not be attached: {}", e);
            }
        }
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("entries", &self.entries)
            .field("pending", &self.pending.keys().map(|k| k.short_name()).collect::<Vec<_>>())
            .field("factories", &self.factories.len())
            .field("settings", &self.settings)
            .finish()
    }
}

/// 注册表快照
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot {
    pub capabilities: Vec<CapabilitySnapshot>,
    /// 类别 -> 等待中的宿主名称，`None` 为 load 占位
    pub pending: BTreeMap<String, Vec<Option<String>>>,
}

/// 单个能力的快照
#[derive(Debug, Clone, Serialize)]
pub struct CapabilitySnapshot {
    pub id: CapabilityId,
    pub class: String,
    pub hosts: Vec<String>,
    pub initialized: bool,
    pub initializer_host: Option<String>,
    pub events_registered: bool,
}

/// 宿主不能同时实现能力契约
fn validate_host(host: &Arc<dyn Host>) -> Result<()> {
    if host.as_capability().is_some() {
        return Err(RegistryError::InvalidHost {
            host: host.name().to_string(),
        });
    }
    Ok(())
}

fn same_capability(a: &Arc<dyn Capability>, b: &Arc<dyn Capability>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

fn same_slot(a: &Option<Arc<dyn Host>>, b: &Option<Arc<dyn Host>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => same_host(a, b),
        (None, None) => true,
        _ => false,
    }
}
