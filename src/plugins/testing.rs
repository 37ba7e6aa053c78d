//! 测试替身：可切换启用状态的宿主、记录回调的能力、自托管能力

use super::core::{Capability, Host};
use super::registry::CapabilityRegistry;
use crate::core::EventChannel;
use crate::types::CapabilityKind;
use crate::{RegistryError, Result};
use parking_lot::Mutex;
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub struct TestHost {
    name: String,
    enabled: AtomicBool,
    events: Option<EventChannel>,
}

impl TestHost {
    pub fn enabled(name: &str) -> Arc<Self> {
        Arc::new(Self::build(name, true, None))
    }

    pub fn disabled(name: &str) -> Arc<Self> {
        Arc::new(Self::build(name, false, None))
    }

    pub fn with_events(name: &str) -> Arc<Self> {
        Arc::new(Self::build(name, true, Some(EventChannel::new())))
    }

    fn build(name: &str, enabled: bool, events: Option<EventChannel>) -> Self {
        Self {
            name: name.to_string(),
            enabled: AtomicBool::new(enabled),
            events,
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}

impl Host for TestHost {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn events(&self) -> Option<&EventChannel> {
        self.events.as_ref()
    }
}

/// 记录 load/init/disable 调用的能力
#[derive(Default)]
pub struct CountingCapability {
    pub loads: AtomicUsize,
    pub inits: Mutex<Vec<Arc<dyn Host>>>,
    pub disables: Mutex<Vec<Arc<dyn Host>>>,
}

impl CountingCapability {
    pub fn init_count(&self) -> usize {
        self.inits.lock().len()
    }

    pub fn disable_count(&self) -> usize {
        self.disables.lock().len()
    }
}

impl Capability for CountingCapability {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::of::<Self>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn load(&self, _registry: &mut CapabilityRegistry) {
        self.loads.fetch_add(1, Ordering::SeqCst);
    }

    fn init(&self, host: &Arc<dyn Host>) -> Result<()> {
        self.inits.lock().push(host.clone());
        Ok(())
    }

    fn disable(&self, host: &Arc<dyn Host>) -> Result<()> {
        self.disables.lock().push(host.clone());
        Ok(())
    }
}

/// 第二个独立类别，用于按类别查找
#[derive(Default)]
pub struct UtilityCapability {
    pub inits: AtomicUsize,
}

impl Capability for UtilityCapability {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::of::<Self>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn init(&self, _host: &Arc<dyn Host>) -> Result<()> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 在 load 中声明对 `UtilityCapability` 的依赖
#[derive(Default)]
pub struct DependentCapability;

impl Capability for DependentCapability {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::of::<Self>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn load(&self, registry: &mut CapabilityRegistry) {
        registry
            .require(CapabilityKind::of::<UtilityCapability>(), None)
            .expect("placeholder requirement never fails");
    }
}

/// init 失败指定次数后才成功
#[derive(Default)]
pub struct FlakyCapability {
    pub failures_left: AtomicUsize,
    pub inits: AtomicUsize,
}

impl Capability for FlakyCapability {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::of::<Self>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn init(&self, _host: &Arc<dyn Host>) -> Result<()> {
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(RegistryError::config("database unreachable"));
        }
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// disable 回调总是失败
#[derive(Default)]
pub struct FailingDisableCapability {
    pub disables: AtomicUsize,
}

impl Capability for FailingDisableCapability {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::of::<Self>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn disable(&self, _host: &Arc<dyn Host>) -> Result<()> {
        self.disables.fetch_add(1, Ordering::SeqCst);
        Err(RegistryError::config("flush on shutdown failed"))
    }
}

/// 既是能力又是宿主
pub struct SelfHostingCapability {
    pub name: String,
    pub enabled: AtomicBool,
    pub inits: Mutex<Vec<Arc<dyn Host>>>,
}

impl SelfHostingCapability {
    pub fn new(name: &str, enabled: bool) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            enabled: AtomicBool::new(enabled),
            inits: Mutex::new(Vec::new()),
        })
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}

impl Host for SelfHostingCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn as_capability(&self) -> Option<&dyn Capability> {
        Some(self)
    }
}

impl Capability for SelfHostingCapability {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::of::<Self>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn init(&self, host: &Arc<dyn Host>) -> Result<()> {
        self.inits.lock().push(host.clone());
        Ok(())
    }

    fn as_host(self: Arc<Self>) -> Option<Arc<dyn Host>> {
        Some(self)
    }
}
