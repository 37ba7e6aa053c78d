//! 能力系统核心特征定义
//!
//! 定义宿主（插件）与能力的契约，以及按类别延迟构造能力的工厂

use crate::core::EventChannel;
use crate::plugins::registry::CapabilityRegistry;
use crate::types::CapabilityKind;
use crate::Result;
use std::any::Any;
use std::sync::Arc;

/// 宿主 - 可加载、可启用、可禁用的外部单元
///
/// 注册表只关心宿主是否启用以及它的身份，身份按 `Arc` 指针判定
pub trait Host: Send + Sync {
    /// 宿主名称，用于日志与诊断
    fn name(&self) -> &str;

    /// 宿主当前是否启用
    fn is_enabled(&self) -> bool;

    /// 宿主的事件订阅通道（可选）
    fn events(&self) -> Option<&EventChannel> {
        None
    }

    /// 同时实现了能力契约的宿主返回自身
    ///
    /// 这样的宿主不能以普通宿主身份挂到其他能力上。
    /// 必须与 `Capability::as_host` 成对覆盖，注册时会检查
    fn as_capability(&self) -> Option<&dyn Capability> {
        None
    }
}

/// 能力 - 由某个宿主提供、可被多个宿主共享的服务
pub trait Capability: Send + Sync {
    /// 能力类别，通常为 `CapabilityKind::of::<Self>()`
    fn kind(&self) -> CapabilityKind;

    /// 向下转型支持
    fn as_any(&self) -> &dyn Any;

    /// 注册时调用一次，可以回调注册表声明自己的依赖
    fn load(&self, _registry: &mut CapabilityRegistry) {}

    /// 每个启用周期最多调用一次
    fn init(&self, _host: &Arc<dyn Host>) -> Result<()> {
        Ok(())
    }

    /// 与 `init` 对称，收到的宿主与 `init` 时相同
    fn disable(&self, _host: &Arc<dyn Host>) -> Result<()> {
        Ok(())
    }

    /// 自托管能力返回自身作为宿主
    ///
    /// 必须与 `Host::as_capability` 成对覆盖
    fn as_host(self: Arc<Self>) -> Option<Arc<dyn Host>> {
        None
    }
}

impl std::fmt::Debug for dyn Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("name", &self.name())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// 能力工厂 - 替代反射式的无参构造
pub type CapabilityFactory = Box<dyn Fn() -> anyhow::Result<Arc<dyn Capability>> + Send + Sync>;

/// 以 `Default` 作为无参构造路径的工厂
pub fn default_factory<T>() -> CapabilityFactory
where
    T: Capability + Default + 'static,
{
    Box::new(|| -> anyhow::Result<Arc<dyn Capability>> { Ok(Arc::new(T::default())) })
}

/// 宿主身份比较
pub(crate) fn same_host(a: &Arc<dyn Host>, b: &Arc<dyn Host>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// 能力的可读名称
pub(crate) fn capability_name(capability: &dyn Capability) -> &'static str {
    capability.kind().short_name()
}
