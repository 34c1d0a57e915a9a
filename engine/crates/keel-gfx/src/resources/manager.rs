use anyhow::{Context, bail};
use slotmap::SlotMap;

use crate::resource_state::ResourceState;

use super::handles::GfxResourceHandle;
use super::resource::{GfxResource, GfxTextureDesc};
use super::state_store::ResourceStateStore;

/// 资源管理器
///
/// 持有所有被追踪的 GPU 资源以及它们的 ground truth 状态。
/// 使用 SlotMap 存储资源，对外提供轻量级的 Handle；销毁后的 Handle 不会被误认为有效。
#[derive(Default)]
pub struct GfxResourceManager {
    resources: SlotMap<GfxResourceHandle, GfxResource>,
}

// new & init
impl GfxResourceManager {
    pub fn new() -> Self {
        Self::default()
    }
}

// create & destroy
impl GfxResourceManager {
    pub fn create_buffer(&mut self, name: impl Into<String>, simultaneous_access: bool) -> GfxResourceHandle {
        let buffer = GfxResource::new_buffer(name, simultaneous_access);
        log::debug!("create buffer `{}`", buffer.name());
        self.resources.insert(buffer)
    }

    pub fn create_texture(
        &mut self,
        name: impl Into<String>,
        desc: &GfxTextureDesc,
    ) -> anyhow::Result<GfxResourceHandle> {
        let name = name.into();
        if desc.mip_levels == 0 || desc.array_layers == 0 {
            bail!(
                "texture `{name}` needs at least one mip and one layer, got {}x{}",
                desc.mip_levels,
                desc.array_layers
            );
        }
        if desc.initial_state.is_unknown() {
            bail!("texture `{name}` can not be created in the UNKNOWN state");
        }
        desc.mip_levels
            .checked_mul(desc.array_layers)
            .with_context(|| format!("texture `{name}` has too many subresources"))?;

        let texture = GfxResource::new_texture(name, desc);
        log::debug!(
            "create texture `{}` with {} subresources in {}",
            texture.name(),
            texture.subresource_count(),
            desc.initial_state
        );
        Ok(self.resources.insert(texture))
    }

    /// 销毁资源；仍在录制中的命令列表如果引用了它，提交时会失败
    pub fn destroy(&mut self, handle: GfxResourceHandle) -> Option<GfxResource> {
        let resource = self.resources.remove(handle);
        if let Some(resource) = &resource {
            log::debug!("destroy `{}`", resource.name());
        }
        resource
    }
}

// getter
impl GfxResourceManager {
    #[inline]
    pub fn get(&self, handle: GfxResourceHandle) -> Option<&GfxResource> {
        self.resources.get(handle)
    }

    #[inline]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (GfxResourceHandle, &GfxResource)> {
        self.resources.iter()
    }

    /// 调试输出用的名字，句柄失效时给出占位名
    pub fn debug_name(&self, handle: GfxResourceHandle) -> &str {
        self.resources.get(handle).map(|r| r.name()).unwrap_or("<destroyed>")
    }

    fn resource(&self, handle: GfxResourceHandle) -> &GfxResource {
        self.resources
            .get(handle)
            .unwrap_or_else(|| panic!("resource {handle:?} is not alive in the resource manager"))
    }

    fn resource_mut(&mut self, handle: GfxResourceHandle) -> &mut GfxResource {
        self.resources
            .get_mut(handle)
            .unwrap_or_else(|| panic!("resource {handle:?} is not alive in the resource manager"))
    }
}

impl ResourceStateStore for GfxResourceManager {
    #[inline]
    fn contains(&self, handle: GfxResourceHandle) -> bool {
        self.resources.contains_key(handle)
    }

    #[inline]
    fn subresource_count(&self, handle: GfxResourceHandle) -> u32 {
        self.resource(handle).subresource_count()
    }

    #[inline]
    fn is_buffer_or_simultaneous_access(&self, handle: GfxResourceHandle) -> bool {
        self.resource(handle).is_buffer_or_simultaneous_access()
    }

    #[inline]
    fn committed_states(&self, handle: GfxResourceHandle) -> &[ResourceState] {
        self.resource(handle).states()
    }

    #[inline]
    fn committed_states_mut(&mut self, handle: GfxResourceHandle) -> &mut [ResourceState] {
        self.resource_mut(handle).states_mut()
    }
}
