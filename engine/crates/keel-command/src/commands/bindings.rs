use indexmap::IndexMap;
use keel_gfx::resource_state::ResourceState;
use keel_gfx::resources::handles::GfxResourceHandle;

/// draw / dispatch 时绑定的资源
///
/// 只记录"以什么状态使用哪个资源"，录制命令时据此向追踪器请求状态。
/// 同一个资源被多次绑定时，请求的是这些状态的并集。
///
/// # 使用示例
/// ```ignore
/// let bindings = GfxBindings::default()
///     .render_target(color)
///     .depth_stencil(depth, false)
///     .pixel_shader_resource(shadow_map)
///     .constant_buffer(per_frame);
/// ctx.draw(&manager, &bindings, 3, 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct GfxBindings {
    bindings: Vec<(GfxResourceHandle, ResourceState)>,
}

// builder
impl GfxBindings {
    #[inline]
    fn bind(mut self, resource: GfxResourceHandle, state: ResourceState) -> Self {
        self.bindings.push((resource, state));
        self
    }

    pub fn render_target(self, resource: GfxResourceHandle) -> Self {
        self.bind(resource, ResourceState::RENDER_TARGET)
    }

    /// `read_only` 为真时只读深度，可以同时作为 shader resource 采样
    pub fn depth_stencil(self, resource: GfxResourceHandle, read_only: bool) -> Self {
        let state = if read_only { ResourceState::DEPTH_READ } else { ResourceState::DEPTH_WRITE };
        self.bind(resource, state)
    }

    pub fn pixel_shader_resource(self, resource: GfxResourceHandle) -> Self {
        self.bind(resource, ResourceState::PIXEL_SHADER_RESOURCE)
    }

    pub fn non_pixel_shader_resource(self, resource: GfxResourceHandle) -> Self {
        self.bind(resource, ResourceState::NON_PIXEL_SHADER_RESOURCE)
    }

    pub fn vertex_buffer(self, resource: GfxResourceHandle) -> Self {
        self.bind(resource, ResourceState::VERTEX_AND_CONSTANT_BUFFER)
    }

    pub fn index_buffer(self, resource: GfxResourceHandle) -> Self {
        self.bind(resource, ResourceState::INDEX_BUFFER)
    }

    pub fn constant_buffer(self, resource: GfxResourceHandle) -> Self {
        self.bind(resource, ResourceState::VERTEX_AND_CONSTANT_BUFFER)
    }

    pub fn indirect_argument(self, resource: GfxResourceHandle) -> Self {
        self.bind(resource, ResourceState::INDIRECT_ARGUMENT)
    }

    pub fn stream_out(self, resource: GfxResourceHandle) -> Self {
        self.bind(resource, ResourceState::STREAM_OUT)
    }

    pub fn unordered_access(self, resource: GfxResourceHandle) -> Self {
        self.bind(resource, ResourceState::UNORDERED_ACCESS)
    }
}

// getter
impl GfxBindings {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// 每个资源需要的状态，按第一次绑定的顺序
    pub fn required_states(&self) -> IndexMap<GfxResourceHandle, ResourceState> {
        let mut states: IndexMap<GfxResourceHandle, ResourceState> = IndexMap::new();
        for &(resource, state) in &self.bindings {
            *states.entry(resource).or_insert(ResourceState::empty()) |= state;
        }
        states
    }

    /// 同一个资源的组合请求只能全部是只读状态，混入写状态的返回第一个冲突的资源
    pub fn find_conflict(&self) -> Option<(GfxResourceHandle, ResourceState)> {
        self.required_states()
            .into_iter()
            .find(|(_, state)| state.bits().count_ones() > 1 && !state.is_read_only())
    }

    /// dispatch 只能使用 compute 管线可见的状态
    pub fn is_compute_compatible(&self) -> bool {
        let compute_states = ResourceState::UNORDERED_ACCESS
            | ResourceState::NON_PIXEL_SHADER_RESOURCE
            | ResourceState::VERTEX_AND_CONSTANT_BUFFER
            | ResourceState::INDIRECT_ARGUMENT;
        self.bindings.iter().all(|(_, state)| compute_states.contains(*state))
    }
}

#[cfg(test)]
mod tests {
    use keel_gfx::resources::manager::GfxResourceManager;
    use keel_gfx::resources::resource::GfxTextureDesc;

    use super::*;

    #[test]
    fn test_required_states_are_merged() {
        let mut manager = GfxResourceManager::new();
        let gbuffer = manager.create_texture("gbuffer", &GfxTextureDesc::default()).unwrap();
        let depth = manager.create_texture("depth", &GfxTextureDesc::default()).unwrap();

        let bindings = GfxBindings::default()
            .depth_stencil(depth, true)
            .pixel_shader_resource(gbuffer)
            .non_pixel_shader_resource(gbuffer);
        let states = bindings.required_states();

        assert_eq!(states.len(), 2);
        assert_eq!(states.get_index(0), Some((&depth, &ResourceState::DEPTH_READ)));
        assert_eq!(
            states[&gbuffer],
            ResourceState::PIXEL_SHADER_RESOURCE | ResourceState::NON_PIXEL_SHADER_RESOURCE
        );
    }

    #[test]
    fn test_compute_compatible() {
        let mut manager = GfxResourceManager::new();
        let particles = manager.create_buffer("particles", false);
        let target = manager.create_texture("target", &GfxTextureDesc::default()).unwrap();

        let compute = GfxBindings::default().unordered_access(particles).constant_buffer(particles);
        assert!(compute.is_compute_compatible());
        assert!(!compute.clone().render_target(target).is_compute_compatible());
        assert!(GfxBindings::default().is_empty());
    }

    #[test]
    fn test_write_state_can_not_be_combined() {
        let mut manager = GfxResourceManager::new();
        let history = manager.create_texture("history", &GfxTextureDesc::default()).unwrap();
        let depth = manager.create_texture("depth", &GfxTextureDesc::default()).unwrap();

        let reads = GfxBindings::default()
            .pixel_shader_resource(history)
            .non_pixel_shader_resource(history)
            .depth_stencil(depth, true)
            .pixel_shader_resource(depth);
        assert_eq!(reads.find_conflict(), None);

        let feedback = GfxBindings::default().render_target(history).pixel_shader_resource(history);
        assert_eq!(
            feedback.find_conflict(),
            Some((history, ResourceState::RENDER_TARGET | ResourceState::PIXEL_SHADER_RESOURCE))
        );
    }
}
