use indexmap::IndexMap;
use keel_gfx::resource_state::ResourceState;
use keel_gfx::resources::handles::GfxResourceHandle;
use keel_gfx::resources::state_store::ResourceStateStore;

use crate::conversion::{ResourceBarrier, ResourceConversions};
use crate::state_converter::StateConverter;

/// 一次录制（一个命令列表）内的资源状态追踪器
///
/// 每个资源最多对应一个 [`StateConverter`]，第一次 `track` 时创建。
/// 使用 IndexMap 保持插入顺序，生成的 barrier 顺序是确定的。
#[derive(Default, Debug)]
pub struct ResourceStateTracker {
    converters: IndexMap<GfxResourceHandle, StateConverter>,
}

// new & init
impl ResourceStateTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

// getter
impl ResourceStateTracker {
    #[inline]
    pub fn is_tracking(&self, resource: GfxResourceHandle) -> bool {
        self.converters.contains_key(&resource)
    }

    #[inline]
    pub fn tracked_count(&self) -> usize {
        self.converters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    #[inline]
    pub fn tracked_resources(&self) -> impl Iterator<Item = GfxResourceHandle> + '_ {
        self.converters.keys().copied()
    }

    /// 录制到当前位置时资源的预期状态，没有追踪时返回 `None`
    pub fn last_state(&self, resource: GfxResourceHandle, subresource: u32) -> Option<ResourceState> {
        self.converters.get(&resource).map(|converter| converter.last_state(subresource))
    }

    fn converter_mut(&mut self, resource: GfxResourceHandle) -> &mut StateConverter {
        self.converters
            .get_mut(&resource)
            .unwrap_or_else(|| panic!("resource {resource:?} is used before being tracked"))
    }
}

// 录制
impl ResourceStateTracker {
    /// 开始追踪资源，重复调用无副作用
    pub fn track<S: ResourceStateStore + ?Sized>(&mut self, store: &S, resource: GfxResourceHandle) {
        self.converters.entry(resource).or_insert_with(|| {
            StateConverter::new(store.subresource_count(resource), store.is_buffer_or_simultaneous_access(resource))
        });
    }

    /// 整个资源转换到 `dst`，返回需要立刻插入的 barrier
    pub fn convert_resource_state(&mut self, resource: GfxResourceHandle, dst: ResourceState) -> Vec<ResourceBarrier> {
        let barriers: Vec<_> = self
            .converter_mut(resource)
            .convert(dst)
            .into_iter()
            .map(|conversion| ResourceBarrier::from_conversion(resource, conversion))
            .collect();

        for barrier in &barriers {
            log::debug!("immediate barrier {barrier}");
        }
        barriers
    }

    /// 单个 subresource 转换到 `dst`
    pub fn convert_sub_resource_state(
        &mut self,
        resource: GfxResourceHandle,
        subresource: u32,
        dst: ResourceState,
    ) -> Option<ResourceBarrier> {
        let barrier = self
            .converter_mut(resource)
            .convert_sub(subresource, dst)
            .map(|conversion| ResourceBarrier::from_conversion(resource, conversion));

        if let Some(barrier) = &barrier {
            log::debug!("immediate barrier {barrier}");
        }
        barrier
    }
}

// 提交
impl ResourceStateTracker {
    /// 用资源提交时的真实状态解析所有首次请求
    ///
    /// 结果需要放进一个只有 barrier 的命令列表，紧挨着在本列表之前执行。
    /// 隐式提升的首次请求会把资源当前的状态并入追踪的最终状态。
    pub fn build_pre_transitions<S: ResourceStateStore + ?Sized>(&mut self, store: &S) -> Vec<ResourceConversions> {
        self.converters
            .iter_mut()
            .filter_map(|(&resource, converter)| {
                let conversions = converter.pre_convert(store.committed_states(resource));
                if conversions.is_empty() {
                    return None;
                }
                for conversion in &conversions {
                    log::debug!("pre-transition {}", ResourceBarrier::from_conversion(resource, *conversion));
                }
                Some(ResourceConversions { resource, conversions })
            })
            .collect()
    }

    /// 把先执行的 `earlier` 接到本追踪器前面
    ///
    /// 两边都追踪的资源调用 [`StateConverter::merge`]，只有 `earlier` 追踪的资源直接接管。
    /// 返回的 barrier 需要放在两个命令列表之间执行。`earlier` 结束后为空。
    pub fn right_join(&mut self, earlier: &mut ResourceStateTracker) -> Vec<ResourceBarrier> {
        let mut barriers = Vec::new();

        for (resource, donor) in earlier.converters.drain(..) {
            match self.converters.get_mut(&resource) {
                Some(converter) => {
                    barriers.extend(
                        converter
                            .merge(donor)
                            .into_iter()
                            .map(|conversion| ResourceBarrier::from_conversion(resource, conversion)),
                    );
                }
                None => {
                    self.converters.insert(resource, donor);
                }
            }
        }

        for barrier in &barriers {
            log::debug!("bridge barrier {barrier}");
        }
        barriers
    }

    /// 执行顺序确定之后，把最终状态写回资源并清空追踪
    ///
    /// `is_copy_queue` 为真时所有被使用过的资源都衰减为 COMMON。
    pub fn stop_tracking<S: ResourceStateStore + ?Sized>(&mut self, store: &mut S, is_copy_queue: bool) {
        for (resource, mut converter) in self.converters.drain(..) {
            converter.apply_convert(store.committed_states_mut(resource), is_copy_queue);
        }
    }

    /// 丢弃本次录制，不修改任何资源
    pub fn cancel(&mut self) {
        if !self.converters.is_empty() {
            log::debug!("cancel tracking of {} resources", self.converters.len());
        }
        self.converters.clear();
    }
}
