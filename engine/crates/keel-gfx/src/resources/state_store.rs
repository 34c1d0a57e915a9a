use crate::resource_state::ResourceState;

use super::handles::GfxResourceHandle;

/// 状态追踪对资源持有者的全部要求
///
/// 追踪器只通过这个 trait 读写 ground truth，不需要知道资源是怎么分配的。
/// 传入的句柄不存在时实现应当直接 panic（`contains` 除外）。
pub trait ResourceStateStore {
    /// 句柄是否仍然有效
    fn contains(&self, handle: GfxResourceHandle) -> bool;

    fn subresource_count(&self, handle: GfxResourceHandle) -> u32;

    /// buffer 或 simultaneous access 的资源：可以在更多状态间隐式提升，执行完之后衰减为 COMMON
    fn is_buffer_or_simultaneous_access(&self, handle: GfxResourceHandle) -> bool;

    /// 已提交的状态，长度等于 subresource 数量
    fn committed_states(&self, handle: GfxResourceHandle) -> &[ResourceState];

    /// 只在提交时使用
    fn committed_states_mut(&mut self, handle: GfxResourceHandle) -> &mut [ResourceState];
}
