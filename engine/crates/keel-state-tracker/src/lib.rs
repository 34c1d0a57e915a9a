//! 资源状态追踪
//!
//! 每个命令列表在录制时拥有一个 [`ResourceStateTracker`]。录制命令前先向追踪器请求目标状态，
//! 追踪器会返回需要立即插入的 barrier；资源在本列表中第一次被使用时的目标状态则先记下来，
//! 等到提交、真实的前置状态确定之后再由 [`ResourceStateTracker::build_pre_transitions`] 补齐。
//!
//! # 生命周期
//!
//! 1. 录制：`track` + `convert_resource_state` / `convert_sub_resource_state`
//! 2. 多个列表一起提交：按提交顺序调用 `right_join`，得到列表之间的桥接 barrier
//! 3. 提交：`build_pre_transitions` 得到序言 barrier
//! 4. 执行顺序确定后：`stop_tracking` 把最终状态写回资源；丢弃列表则调用 `cancel`
//!
//! 追踪器本身不加锁：同一个追踪器只会在一个线程里录制，
//! 资源的 ground truth 只在 `stop_tracking` 时通过 `&mut` 修改。

mod conversion;
mod resource_state_tracker;
mod state_converter;
mod subresource_states;

pub use conversion::{ResourceBarrier, ResourceConversions, StateConversion, Subresource};
pub use resource_state_tracker::ResourceStateTracker;
pub use state_converter::StateConverter;
pub use subresource_states::SubresourceStates;
