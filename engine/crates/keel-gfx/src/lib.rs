//! GFX 层
//!
//! 提供资源访问状态（[`resource_state::ResourceState`]）和隐式提升规则，
//! 以及持有 GPU 资源 ground truth 状态的 [`resources::manager::GfxResourceManager`]。
//!
//! 状态追踪本身在 `keel-state-tracker` 里，这里只定义它依赖的边界。

pub mod resource_state;
pub mod resources;
