use slotmap::new_key_type;

new_key_type! {
    /// GPU 资源句柄
    ///
    /// 由 [`GfxResourceManager`](super::manager::GfxResourceManager) 分配。
    /// 状态追踪只持有句柄，从不持有资源本身。
    pub struct GfxResourceHandle;
}
