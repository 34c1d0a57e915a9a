use keel_gfx::resource_state::ResourceState;
use keel_gfx::resources::handles::GfxResourceHandle;
use keel_gfx::resources::state_store::ResourceStateStore;
use keel_state_tracker::{ResourceBarrier, ResourceStateTracker};

use crate::commands::bindings::GfxBindings;
use crate::commands::command_list::{GfxCommandList, RecordedCommand};
use crate::commands::command_queue::QueueKind;

/// 命令录制上下文
///
/// 持有一个正在录制的命令列表和它的状态追踪器。每条用到资源的命令先向追踪器请求状态，
/// 追踪器返回的 barrier 作为一条命令插在该命令之前。
///
/// 第一次使用某个资源时不会产生 barrier，它的前置状态要等到提交时才能确定，
/// 由 [`crate::commands::command_queue::GfxCommandQueue`] 放进序言列表。
///
/// # 使用示例
/// ```ignore
/// let mut ctx = GfxCommandContext::new("gbuffer-pass", QueueKind::Direct);
/// ctx.clear_render_target(&manager, albedo, [0.0; 4]);
/// ctx.draw(&manager, &GfxBindings::default().render_target(albedo), 3, 1);
/// let recorded = ctx.finish();
/// queue.execute_command_lists(&mut manager, vec![recorded])?;
/// ```
#[derive(Debug)]
pub struct GfxCommandContext {
    queue_kind: QueueKind,
    command_list: GfxCommandList,
    tracker: ResourceStateTracker,
}

// new & init
impl GfxCommandContext {
    pub fn new(name: impl Into<String>, queue_kind: QueueKind) -> Self {
        Self {
            queue_kind,
            command_list: GfxCommandList::new(name),
            tracker: ResourceStateTracker::new(),
        }
    }
}

// getter
impl GfxCommandContext {
    #[inline]
    pub fn name(&self) -> &str {
        self.command_list.name()
    }

    #[inline]
    pub fn queue_kind(&self) -> QueueKind {
        self.queue_kind
    }

    #[inline]
    pub fn command_list(&self) -> &GfxCommandList {
        &self.command_list
    }

    #[inline]
    pub fn tracker(&self) -> &ResourceStateTracker {
        &self.tracker
    }
}

// 状态请求
impl GfxCommandContext {
    fn require<S: ResourceStateStore + ?Sized>(
        &mut self,
        store: &S,
        resource: GfxResourceHandle,
        state: ResourceState,
        barriers: &mut Vec<ResourceBarrier>,
    ) {
        self.tracker.track(store, resource);
        barriers.extend(self.tracker.convert_resource_state(resource, state));
    }

    fn require_sub<S: ResourceStateStore + ?Sized>(
        &mut self,
        store: &S,
        resource: GfxResourceHandle,
        subresource: u32,
        state: ResourceState,
        barriers: &mut Vec<ResourceBarrier>,
    ) {
        self.tracker.track(store, resource);
        barriers.extend(self.tracker.convert_sub_resource_state(resource, subresource, state));
    }

    fn require_bindings<S: ResourceStateStore + ?Sized>(
        &mut self,
        store: &S,
        command: &str,
        bindings: &GfxBindings,
        barriers: &mut Vec<ResourceBarrier>,
    ) {
        if let Some((resource, state)) = bindings.find_conflict() {
            panic!("`{command}` in list `{}` binds {resource:?} as {state}", self.name());
        }
        for (resource, state) in bindings.required_states() {
            self.require(store, resource, state, barriers);
        }
    }

    /// 先写入这条命令需要的 barrier，再写入命令本身
    fn record(&mut self, barriers: Vec<ResourceBarrier>, command: RecordedCommand) {
        self.command_list.resource_barrier(barriers);
        self.command_list.push(command);
    }

    fn assert_queue_supports(&self, command: &str, supported: &[QueueKind]) {
        assert!(
            supported.contains(&self.queue_kind),
            "`{command}` is not supported on a {:?} queue (list `{}`)",
            self.queue_kind,
            self.name()
        );
    }
}

// 显式转换
impl GfxCommandContext {
    /// 整个资源转换到 `state`
    ///
    /// 只在资源之后的用法不由命令本身表达时需要，比如交给其他队列或者外部 API 使用。
    pub fn transition_resource<S: ResourceStateStore + ?Sized>(
        &mut self,
        store: &S,
        resource: GfxResourceHandle,
        state: ResourceState,
    ) {
        let mut barriers = Vec::new();
        self.require(store, resource, state, &mut barriers);
        self.command_list.resource_barrier(barriers);
    }

    pub fn transition_subresource<S: ResourceStateStore + ?Sized>(
        &mut self,
        store: &S,
        resource: GfxResourceHandle,
        subresource: u32,
        state: ResourceState,
    ) {
        let mut barriers = Vec::new();
        self.require_sub(store, resource, subresource, state, &mut barriers);
        self.command_list.resource_barrier(barriers);
    }
}

// 数据传输类型
impl GfxCommandContext {
    /// - 支持的 queue：direct，compute，copy
    pub fn copy_resource<S: ResourceStateStore + ?Sized>(
        &mut self,
        store: &S,
        dst: GfxResourceHandle,
        src: GfxResourceHandle,
    ) {
        assert_ne!(dst, src, "copy source and destination must be different resources");

        let mut barriers = Vec::new();
        self.require(store, dst, ResourceState::COPY_DEST, &mut barriers);
        self.require(store, src, ResourceState::COPY_SOURCE, &mut barriers);
        self.record(barriers, RecordedCommand::CopyResource { dst, src });
    }

    /// - 支持的 queue：direct，compute，copy
    pub fn copy_buffer_region<S: ResourceStateStore + ?Sized>(
        &mut self,
        store: &S,
        dst: GfxResourceHandle,
        dst_offset: u64,
        src: GfxResourceHandle,
        src_offset: u64,
        size: u64,
    ) {
        let mut barriers = Vec::new();
        self.require(store, dst, ResourceState::COPY_DEST, &mut barriers);
        if src != dst {
            self.require(store, src, ResourceState::COPY_SOURCE, &mut barriers);
        }
        self.record(
            barriers,
            RecordedCommand::CopyBufferRegion {
                dst,
                dst_offset,
                src,
                src_offset,
                size,
            },
        );
    }

    /// 多重采样 resolve，只涉及两个 subresource
    ///
    /// - 支持的 queue：direct
    pub fn resolve_subresource<S: ResourceStateStore + ?Sized>(
        &mut self,
        store: &S,
        dst: GfxResourceHandle,
        dst_subresource: u32,
        src: GfxResourceHandle,
        src_subresource: u32,
    ) {
        self.assert_queue_supports("resolve_subresource", &[QueueKind::Direct]);

        let mut barriers = Vec::new();
        self.require_sub(store, dst, dst_subresource, ResourceState::RESOLVE_DEST, &mut barriers);
        self.require_sub(store, src, src_subresource, ResourceState::RESOLVE_SOURCE, &mut barriers);
        self.record(
            barriers,
            RecordedCommand::ResolveSubresource {
                dst,
                dst_subresource,
                src,
                src_subresource,
            },
        );
    }
}

// 图形 & 计算
impl GfxCommandContext {
    /// - 支持的 queue：direct
    pub fn clear_render_target<S: ResourceStateStore + ?Sized>(
        &mut self,
        store: &S,
        target: GfxResourceHandle,
        color: [f32; 4],
    ) {
        self.assert_queue_supports("clear_render_target", &[QueueKind::Direct]);

        let mut barriers = Vec::new();
        self.require(store, target, ResourceState::RENDER_TARGET, &mut barriers);
        self.record(barriers, RecordedCommand::ClearRenderTarget { target, color });
    }

    /// - 支持的 queue：direct
    pub fn clear_depth_stencil<S: ResourceStateStore + ?Sized>(
        &mut self,
        store: &S,
        target: GfxResourceHandle,
        depth: f32,
        stencil: u8,
    ) {
        self.assert_queue_supports("clear_depth_stencil", &[QueueKind::Direct]);

        let mut barriers = Vec::new();
        self.require(store, target, ResourceState::DEPTH_WRITE, &mut barriers);
        self.record(barriers, RecordedCommand::ClearDepthStencil { target, depth, stencil });
    }

    /// 所有绑定的资源一次性转换，barrier 合并成一条命令
    ///
    /// - 支持的 queue：direct
    pub fn draw<S: ResourceStateStore + ?Sized>(
        &mut self,
        store: &S,
        bindings: &GfxBindings,
        vertex_count: u32,
        instance_count: u32,
    ) {
        self.assert_queue_supports("draw", &[QueueKind::Direct]);

        let mut barriers = Vec::new();
        self.require_bindings(store, "draw", bindings, &mut barriers);
        self.record(
            barriers,
            RecordedCommand::Draw {
                vertex_count,
                instance_count,
            },
        );
    }

    /// - 支持的 queue：direct，compute
    pub fn dispatch<S: ResourceStateStore + ?Sized>(
        &mut self,
        store: &S,
        bindings: &GfxBindings,
        group_count: [u32; 3],
    ) {
        self.assert_queue_supports("dispatch", &[QueueKind::Direct, QueueKind::Compute]);
        assert!(
            bindings.is_compute_compatible(),
            "dispatch in list `{}` binds resources in graphics-only states",
            self.name()
        );

        let mut barriers = Vec::new();
        self.require_bindings(store, "dispatch", bindings, &mut barriers);
        self.record(barriers, RecordedCommand::Dispatch { group_count });
    }

    /// - 支持的 queue：direct
    pub fn present<S: ResourceStateStore + ?Sized>(&mut self, store: &S, back_buffer: GfxResourceHandle) {
        self.assert_queue_supports("present", &[QueueKind::Direct]);

        let mut barriers = Vec::new();
        self.require(store, back_buffer, ResourceState::PRESENT, &mut barriers);
        self.record(barriers, RecordedCommand::Present { back_buffer });
    }
}

// 结束录制
impl GfxCommandContext {
    /// 结束录制，交出命令列表和仍在追踪中的状态
    ///
    /// 上下文之后可以继续录制新的列表。
    pub fn finish(&mut self) -> RecordedCommandList {
        let next = GfxCommandList::new(self.name());
        let command_list = std::mem::replace(&mut self.command_list, next);
        log::debug!(
            "finish `{}`: {} commands, {} tracked resources",
            command_list.name(),
            command_list.commands().len(),
            self.tracker.tracked_count()
        );

        RecordedCommandList {
            queue_kind: self.queue_kind,
            command_list,
            tracker: std::mem::take(&mut self.tracker),
        }
    }

    /// 丢弃已经录制的内容，资源状态不受影响
    pub fn reset(&mut self) {
        self.tracker.cancel();
        self.command_list.clear();
    }
}

/// 录制完成、等待提交的命令列表
///
/// 追踪器仍然打开：首次请求还没有解析，最终状态还没有写回资源。
/// 交给 [`crate::commands::command_queue::GfxCommandQueue::execute_command_lists`] 提交，或者调用 [`Self::discard`]。
#[derive(Debug)]
pub struct RecordedCommandList {
    queue_kind: QueueKind,
    command_list: GfxCommandList,
    tracker: ResourceStateTracker,
}

// getter
impl RecordedCommandList {
    #[inline]
    pub fn name(&self) -> &str {
        self.command_list.name()
    }

    #[inline]
    pub fn queue_kind(&self) -> QueueKind {
        self.queue_kind
    }

    #[inline]
    pub fn command_list(&self) -> &GfxCommandList {
        &self.command_list
    }

    #[inline]
    pub fn tracker(&self) -> &ResourceStateTracker {
        &self.tracker
    }

    #[inline]
    pub(crate) fn into_parts(self) -> (GfxCommandList, ResourceStateTracker) {
        (self.command_list, self.tracker)
    }
}

impl RecordedCommandList {
    /// 放弃提交，不修改任何资源的状态
    pub fn discard(mut self) {
        if !self.command_list.is_empty() {
            log::warn!(
                "discard `{}` with {} recorded commands",
                self.command_list.name(),
                self.command_list.commands().len()
            );
        }
        self.tracker.cancel();
    }
}
