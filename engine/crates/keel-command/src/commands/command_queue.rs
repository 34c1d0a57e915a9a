use anyhow::bail;
use itertools::Itertools;
use keel_gfx::resources::state_store::ResourceStateStore;
use keel_state_tracker::ResourceStateTracker;

use crate::commands::command_context::RecordedCommandList;
use crate::commands::command_list::GfxCommandList;

/// 队列类型，决定可以录制哪些命令以及提交后资源状态如何衰减
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueKind {
    Direct,
    Compute,
    Copy,
}

impl QueueKind {
    /// copy 队列执行完之后，所有用到的资源都回到 COMMON
    #[inline]
    pub fn is_copy(self) -> bool {
        self == Self::Copy
    }
}

/// 列表在一次提交中的角色
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListRole {
    /// 提交时生成：把资源从已提交的状态转换到第一个列表需要的状态
    Prologue,
    /// 用户录制的列表
    Body,
    /// 提交时生成：衔接前后两个列表
    Bridge,
}

#[derive(Clone, Debug)]
pub struct ExecutedList {
    pub role: ListRole,
    pub command_list: GfxCommandList,
}

/// 一次 `execute_command_lists` 的执行顺序
#[derive(Clone, Debug)]
pub struct SubmissionRecord {
    pub index: usize,
    pub lists: Vec<ExecutedList>,
}

impl SubmissionRecord {
    pub fn roles(&self) -> Vec<ListRole> {
        self.lists.iter().map(|list| list.role).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.lists.iter().map(|list| list.command_list.name()).collect()
    }
}

/// 命令队列
///
/// 不持有 GPU 队列，只负责确定一批命令列表的执行顺序：
/// 把各列表的追踪器按提交顺序拼接起来，补上序言和桥接列表，
/// 顺序确定之后再把资源的最终状态写回。
#[derive(Debug)]
pub struct GfxCommandQueue {
    name: String,
    kind: QueueKind,
    submission_count: usize,
}

// new & init
impl GfxCommandQueue {
    pub fn new(name: impl Into<String>, kind: QueueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            submission_count: 0,
        }
    }
}

// getter
impl GfxCommandQueue {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    /// 成功提交的次数
    #[inline]
    pub fn submission_count(&self) -> usize {
        self.submission_count
    }
}

// tools
impl GfxCommandQueue {
    /// 检查这批列表能否在本队列上提交，不修改任何东西
    pub fn validate<S: ResourceStateStore + ?Sized>(
        &self,
        store: &S,
        lists: &[RecordedCommandList],
    ) -> anyhow::Result<()> {
        for list in lists {
            if list.queue_kind() != self.kind {
                bail!(
                    "list `{}` was recorded for a {:?} queue, can not be executed on `{}` ({:?})",
                    list.name(),
                    list.queue_kind(),
                    self.name,
                    self.kind
                );
            }
            if let Some(resource) = list.tracker().tracked_resources().find(|&resource| !store.contains(resource)) {
                bail!("list `{}` uses resource {resource:?} which has been destroyed", list.name());
            }
        }
        Ok(())
    }

    /// 按顺序执行一批命令列表
    ///
    /// 实际执行顺序是 `[序言?, L1, 桥接1?, L2, ...]`：
    /// - 后一个列表的追踪器依次 `right_join` 前面所有列表，产生的转换放进两者之间的桥接列表
    /// - 合并后的追踪器用资源当前已提交的状态解析首次请求，得到序言
    /// - 顺序确定之后写回最终状态，copy 队列上的资源衰减为 COMMON
    ///
    /// 校验失败时返回错误，这批列表被丢弃，资源状态不变。
    pub fn execute_command_lists<S: ResourceStateStore + ?Sized>(
        &mut self,
        store: &mut S,
        lists: Vec<RecordedCommandList>,
    ) -> anyhow::Result<SubmissionRecord> {
        if let Err(err) = self.validate(store, &lists) {
            lists.into_iter().for_each(RecordedCommandList::discard);
            return Err(err);
        }

        let mut executed = Vec::with_capacity(lists.len() * 2 + 1);
        let mut combined = ResourceStateTracker::new();
        for list in lists {
            let (command_list, mut tracker) = list.into_parts();

            let bridge = tracker.right_join(&mut combined);
            if !bridge.is_empty() {
                let name = format!("{}-bridge", command_list.name());
                executed.push(ExecutedList {
                    role: ListRole::Bridge,
                    command_list: GfxCommandList::barrier_list(name, bridge),
                });
            }
            executed.push(ExecutedList {
                role: ListRole::Body,
                command_list,
            });
            combined = tracker;
        }

        let prologue = combined
            .build_pre_transitions(store)
            .iter()
            .flat_map(|conversions| conversions.barriers())
            .collect_vec();
        if !prologue.is_empty() {
            let name = format!("{}-prologue", executed[0].command_list.name());
            executed.insert(
                0,
                ExecutedList {
                    role: ListRole::Prologue,
                    command_list: GfxCommandList::barrier_list(name, prologue),
                },
            );
        }

        combined.stop_tracking(store, self.kind.is_copy());

        let record = SubmissionRecord {
            index: self.submission_count,
            lists: executed,
        };
        self.submission_count += 1;
        log::info!(
            "queue `{}` submission #{}: [{}]",
            self.name,
            record.index,
            record.names().iter().join(", ")
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use keel_gfx::resource_state::ResourceState;
    use keel_gfx::resources::handles::GfxResourceHandle;
    use keel_gfx::resources::manager::GfxResourceManager;
    use keel_gfx::resources::resource::GfxTextureDesc;
    use keel_state_tracker::{ResourceBarrier, Subresource};

    use super::*;
    use crate::commands::bindings::GfxBindings;
    use crate::commands::command_context::GfxCommandContext;

    fn setup() -> (GfxResourceManager, GfxResourceHandle, GfxResourceHandle) {
        keel_crate_tools::init_log::try_init_log();

        let mut manager = GfxResourceManager::new();
        let color = manager.create_texture("color", &GfxTextureDesc::new(1, 2)).unwrap();
        let vertices = manager.create_buffer("vertices", false);
        (manager, color, vertices)
    }

    #[test]
    fn test_batched_lists_are_stitched_in_order() {
        let (mut manager, color, vertices) = setup();

        let mut ctx_a = GfxCommandContext::new("shadow", QueueKind::Direct);
        ctx_a.clear_render_target(&manager, color, [0.0; 4]);
        let list_a = ctx_a.finish();

        let mut ctx_b = GfxCommandContext::new("lighting", QueueKind::Direct);
        let bindings = GfxBindings::default().pixel_shader_resource(color).vertex_buffer(vertices);
        ctx_b.draw(&manager, &bindings, 6, 1);
        let list_b = ctx_b.finish();

        let mut queue = GfxCommandQueue::new("graphics", QueueKind::Direct);
        let record = queue.execute_command_lists(&mut manager, vec![list_a, list_b]).unwrap();

        assert_eq!(
            record.roles(),
            vec![ListRole::Prologue, ListRole::Body, ListRole::Bridge, ListRole::Body]
        );
        assert_eq!(record.names(), vec!["shadow-prologue", "shadow", "lighting-bridge", "lighting"]);

        // 序言里只有 color；vertices 是 buffer，COMMON -> VERTEX_AND_CONSTANT_BUFFER 可以隐式提升
        let prologue: Vec<_> = record.lists[0].command_list.barriers().copied().collect();
        assert_eq!(
            prologue,
            vec![ResourceBarrier {
                resource: color,
                subresource: Subresource::All,
                before: ResourceState::COMMON,
                after: ResourceState::RENDER_TARGET,
            }]
        );

        let bridge: Vec<_> = record.lists[2].command_list.barriers().copied().collect();
        assert_eq!(
            bridge,
            vec![ResourceBarrier {
                resource: color,
                subresource: Subresource::All,
                before: ResourceState::RENDER_TARGET,
                after: ResourceState::PIXEL_SHADER_RESOURCE,
            }]
        );

        assert_eq!(manager.committed_states(color), &[ResourceState::PIXEL_SHADER_RESOURCE; 2]);
        // buffer 执行完之后衰减
        assert_eq!(manager.committed_states(vertices), &[ResourceState::COMMON]);
        assert_eq!(queue.submission_count(), 1);
    }

    #[test]
    fn test_later_submission_sees_committed_state() {
        let (mut manager, color, _) = setup();
        let mut queue = GfxCommandQueue::new("graphics", QueueKind::Direct);

        let mut ctx = GfxCommandContext::new("frame", QueueKind::Direct);
        ctx.clear_render_target(&manager, color, [0.0; 4]);
        let first = ctx.finish();
        queue.execute_command_lists(&mut manager, vec![first]).unwrap();

        // 同一个上下文继续录制；资源已经处于 RENDER_TARGET，不需要序言
        ctx.clear_render_target(&manager, color, [1.0; 4]);
        ctx.present(&manager, color);
        let second = ctx.finish();
        let record = queue.execute_command_lists(&mut manager, vec![second]).unwrap();

        assert_eq!(record.index, 1);
        assert_eq!(queue.submission_count(), 2);
        assert_eq!(record.roles(), vec![ListRole::Body]);
        assert_eq!(manager.committed_states(color), &[ResourceState::PRESENT; 2]);
    }

    #[test]
    fn test_copy_queue_decays_everything() {
        let (mut manager, color, vertices) = setup();

        let mut ctx = GfxCommandContext::new("upload", QueueKind::Copy);
        ctx.copy_resource(&manager, color, vertices);
        let list = ctx.finish();

        let mut queue = GfxCommandQueue::new("copy", QueueKind::Copy);
        queue.execute_command_lists(&mut manager, vec![list]).unwrap();

        assert_eq!(manager.committed_states(color), &[ResourceState::COMMON; 2]);
        assert_eq!(manager.committed_states(vertices), &[ResourceState::COMMON]);
    }

    #[test]
    fn test_destroyed_resource_fails_without_commit() {
        let (mut manager, color, vertices) = setup();

        let mut ctx = GfxCommandContext::new("stale", QueueKind::Direct);
        ctx.clear_render_target(&manager, color, [0.0; 4]);
        ctx.transition_resource(&manager, vertices, ResourceState::COPY_DEST);
        let list = ctx.finish();

        manager.destroy(vertices);

        let mut queue = GfxCommandQueue::new("graphics", QueueKind::Direct);
        let err = queue.execute_command_lists(&mut manager, vec![list]).unwrap_err();
        assert!(err.to_string().contains("has been destroyed"));

        assert_eq!(queue.submission_count(), 0);
        assert_eq!(manager.committed_states(color), &[ResourceState::COMMON; 2]);
    }

    #[test]
    fn test_queue_kind_mismatch_is_rejected() {
        let (mut manager, color, _) = setup();

        let mut ctx = GfxCommandContext::new("async-compute", QueueKind::Compute);
        ctx.transition_resource(&manager, color, ResourceState::UNORDERED_ACCESS);
        let list = ctx.finish();

        let queue = GfxCommandQueue::new("graphics", QueueKind::Direct);
        assert!(queue.validate(&manager, std::slice::from_ref(&list)).is_err());

        let mut compute_queue = GfxCommandQueue::new("compute", QueueKind::Compute);
        compute_queue.execute_command_lists(&mut manager, vec![list]).unwrap();
        assert_eq!(manager.committed_states(color), &[ResourceState::UNORDERED_ACCESS; 2]);
    }

    #[test]
    fn test_implicit_path_needs_no_bridge() {
        let (mut manager, color, _) = setup();

        // 两个列表都只读：PIXEL_SHADER_RESOURCE 和 COPY_SOURCE 之间可以隐式提升
        let mut ctx_a = GfxCommandContext::new("sample", QueueKind::Direct);
        ctx_a.draw(&manager, &GfxBindings::default().pixel_shader_resource(color), 3, 1);
        let list_a = ctx_a.finish();

        let mut ctx_b = GfxCommandContext::new("readback", QueueKind::Direct);
        ctx_b.transition_resource(&manager, color, ResourceState::COPY_SOURCE);
        let list_b = ctx_b.finish();

        let mut queue = GfxCommandQueue::new("graphics", QueueKind::Direct);
        let record = queue.execute_command_lists(&mut manager, vec![list_a, list_b]).unwrap();

        // COMMON -> PIXEL_SHADER_RESOURCE 本身是隐式提升，也没有序言
        assert_eq!(record.roles(), vec![ListRole::Body, ListRole::Body]);
        // 两个列表的读状态累加，和在一个列表里录制的结果相同
        assert_eq!(
            manager.committed_states(color),
            &[ResourceState::PIXEL_SHADER_RESOURCE | ResourceState::COPY_SOURCE; 2]
        );
    }
}
