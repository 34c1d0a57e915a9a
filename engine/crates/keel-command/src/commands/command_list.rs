use keel_gfx::resources::handles::GfxResourceHandle;
use keel_state_tracker::ResourceBarrier;

/// 录制下来的一条命令
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedCommand {
    /// 原生 barrier，一次可以包含多个资源
    ResourceBarrier(Vec<ResourceBarrier>),
    ClearRenderTarget {
        target: GfxResourceHandle,
        color: [f32; 4],
    },
    ClearDepthStencil {
        target: GfxResourceHandle,
        depth: f32,
        stencil: u8,
    },
    CopyResource {
        dst: GfxResourceHandle,
        src: GfxResourceHandle,
    },
    CopyBufferRegion {
        dst: GfxResourceHandle,
        dst_offset: u64,
        src: GfxResourceHandle,
        src_offset: u64,
        size: u64,
    },
    ResolveSubresource {
        dst: GfxResourceHandle,
        dst_subresource: u32,
        src: GfxResourceHandle,
        src_subresource: u32,
    },
    Draw {
        vertex_count: u32,
        instance_count: u32,
    },
    Dispatch {
        group_count: [u32; 3],
    },
    Present {
        back_buffer: GfxResourceHandle,
    },
}

/// 命令列表
///
/// 按录制顺序保存命令；提交时队列额外生成的序言、桥接列表也是这个类型，只包含 barrier。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GfxCommandList {
    name: String,
    commands: Vec<RecordedCommand>,
}

// new & init
impl GfxCommandList {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
        }
    }

    /// 只包含一条 barrier 命令的列表
    pub fn barrier_list(name: impl Into<String>, barriers: Vec<ResourceBarrier>) -> Self {
        let mut list = Self::new(name);
        list.resource_barrier(barriers);
        list
    }
}

// getter
impl GfxCommandList {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn is_barrier_only(&self) -> bool {
        self.commands.iter().all(|cmd| matches!(cmd, RecordedCommand::ResourceBarrier(_)))
    }

    /// 所有 barrier 命令里的 barrier，按录制顺序
    pub fn barriers(&self) -> impl Iterator<Item = &ResourceBarrier> {
        self.commands.iter().flat_map(|cmd| match cmd {
            RecordedCommand::ResourceBarrier(barriers) => barriers.as_slice(),
            _ => &[][..],
        })
    }

    #[inline]
    pub fn barrier_count(&self) -> usize {
        self.barriers().count()
    }
}

// 录制
impl GfxCommandList {
    /// 空的 barrier 组不会被录制
    pub fn resource_barrier(&mut self, barriers: Vec<ResourceBarrier>) {
        if !barriers.is_empty() {
            self.commands.push(RecordedCommand::ResourceBarrier(barriers));
        }
    }

    #[inline]
    pub fn push(&mut self, command: RecordedCommand) {
        self.commands.push(command);
    }

    #[inline]
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

#[cfg(test)]
mod tests {
    use keel_gfx::resource_state::ResourceState;
    use keel_gfx::resources::manager::GfxResourceManager;
    use keel_state_tracker::Subresource;

    use super::*;

    #[test]
    fn test_barrier_list() {
        let mut manager = GfxResourceManager::new();
        let buffer = manager.create_buffer("readback", false);

        let barrier = ResourceBarrier {
            resource: buffer,
            subresource: Subresource::All,
            before: ResourceState::UNORDERED_ACCESS,
            after: ResourceState::COPY_SOURCE,
        };
        let list = GfxCommandList::barrier_list("prologue", vec![barrier]);
        assert!(list.is_barrier_only());
        assert_eq!(list.barrier_count(), 1);
        assert_eq!(list.barriers().next(), Some(&barrier));

        assert!(GfxCommandList::barrier_list("nothing", Vec::new()).is_empty());
    }

    #[test]
    fn test_body_is_not_barrier_only() {
        let mut list = GfxCommandList::new("body");
        list.push(RecordedCommand::Draw {
            vertex_count: 3,
            instance_count: 1,
        });
        assert!(!list.is_barrier_only());
        assert_eq!(list.barrier_count(), 0);

        list.clear();
        assert!(list.is_empty());
    }
}
