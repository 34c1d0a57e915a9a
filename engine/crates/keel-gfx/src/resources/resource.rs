use crate::resource_state::ResourceState;

/// 资源类型
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GfxResourceKind {
    /// Buffer 只有一个 subresource
    Buffer,
    /// 贴图，subresource 数量 = mip_levels * array_layers
    Texture { mip_levels: u32, array_layers: u32 },
}

/// 贴图描述
#[derive(Clone, Debug)]
pub struct GfxTextureDesc {
    /// Mip 级别数
    pub mip_levels: u32,
    /// 数组层数
    pub array_layers: u32,
    /// 是否允许多个队列同时访问（simultaneous access）
    pub simultaneous_access: bool,
    /// 创建时资源所处的状态
    pub initial_state: ResourceState,
}

impl Default for GfxTextureDesc {
    fn default() -> Self {
        Self {
            mip_levels: 1,
            array_layers: 1,
            simultaneous_access: false,
            initial_state: ResourceState::COMMON,
        }
    }
}

// new & init
impl GfxTextureDesc {
    #[inline]
    pub fn new(mip_levels: u32, array_layers: u32) -> Self {
        Self {
            mip_levels,
            array_layers,
            ..Default::default()
        }
    }

    #[inline]
    pub fn with_simultaneous_access(mut self, simultaneous_access: bool) -> Self {
        self.simultaneous_access = simultaneous_access;
        self
    }

    #[inline]
    pub fn with_initial_state(mut self, initial_state: ResourceState) -> Self {
        self.initial_state = initial_state;
        self
    }
}

/// 被追踪的 GPU 资源
///
/// `states` 是资源的 ground truth：每个 subresource 已提交的状态。
/// 只有在命令列表的执行顺序确定之后（提交时）才会被修改。
#[derive(Debug)]
pub struct GfxResource {
    name: String,
    kind: GfxResourceKind,
    simultaneous_access: bool,
    states: Vec<ResourceState>,
}

// new & init
impl GfxResource {
    pub(crate) fn new_buffer(name: impl Into<String>, simultaneous_access: bool) -> Self {
        Self {
            name: name.into(),
            kind: GfxResourceKind::Buffer,
            simultaneous_access,
            // buffer 创建后总是处于 COMMON
            states: vec![ResourceState::COMMON],
        }
    }

    /// 描述由 [`crate::resources::manager::GfxResourceManager::create_texture`] 校验过
    pub(crate) fn new_texture(name: impl Into<String>, desc: &GfxTextureDesc) -> Self {
        let subresource_count = (desc.mip_levels * desc.array_layers) as usize;
        Self {
            name: name.into(),
            kind: GfxResourceKind::Texture {
                mip_levels: desc.mip_levels,
                array_layers: desc.array_layers,
            },
            simultaneous_access: desc.simultaneous_access,
            states: vec![desc.initial_state; subresource_count],
        }
    }
}

// getter
impl GfxResource {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> GfxResourceKind {
        self.kind
    }

    #[inline]
    pub fn subresource_count(&self) -> u32 {
        self.states.len() as u32
    }

    /// buffer 和 simultaneous access 的资源在执行完之后会衰减回 COMMON
    #[inline]
    pub fn is_buffer_or_simultaneous_access(&self) -> bool {
        self.kind == GfxResourceKind::Buffer || self.simultaneous_access
    }

    #[inline]
    pub fn states(&self) -> &[ResourceState] {
        &self.states
    }

    #[inline]
    pub(crate) fn states_mut(&mut self) -> &mut [ResourceState] {
        &mut self.states
    }

    /// 与 `D3D12CalcSubresource` 相同的排布：mip 在内层，array slice 在外层
    pub fn subresource_index(&self, mip_level: u32, array_slice: u32) -> u32 {
        match self.kind {
            GfxResourceKind::Buffer => {
                assert!(mip_level == 0 && array_slice == 0, "buffer `{}` has a single subresource", self.name);
                0
            }
            GfxResourceKind::Texture {
                mip_levels,
                array_layers,
            } => {
                assert!(
                    mip_level < mip_levels && array_slice < array_layers,
                    "subresource (mip {mip_level}, slice {array_slice}) out of range for `{}`",
                    self.name
                );
                mip_level + array_slice * mip_levels
            }
        }
    }
}
