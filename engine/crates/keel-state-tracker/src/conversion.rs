use std::fmt;

use keel_gfx::resource_state::ResourceState;
use keel_gfx::resources::handles::GfxResourceHandle;

/// barrier 作用的范围
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Subresource {
    /// 整个资源（`D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES`）
    All,
    Index(u32),
}

impl fmt::Display for Subresource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "*"),
            Self::Index(idx) => write!(f, "{idx}"),
        }
    }
}

/// 一次必须显式执行的状态转换
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateConversion {
    pub subresource: Subresource,
    pub before: ResourceState,
    pub after: ResourceState,
}

// new & init
impl StateConversion {
    #[inline]
    pub fn new(subresource: Subresource, before: ResourceState, after: ResourceState) -> Self {
        Self {
            subresource,
            before,
            after,
        }
    }

    #[inline]
    pub fn whole(before: ResourceState, after: ResourceState) -> Self {
        Self::new(Subresource::All, before, after)
    }

    #[inline]
    pub fn sub(idx: u32, before: ResourceState, after: ResourceState) -> Self {
        Self::new(Subresource::Index(idx), before, after)
    }
}

/// 每个 subresource 都需要同一个转换时，合并成一个整体转换
pub(crate) fn collapse_conversions(conversions: Vec<StateConversion>, subresource_count: u32) -> Vec<StateConversion> {
    let Some(head) = conversions.first().copied() else {
        return conversions;
    };
    let covers_all = conversions.len() == subresource_count as usize
        && conversions.iter().all(|c| c.before == head.before && c.after == head.after);

    if covers_all { vec![StateConversion::whole(head.before, head.after)] } else { conversions }
}

/// 附带资源句柄的转换，交给命令列表插入原生 barrier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResourceBarrier {
    pub resource: GfxResourceHandle,
    pub subresource: Subresource,
    pub before: ResourceState,
    pub after: ResourceState,
}

impl ResourceBarrier {
    #[inline]
    pub fn from_conversion(resource: GfxResourceHandle, conversion: StateConversion) -> Self {
        Self {
            resource,
            subresource: conversion.subresource,
            before: conversion.before,
            after: conversion.after,
        }
    }
}

impl fmt::Display for ResourceBarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}[{}]: {} -> {}", self.resource, self.subresource, self.before, self.after)
    }
}

/// 同一个资源的一组转换
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceConversions {
    pub resource: GfxResourceHandle,
    pub conversions: Vec<StateConversion>,
}

impl ResourceConversions {
    pub fn barriers(&self) -> impl Iterator<Item = ResourceBarrier> + '_ {
        self.conversions
            .iter()
            .map(|&conversion| ResourceBarrier::from_conversion(self.resource, conversion))
    }
}
