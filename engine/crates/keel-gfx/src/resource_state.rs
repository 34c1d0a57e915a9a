//! 资源访问状态
//!
//! 数值与 D3D12 的 `D3D12_RESOURCE_STATES` 保持一致，`PRESENT` 和 `COMMON` 同为 0。
//! 额外定义了一个哨兵状态 [`ResourceState::UNKNOWN`]，表示"还没有被赋过值"，
//! 它占用一个独立的高位，永远不会和其他状态组合在一起。

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// 资源的访问状态
    ///
    /// 多个只读状态可以同时存在（隐式提升是累加的），写状态之间互斥。
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ResourceState: u32 {
        const COMMON = 0;
        const VERTEX_AND_CONSTANT_BUFFER = 0x1;
        const INDEX_BUFFER = 0x2;
        const RENDER_TARGET = 0x4;
        const UNORDERED_ACCESS = 0x8;
        const DEPTH_WRITE = 0x10;
        const DEPTH_READ = 0x20;
        const NON_PIXEL_SHADER_RESOURCE = 0x40;
        const PIXEL_SHADER_RESOURCE = 0x80;
        const STREAM_OUT = 0x100;
        const INDIRECT_ARGUMENT = 0x200;
        const COPY_DEST = 0x400;
        const COPY_SOURCE = 0x800;
        const RESOLVE_DEST = 0x1000;
        const RESOLVE_SOURCE = 0x2000;
        const PRESENT = 0;

        /// 哨兵：从未被赋值
        const UNKNOWN = 0x8000_0000;
    }
}

impl Default for ResourceState {
    fn default() -> Self {
        Self::COMMON
    }
}

// 派生掩码
impl ResourceState {
    /// 只读状态
    pub const READ_ONLY: Self = Self::from_bits_retain(
        Self::VERTEX_AND_CONSTANT_BUFFER.bits()
            | Self::INDEX_BUFFER.bits()
            | Self::NON_PIXEL_SHADER_RESOURCE.bits()
            | Self::PIXEL_SHADER_RESOURCE.bits()
            | Self::INDIRECT_ARGUMENT.bits()
            | Self::COPY_SOURCE.bits()
            | Self::DEPTH_READ.bits(),
    );

    /// 只写状态，彼此之间不能隐式切换
    pub const WRITE_ONLY: Self =
        Self::from_bits_retain(Self::COPY_DEST.bits() | Self::RENDER_TARGET.bits() | Self::STREAM_OUT.bits());

    /// 非 buffer、非 simultaneous access 的资源只能在这些状态之间隐式提升
    pub const SHADER_COPY: Self = Self::from_bits_retain(
        Self::NON_PIXEL_SHADER_RESOURCE.bits()
            | Self::PIXEL_SHADER_RESOURCE.bits()
            | Self::COPY_SOURCE.bits()
            | Self::COPY_DEST.bits(),
    );

    const DEPTH: Self = Self::from_bits_retain(Self::DEPTH_WRITE.bits() | Self::DEPTH_READ.bits());
}

// 查询
impl ResourceState {
    #[inline]
    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }

    #[inline]
    pub fn touches_depth(self) -> bool {
        self.intersects(Self::DEPTH)
    }

    /// 所有位都是只读状态；`COMMON` 不算只读
    #[inline]
    pub fn is_read_only(self) -> bool {
        !self.is_empty() && Self::READ_ONLY.contains(self)
    }

    #[inline]
    pub fn write_bits(self) -> Self {
        self & Self::WRITE_ONLY
    }
}

/// 隐式提升规则
///
/// 返回 `None` 表示必须插入显式 barrier；返回 `Some(state)` 表示无需 barrier，
/// `state` 是提升之后资源实际所处的状态（`before | after`）。
///
/// 规则按顺序判断：
/// 1. 任一侧涉及深度状态，拒绝
/// 2. `before` 已知且两侧的写状态位不同，拒绝
/// 3. 非 buffer、非 simultaneous access 的资源，`after` 超出 [`ResourceState::SHADER_COPY`]，拒绝
/// 4. 其余接受
pub fn can_promote_implicitly(
    before: ResourceState,
    after: ResourceState,
    is_buffer_or_simultaneous: bool,
) -> Option<ResourceState> {
    if before.touches_depth() || after.touches_depth() {
        return None;
    }

    if !before.is_unknown() && before.write_bits() != after.write_bits() {
        return None;
    }

    if !is_buffer_or_simultaneous && !(after - ResourceState::SHADER_COPY).is_empty() {
        return None;
    }

    if before.is_unknown() { Some(after) } else { Some(after | before) }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "COMMON");
        }

        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                write!(f, " | ")?;
            }
            write!(f, "{name}")?;
            first = false;
        }
        // 没有名字的位原样输出，方便排查
        let unnamed = self.bits() & !Self::all().bits();
        if unnamed != 0 {
            if !first {
                write!(f, " | ")?;
            }
            write!(f, "{unnamed:#x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_to_copy_source() {
        let after = can_promote_implicitly(ResourceState::COMMON, ResourceState::COPY_SOURCE, true);
        assert_eq!(after, Some(ResourceState::COPY_SOURCE));
    }

    #[test]
    fn test_promotion_is_additive() {
        let after = can_promote_implicitly(ResourceState::PIXEL_SHADER_RESOURCE, ResourceState::COPY_SOURCE, true);
        assert_eq!(after, Some(ResourceState::PIXEL_SHADER_RESOURCE | ResourceState::COPY_SOURCE));

        // 贴图也允许在 shader/copy 读状态之间提升
        let after = can_promote_implicitly(ResourceState::PIXEL_SHADER_RESOURCE, ResourceState::COPY_SOURCE, false);
        assert_eq!(after, Some(ResourceState::PIXEL_SHADER_RESOURCE | ResourceState::COPY_SOURCE));
    }

    #[test]
    fn test_depth_never_promotes() {
        for is_buffer in [true, false] {
            assert_eq!(can_promote_implicitly(ResourceState::RENDER_TARGET, ResourceState::DEPTH_WRITE, is_buffer), None);
            assert_eq!(can_promote_implicitly(ResourceState::DEPTH_READ, ResourceState::COPY_SOURCE, is_buffer), None);
            assert_eq!(can_promote_implicitly(ResourceState::COMMON, ResourceState::DEPTH_READ, is_buffer), None);
        }
    }

    #[test]
    fn test_conflicting_write_states() {
        for is_buffer in [true, false] {
            assert_eq!(can_promote_implicitly(ResourceState::COPY_DEST, ResourceState::RENDER_TARGET, is_buffer), None);
            assert_eq!(can_promote_implicitly(ResourceState::RENDER_TARGET, ResourceState::COMMON, is_buffer), None);
        }
    }

    #[test]
    fn test_texture_limited_to_shader_copy() {
        assert_eq!(
            can_promote_implicitly(ResourceState::COMMON, ResourceState::UNORDERED_ACCESS, false),
            None
        );
        assert_eq!(
            can_promote_implicitly(ResourceState::COMMON, ResourceState::UNORDERED_ACCESS, true),
            Some(ResourceState::UNORDERED_ACCESS)
        );
        assert_eq!(
            can_promote_implicitly(ResourceState::COMMON, ResourceState::INDEX_BUFFER, false),
            None
        );
    }

    #[test]
    fn test_unknown_before_does_not_leak() {
        let after = can_promote_implicitly(ResourceState::UNKNOWN, ResourceState::PIXEL_SHADER_RESOURCE, false);
        assert_eq!(after, Some(ResourceState::PIXEL_SHADER_RESOURCE));

        // 写状态检查对未知状态不生效
        let after = can_promote_implicitly(ResourceState::UNKNOWN, ResourceState::COPY_DEST, false);
        assert_eq!(after, Some(ResourceState::COPY_DEST));
    }

    #[test]
    fn test_masks() {
        assert!(ResourceState::COPY_SOURCE.is_read_only());
        assert!((ResourceState::PIXEL_SHADER_RESOURCE | ResourceState::DEPTH_READ).is_read_only());
        assert!(!ResourceState::COMMON.is_read_only());
        assert!(!ResourceState::UNORDERED_ACCESS.is_read_only());
        assert_eq!(ResourceState::PRESENT, ResourceState::COMMON);
        assert!(!ResourceState::UNKNOWN.touches_depth());
    }

    #[test]
    fn test_display() {
        assert_eq!(ResourceState::COMMON.to_string(), "COMMON");
        assert_eq!(ResourceState::RENDER_TARGET.to_string(), "RENDER_TARGET");
        assert_eq!(
            (ResourceState::PIXEL_SHADER_RESOURCE | ResourceState::COPY_SOURCE).to_string(),
            "PIXEL_SHADER_RESOURCE | COPY_SOURCE"
        );
    }
}
