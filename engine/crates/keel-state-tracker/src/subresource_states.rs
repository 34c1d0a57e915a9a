use itertools::Itertools;
use keel_gfx::resource_state::ResourceState;

/// 每个 subresource 的状态
///
/// 大多数资源的所有 subresource 状态总是相同的，这时只存一个值（folded）；
/// 一旦某个 subresource 单独变化，就展开成数组（unfolded）。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubresourceStates {
    Folded(ResourceState),
    Unfolded(Vec<ResourceState>),
}

impl Default for SubresourceStates {
    fn default() -> Self {
        Self::Folded(ResourceState::UNKNOWN)
    }
}

// new & init
impl SubresourceStates {
    /// 所有值相同时直接折叠
    pub fn from_vec(states: Vec<ResourceState>) -> Self {
        let mut result = Self::Unfolded(states);
        result.try_fold();
        result
    }
}

// getter
impl SubresourceStates {
    #[inline]
    pub fn is_folded(&self) -> bool {
        matches!(self, Self::Folded(_))
    }

    #[inline]
    pub fn as_folded(&self) -> Option<ResourceState> {
        match self {
            Self::Folded(state) => Some(*state),
            Self::Unfolded(_) => None,
        }
    }

    #[inline]
    pub fn get(&self, idx: usize) -> ResourceState {
        match self {
            Self::Folded(state) => *state,
            Self::Unfolded(states) => states[idx],
        }
    }

    /// 是否所有 subresource 都还没有被赋值
    pub fn is_all_unknown(&self) -> bool {
        match self {
            Self::Folded(state) => state.is_unknown(),
            Self::Unfolded(states) => states.iter().all(|s| s.is_unknown()),
        }
    }
}

// update
impl SubresourceStates {
    /// 整个资源设置为同一个状态
    #[inline]
    pub fn fill(&mut self, state: ResourceState) {
        *self = Self::Folded(state);
    }

    /// 单独设置一个 subresource，必要时先展开
    pub fn set(&mut self, idx: usize, state: ResourceState, subresource_count: usize) {
        if let Self::Folded(folded) = *self {
            if folded == state {
                return;
            }
        }
        self.unfold(subresource_count)[idx] = state;
    }

    /// 展开为数组，返回可写的数组
    pub fn unfold(&mut self, subresource_count: usize) -> &mut [ResourceState] {
        if let Self::Folded(state) = *self {
            *self = Self::Unfolded(vec![state; subresource_count]);
        }
        match self {
            Self::Unfolded(states) => states,
            Self::Folded(_) => unreachable!(),
        }
    }

    /// 所有值相同则折叠，返回当前是否处于折叠状态
    pub fn try_fold(&mut self) -> bool {
        if let Self::Unfolded(states) = self {
            if !states.iter().all_equal() {
                return false;
            }
            let state = states.first().copied().unwrap_or(ResourceState::UNKNOWN);
            *self = Self::Folded(state);
        }
        true
    }
}
