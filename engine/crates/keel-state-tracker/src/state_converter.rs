//! 单个资源在一次录制中的状态转换
//!
//! 每个 subresource 维护两条轨迹：
//! - `last`：录制到当前位置时，资源在执行完已录制的命令后会处于的状态
//! - `first`：本次录制中第一次请求的目标状态。录制时还不知道真实的前置状态，
//!   所以先不生成 barrier，提交时再用 [`StateConverter::pre_convert`] 或
//!   [`StateConverter::merge`] 补齐
//!
//! 两条轨迹各自独立地折叠/展开，`last` 折叠时 `first` 仍可以保持每个 subresource 不同的值。
//!
//! 首次请求在提交时如果是隐式提升，真实状态是前置状态和 `last` 的并集；
//! 只有从首次请求到现在都没有经过显式 barrier 的 subresource 才能这样合并。

use keel_gfx::resource_state::{ResourceState, can_promote_implicitly};

use crate::conversion::{StateConversion, collapse_conversions};
use crate::subresource_states::SubresourceStates;

#[derive(Clone, Debug)]
pub struct StateConverter {
    subresource_count: u32,
    is_buffer_or_simultaneous: bool,

    last: SubresourceStates,
    first: SubresourceStates,
    /// 每个 subresource 在首次请求之后是否执行过显式转换
    explicit: Vec<bool>,
}

// new & init
impl StateConverter {
    pub fn new(subresource_count: u32, is_buffer_or_simultaneous: bool) -> Self {
        assert!(subresource_count >= 1, "a resource has at least one subresource");
        Self {
            subresource_count,
            is_buffer_or_simultaneous,
            last: SubresourceStates::default(),
            first: SubresourceStates::default(),
            explicit: vec![false; subresource_count as usize],
        }
    }
}

// getter
impl StateConverter {
    #[inline]
    pub fn subresource_count(&self) -> u32 {
        self.subresource_count
    }

    #[inline]
    pub fn is_buffer_or_simultaneous(&self) -> bool {
        self.is_buffer_or_simultaneous
    }

    /// `last` 轨迹是否处于折叠状态
    #[inline]
    pub fn is_folded(&self) -> bool {
        self.last.is_folded()
    }

    #[inline]
    pub fn last_state(&self, idx: u32) -> ResourceState {
        self.check_index(idx);
        self.last.get(idx as usize)
    }

    /// 还没有解析的首次请求，`UNKNOWN` 表示该 subresource 在本次录制中没有被使用
    #[inline]
    pub fn first_state(&self, idx: u32) -> ResourceState {
        self.check_index(idx);
        self.first.get(idx as usize)
    }

    /// 本次录制中是否请求过任何状态
    #[inline]
    pub fn is_touched(&self) -> bool {
        !self.last.is_all_unknown()
    }

    #[inline]
    fn check_index(&self, idx: u32) {
        assert!(
            idx < self.subresource_count,
            "subresource index {idx} out of range (count = {})",
            self.subresource_count
        );
    }
}

// 录制期间的转换
impl StateConverter {
    /// 从 `before` 到 `after` 能否免 barrier，能的话返回之后的状态
    #[inline]
    fn resolve(&self, before: ResourceState, after: ResourceState) -> Option<ResourceState> {
        if before == after {
            return Some(before);
        }
        can_promote_implicitly(before, after, self.is_buffer_or_simultaneous)
    }

    /// 整个资源转换到 `dst`
    pub fn convert(&mut self, dst: ResourceState) -> Vec<StateConversion> {
        debug_assert!(!dst.is_unknown(), "UNKNOWN is not a valid destination state");

        if let Some(last) = self.last.as_folded() {
            if last.is_unknown() {
                // 第一次使用：不需要 barrier，记下目标状态留到提交时解析
                self.first.fill(dst);
                self.last.fill(dst);
                return Vec::new();
            }

            return match self.resolve(last, dst) {
                Some(promoted) => {
                    self.last.fill(promoted);
                    Vec::new()
                }
                None => {
                    self.last.fill(dst);
                    self.explicit.fill(true);
                    vec![StateConversion::whole(last, dst)]
                }
            };
        }

        let conversions = (0..self.subresource_count)
            .filter_map(|idx| self.convert_slot(idx, dst))
            .collect();

        self.last.try_fold();
        self.first.try_fold();
        collapse_conversions(conversions, self.subresource_count)
    }

    /// 单个 subresource 转换到 `dst`
    pub fn convert_sub(&mut self, idx: u32, dst: ResourceState) -> Option<StateConversion> {
        debug_assert!(!dst.is_unknown(), "UNKNOWN is not a valid destination state");
        self.check_index(idx);

        let count = self.subresource_count as usize;
        self.last.unfold(count);

        let conversion = self.convert_slot(idx, dst);

        self.last.try_fold();
        self.first.try_fold();
        conversion
    }

    fn convert_slot(&mut self, idx: u32, dst: ResourceState) -> Option<StateConversion> {
        let count = self.subresource_count as usize;
        let slot = idx as usize;
        let last = self.last.get(slot);

        if last.is_unknown() {
            self.first.set(slot, dst, count);
            self.last.set(slot, dst, count);
            return None;
        }

        match self.resolve(last, dst) {
            Some(promoted) => {
                self.last.set(slot, promoted, count);
                None
            }
            None => {
                self.last.set(slot, dst, count);
                self.explicit[slot] = true;
                Some(StateConversion::sub(idx, last, dst))
            }
        }
    }
}

// 提交期间的解析
impl StateConverter {
    /// 用提交时资源真实的状态解析首次请求，返回需要放在命令列表之前执行的转换
    ///
    /// 隐式提升的 subresource 会把真实状态并入 `last`，提交时写回的是提升后的组合状态。
    pub fn pre_convert(&mut self, ground_truth: &[ResourceState]) -> Vec<StateConversion> {
        assert_eq!(
            ground_truth.len(),
            self.subresource_count as usize,
            "ground truth does not match the tracked subresource count"
        );

        let count = self.subresource_count as usize;
        let mut conversions = Vec::new();
        for (slot, &truth) in ground_truth.iter().enumerate() {
            let first = self.first.get(slot);
            if first.is_unknown() || truth.is_unknown() {
                continue;
            }
            match self.resolve(truth, first) {
                Some(promoted) => {
                    if !self.explicit[slot] {
                        let last = self.last.get(slot);
                        self.last.set(slot, last | promoted, count);
                    }
                }
                None => conversions.push(StateConversion::sub(slot as u32, truth, first)),
            }
        }

        self.last.try_fold();
        collapse_conversions(conversions, self.subresource_count)
    }

    /// 合并前一个列表（`earlier`）对同一资源的追踪
    ///
    /// `self` 属于后执行的列表。`earlier` 的 `last` 就是 `self` 真实的前置状态，
    /// 用它解析 `self` 的首次请求，得到的转换要放在两个列表之间执行。
    /// 合并后 `self` 代表两个列表连续执行的整体：首次请求来自 `earlier`，最终状态来自 `self`。
    pub fn merge(&mut self, earlier: StateConverter) -> Vec<StateConversion> {
        assert_eq!(
            self.subresource_count, earlier.subresource_count,
            "merging trackers of two different resources"
        );

        let count = self.subresource_count as usize;
        let mut conversions = Vec::new();
        let mut last = Vec::with_capacity(count);
        let mut first = Vec::with_capacity(count);
        let mut explicit = Vec::with_capacity(count);

        for slot in 0..count {
            let (earlier_last, earlier_first) = (earlier.last.get(slot), earlier.first.get(slot));
            let (later_last, later_first) = (self.last.get(slot), self.first.get(slot));

            if earlier_last.is_unknown() {
                // 前一个列表没有用到这个 subresource，首次请求继续等待
                last.push(later_last);
                first.push(later_first);
                explicit.push(self.explicit[slot]);
                continue;
            }

            if later_first.is_unknown() {
                last.push(earlier_last);
                first.push(earlier_first);
                explicit.push(earlier.explicit[slot]);
                continue;
            }

            match self.resolve(earlier_last, later_first) {
                Some(promoted) if !self.explicit[slot] => {
                    // 后一个列表一直停留在隐式提升链上，前一个列表留下的状态仍然有效
                    last.push(later_last | promoted);
                    explicit.push(earlier.explicit[slot]);
                }
                Some(_) => {
                    last.push(later_last);
                    explicit.push(true);
                }
                None => {
                    conversions.push(StateConversion::sub(slot as u32, earlier_last, later_first));
                    last.push(later_last);
                    explicit.push(true);
                }
            }
            first.push(earlier_first);
        }

        self.last = SubresourceStates::from_vec(last);
        self.first = SubresourceStates::from_vec(first);
        self.explicit = explicit;
        collapse_conversions(conversions, self.subresource_count)
    }

    /// 把最终状态写回 ground truth，并重置追踪以便复用
    ///
    /// buffer / simultaneous access 的资源以及 `decay_to_common` 时（copy 队列），
    /// 资源在执行完之后衰减为 COMMON。衰减作用于整个资源，否则只写回被使用过的 subresource。
    pub fn apply_convert(&mut self, ground_truth: &mut [ResourceState], decay_to_common: bool) {
        assert_eq!(
            ground_truth.len(),
            self.subresource_count as usize,
            "ground truth does not match the tracked subresource count"
        );

        if self.is_touched() {
            let decay = decay_to_common || self.is_buffer_or_simultaneous;
            for (slot, truth) in ground_truth.iter_mut().enumerate() {
                let last = self.last.get(slot);
                if decay {
                    *truth = ResourceState::COMMON;
                } else if !last.is_unknown() {
                    *truth = last;
                }
            }
        }

        self.last = SubresourceStates::default();
        self.first = SubresourceStates::default();
        self.explicit.fill(false);
    }
}
