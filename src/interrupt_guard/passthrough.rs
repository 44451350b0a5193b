#[inline(always)]
pub(super) fn get_flag() -> usize {
    0
}

#[inline(always)]
pub(super) fn disable() {}

#[inline(always)]
pub(super) fn set_flag(_flag: usize) {}
