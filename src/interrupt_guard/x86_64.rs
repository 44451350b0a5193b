use x86_64::instructions::interrupts;

#[inline(always)]
pub(super) fn get_flag() -> usize {
    interrupts::are_enabled() as usize
}

#[inline(always)]
pub(super) fn disable() {
    interrupts::disable();
}

#[inline(always)]
pub(super) fn set_flag(flag: usize) {
    if flag == 0 {
        interrupts::disable();
    } else {
        interrupts::enable();
    }
}
