use core::arch::asm;

/// IRQ mask bit of DAIF.
const DAIF_I: usize = 1 << 7;

#[inline(always)]
pub(super) fn get_flag() -> usize {
    let daif: usize;
    unsafe { asm!("mrs {}, daif", out(reg) daif) };
    daif & DAIF_I
}

#[inline(always)]
pub(super) fn disable() {
    unsafe { asm!("msr daifset, #0b0010") };
}

#[inline(always)]
pub(super) fn set_flag(flag: usize) {
    if flag & DAIF_I == 0 {
        unsafe { asm!("msr daifclr, #0b0010") };
    } else {
        disable();
    }
}
