use core::arch::asm;

/// `mstatus.MIE`
const MIE: usize = 0x08;

#[inline(always)]
pub(super) fn get_flag() -> usize {
    let x: usize;
    unsafe { asm!("csrr {}, mstatus", out(reg) x) };
    x & MIE
}

#[inline(always)]
pub(super) fn disable() {
    let _x: usize;
    unsafe { asm!("csrrc {}, mstatus, 0x08", out(reg) _x) };
}

#[inline(always)]
fn enable() {
    let _x: usize;
    unsafe { asm!("csrrs {}, mstatus, 0x08", out(reg) _x) };
}

#[inline(always)]
pub(super) fn set_flag(flag: usize) {
    if flag & MIE > 0 {
        enable();
    } else {
        disable();
    }
}
