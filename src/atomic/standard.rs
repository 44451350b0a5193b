use core::sync::atomic::Ordering;

use crate::contract::{AddSub, Bitwise, Exchange, LoadStore, Repr};

/// Atomic policy backed by the compiler intrinsics.
///
/// This is the default binding of the global slot on every target, hosted or
/// not. Orderings are handed to `core::sync::atomic` unchanged, so an ordering
/// that is invalid for an operation panics there.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardAtomic;

impl StandardAtomic {
    pub const fn new() -> Self {
        Self
    }
}

unsafe impl LoadStore for StandardAtomic {
    #[inline(always)]
    unsafe fn load_with<R: Repr>(&self, src: *mut R, order: Ordering) -> R {
        unsafe { R::atomic_load(src, order) }
    }

    #[inline(always)]
    unsafe fn store_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) {
        unsafe { R::atomic_store(dst, value, order) }
    }
}

unsafe impl Exchange for StandardAtomic {
    #[inline(always)]
    unsafe fn exchange_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) -> R {
        unsafe { R::atomic_swap(dst, value, order) }
    }
}

unsafe impl AddSub for StandardAtomic {
    #[inline(always)]
    unsafe fn fetch_add_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) -> R {
        unsafe { R::atomic_fetch_add(dst, value, order) }
    }

    #[inline(always)]
    unsafe fn fetch_sub_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) -> R {
        unsafe { R::atomic_fetch_sub(dst, value, order) }
    }
}

unsafe impl Bitwise for StandardAtomic {
    #[inline(always)]
    unsafe fn fetch_and_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) -> R {
        unsafe { R::atomic_fetch_and(dst, value, order) }
    }

    #[inline(always)]
    unsafe fn fetch_or_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) -> R {
        unsafe { R::atomic_fetch_or(dst, value, order) }
    }

    #[inline(always)]
    unsafe fn fetch_xor_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) -> R {
        unsafe { R::atomic_fetch_xor(dst, value, order) }
    }
}
