//! # Capability Contracts
//!
//! The traits in this module are the operation sets a backend has to provide
//! before it can be bound to a customization slot. They are checked where the
//! facade uses them: a slot only has to name a [`LoadStore`] policy, and
//! `exchange` additionally asks for [`Exchange`], the `fetch_*` arithmetic for
//! [`AddSub`] and the bitwise operations for [`Bitwise`].
//!
//! No marker or base type is involved. [`AtomicPolicy`] is implemented for
//! every type that implements the three composite contracts, and
//! [`CriticalSection`] only asks for the two `run_exclusive` shapes.
//!
//! ```
//! use awkernel_conc::atomic::StandardAtomic;
//! use awkernel_conc::contract::AtomicPolicy;
//!
//! fn full<P: AtomicPolicy>() {}
//! full::<StandardAtomic>();
//! ```

use core::{
    any::TypeId,
    sync::atomic::{self, Ordering},
};

mod sealed {
    pub trait Sealed {}
}

/// Operand width of a physical representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    W8,
    W16,
    W32,
    W64,
}

/// A physical representation the hardware can access atomically.
///
/// Every representation carries the compiler intrinsics for its width so that
/// a backend can fall back to them for the operations it does not customize.
///
/// # Safety
///
/// All the `atomic_*` functions require `ptr` to be valid for reads and writes
/// and aligned to `align_of::<Self::Atomic>()`. The location must not be
/// accessed non-atomically while these functions may run.
pub trait Repr: sealed::Sealed + Copy + Eq + Send + Sync + 'static {
    /// The `core::sync::atomic` type of the same width.
    type Atomic: Send + Sync;

    const WIDTH: Width;

    fn to_bits(self) -> u64;
    fn from_bits(bits: u64) -> Self;

    unsafe fn atomic_load(ptr: *mut Self, order: Ordering) -> Self;
    unsafe fn atomic_store(ptr: *mut Self, value: Self, order: Ordering);
    unsafe fn atomic_swap(ptr: *mut Self, value: Self, order: Ordering) -> Self;
    unsafe fn atomic_fetch_add(ptr: *mut Self, value: Self, order: Ordering) -> Self;
    unsafe fn atomic_fetch_sub(ptr: *mut Self, value: Self, order: Ordering) -> Self;
    unsafe fn atomic_fetch_and(ptr: *mut Self, value: Self, order: Ordering) -> Self;
    unsafe fn atomic_fetch_or(ptr: *mut Self, value: Self, order: Ordering) -> Self;
    unsafe fn atomic_fetch_xor(ptr: *mut Self, value: Self, order: Ordering) -> Self;
}

macro_rules! impl_repr {
    ($($cfg:literal => $t:ty, $atomic:ty, $width:expr;)*) => {
        $(
            #[cfg(target_has_atomic = $cfg)]
            impl sealed::Sealed for $t {}

            #[cfg(target_has_atomic = $cfg)]
            impl Repr for $t {
                type Atomic = $atomic;

                const WIDTH: Width = $width;

                #[inline(always)]
                fn to_bits(self) -> u64 {
                    self as u64
                }

                #[inline(always)]
                fn from_bits(bits: u64) -> Self {
                    bits as $t
                }

                #[inline(always)]
                unsafe fn atomic_load(ptr: *mut Self, order: Ordering) -> Self {
                    unsafe { <$atomic>::from_ptr(ptr) }.load(order)
                }

                #[inline(always)]
                unsafe fn atomic_store(ptr: *mut Self, value: Self, order: Ordering) {
                    unsafe { <$atomic>::from_ptr(ptr) }.store(value, order)
                }

                #[inline(always)]
                unsafe fn atomic_swap(ptr: *mut Self, value: Self, order: Ordering) -> Self {
                    unsafe { <$atomic>::from_ptr(ptr) }.swap(value, order)
                }

                #[inline(always)]
                unsafe fn atomic_fetch_add(ptr: *mut Self, value: Self, order: Ordering) -> Self {
                    unsafe { <$atomic>::from_ptr(ptr) }.fetch_add(value, order)
                }

                #[inline(always)]
                unsafe fn atomic_fetch_sub(ptr: *mut Self, value: Self, order: Ordering) -> Self {
                    unsafe { <$atomic>::from_ptr(ptr) }.fetch_sub(value, order)
                }

                #[inline(always)]
                unsafe fn atomic_fetch_and(ptr: *mut Self, value: Self, order: Ordering) -> Self {
                    unsafe { <$atomic>::from_ptr(ptr) }.fetch_and(value, order)
                }

                #[inline(always)]
                unsafe fn atomic_fetch_or(ptr: *mut Self, value: Self, order: Ordering) -> Self {
                    unsafe { <$atomic>::from_ptr(ptr) }.fetch_or(value, order)
                }

                #[inline(always)]
                unsafe fn atomic_fetch_xor(ptr: *mut Self, value: Self, order: Ordering) -> Self {
                    unsafe { <$atomic>::from_ptr(ptr) }.fetch_xor(value, order)
                }
            }
        )*
    };
}

impl_repr! {
    "8" => u8, atomic::AtomicU8, Width::W8;
    "8" => i8, atomic::AtomicI8, Width::W8;
    "16" => u16, atomic::AtomicU16, Width::W16;
    "16" => i16, atomic::AtomicI16, Width::W16;
    "32" => u32, atomic::AtomicU32, Width::W32;
    "32" => i32, atomic::AtomicI32, Width::W32;
    "64" => u64, atomic::AtomicU64, Width::W64;
    "64" => i64, atomic::AtomicI64, Width::W64;
    "ptr" => usize, atomic::AtomicUsize, POINTER_WIDTH;
    "ptr" => isize, atomic::AtomicIsize, POINTER_WIDTH;
}

#[cfg(target_pointer_width = "16")]
const POINTER_WIDTH: Width = Width::W16;

#[cfg(target_pointer_width = "32")]
const POINTER_WIDTH: Width = Width::W32;

#[cfg(target_pointer_width = "64")]
const POINTER_WIDTH: Width = Width::W64;

/// Atomic load and store.
///
/// The `*_with` forms take the memory ordering; the short forms use
/// [`Ordering::SeqCst`].
///
/// # Safety
///
/// Implementations must perform each operation atomically with respect to
/// every other operation of the same policy on the same location.
/// Callers of the methods must pass a pointer that is valid and aligned to
/// `align_of::<R::Atomic>()`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an atomic load/store policy",
    label = "needs `load_with` and `store_with`",
    note = "implement `awkernel_conc::contract::LoadStore` for `{Self}`"
)]
pub unsafe trait LoadStore {
    unsafe fn load_with<R: Repr>(&self, src: *mut R, order: Ordering) -> R;
    unsafe fn store_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering);

    #[inline(always)]
    unsafe fn load<R: Repr>(&self, src: *mut R) -> R {
        unsafe { self.load_with(src, Ordering::SeqCst) }
    }

    #[inline(always)]
    unsafe fn store<R: Repr>(&self, dst: *mut R, value: R) {
        unsafe { self.store_with(dst, value, Ordering::SeqCst) }
    }
}

/// Atomic exchange. Returns the value that was stored over.
///
/// # Safety
///
/// Same requirements as [`LoadStore`].
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an atomic exchange policy",
    label = "needs `exchange_with` on top of `LoadStore`"
)]
pub unsafe trait Exchange: LoadStore {
    unsafe fn exchange_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) -> R;

    #[inline(always)]
    unsafe fn exchange<R: Repr>(&self, dst: *mut R, value: R) -> R {
        unsafe { self.exchange_with(dst, value, Ordering::SeqCst) }
    }
}

/// Wrapping atomic addition and subtraction. Both return the previous value.
///
/// # Safety
///
/// Same requirements as [`LoadStore`].
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an atomic add/sub policy",
    label = "needs `fetch_add_with` and `fetch_sub_with` on top of `LoadStore`"
)]
pub unsafe trait AddSub: LoadStore {
    unsafe fn fetch_add_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) -> R;
    unsafe fn fetch_sub_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) -> R;

    #[inline(always)]
    unsafe fn fetch_add<R: Repr>(&self, dst: *mut R, value: R) -> R {
        unsafe { self.fetch_add_with(dst, value, Ordering::SeqCst) }
    }

    #[inline(always)]
    unsafe fn fetch_sub<R: Repr>(&self, dst: *mut R, value: R) -> R {
        unsafe { self.fetch_sub_with(dst, value, Ordering::SeqCst) }
    }
}

/// Atomic bitwise and/or/xor. All return the previous value.
///
/// # Safety
///
/// Same requirements as [`LoadStore`].
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an atomic bitwise policy",
    label = "needs `fetch_and_with`, `fetch_or_with` and `fetch_xor_with` on top of `LoadStore`"
)]
pub unsafe trait Bitwise: LoadStore {
    unsafe fn fetch_and_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) -> R;
    unsafe fn fetch_or_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) -> R;
    unsafe fn fetch_xor_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) -> R;

    #[inline(always)]
    unsafe fn fetch_and<R: Repr>(&self, dst: *mut R, value: R) -> R {
        unsafe { self.fetch_and_with(dst, value, Ordering::SeqCst) }
    }

    #[inline(always)]
    unsafe fn fetch_or<R: Repr>(&self, dst: *mut R, value: R) -> R {
        unsafe { self.fetch_or_with(dst, value, Ordering::SeqCst) }
    }

    #[inline(always)]
    unsafe fn fetch_xor<R: Repr>(&self, dst: *mut R, value: R) -> R {
        unsafe { self.fetch_xor_with(dst, value, Ordering::SeqCst) }
    }
}

/// The full atomic contract.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a full atomic policy",
    label = "needs `Exchange`, `AddSub` and `Bitwise`"
)]
pub trait AtomicPolicy: Exchange + AddSub + Bitwise {}

impl<P: Exchange + AddSub + Bitwise + ?Sized> AtomicPolicy for P {}

/// Identity of a critical-section domain.
///
/// Domains are types. Backends receive the identity as a value so that they
/// can key their per-domain locks on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainId {
    id: TypeId,
    name: &'static str,
}

impl DomainId {
    #[inline(always)]
    pub fn of<D: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<D>(),
            name: core::any::type_name::<D>(),
        }
    }

    /// Type name of the domain, for diagnostics only.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Critical sections without a predicate.
///
/// This is the narrower shape. It is not enough to be bound to a slot, which
/// requires [`CriticalSection`].
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a critical-section policy",
    label = "needs `run_exclusive`"
)]
pub trait BasicCriticalSection {
    /// Run `action` while holding the lock of `domain` and return its result.
    fn run_exclusive<F, R>(&self, domain: DomainId, action: F) -> R
    where
        F: FnOnce() -> R;
}

/// Critical sections with an optional retry predicate.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a predicate-capable critical-section policy",
    label = "needs `run_exclusive_when` on top of `BasicCriticalSection`"
)]
pub trait CriticalSection: BasicCriticalSection {
    /// Take the lock of `domain` until `predicate` holds under it, then run
    /// `action` under the same lock.
    fn run_exclusive_when<F, P, R>(&self, domain: DomainId, action: F, predicate: P) -> R
    where
        F: FnOnce() -> R,
        P: FnMut() -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Outer;
    struct Inner;

    #[test]
    fn domain_ids_follow_types() {
        assert_eq!(DomainId::of::<Outer>(), DomainId::of::<Outer>());
        assert_ne!(DomainId::of::<Outer>(), DomainId::of::<Inner>());
        assert!(DomainId::of::<Inner>().name().ends_with("Inner"));
    }

    #[test]
    fn signed_bits_truncate_back() {
        assert_eq!(i8::from_bits((-1i8).to_bits()), -1);
        assert_eq!(u8::from_bits(0x1ff), 0xff);
        assert_eq!(<u16 as Repr>::WIDTH, Width::W16);
    }
}
