//! # Customization Slots
//!
//! A slot binds one backend instance to a capability for the whole program.
//! Slots are keyed by types:
//!
//! - [`Global`] is the slot every unqualified facade call reads. Its binding is
//!   chosen by Cargo features: the defaults below, or a backend registered with
//!   [`set_atomic_policy!`](crate::set_atomic_policy) /
//!   [`set_critical_section!`](crate::set_critical_section) when the
//!   `custom-atomic` / `custom-critical-section` feature is enabled.
//! - Any other key is a type of the caller's crate, bound with
//!   [`atomic_slot!`](crate::atomic_slot) or
//!   [`critical_section_slot!`](crate::critical_section_slot).
//!
//! | Capability       | Feature                   | Global binding                |
//! | ---------------- | ------------------------- | ----------------------------- |
//! | atomic           | (none)                    | [`StandardAtomic`]            |
//! | atomic           | `custom-atomic`           | `set_atomic_policy!`          |
//! | critical section | `std`                     | `StandardCriticalSection`     |
//! | critical section | (none, freestanding)      | `MissingCriticalSection`      |
//! | critical section | `custom-critical-section` | `set_critical_section!`       |
//!
//! A key can be bound once. A second binding of the same key is a coherence
//! error for keyed slots and a duplicate symbol at link time for the global
//! slot; a `custom-*` feature without a registered backend is an undefined
//! symbol at link time. Slot instances live in `static`s and are never
//! dropped.
//!
//! [`StandardAtomic`]: crate::atomic::StandardAtomic

use crate::contract::{CriticalSection, LoadStore};

#[cfg(feature = "custom-critical-section")]
use crate::contract::{BasicCriticalSection, DomainId};

#[cfg(feature = "custom-atomic")]
use crate::contract::{AddSub, AtomicPolicy, Bitwise, Exchange, Repr, Width};

#[cfg(feature = "custom-atomic")]
use core::sync::atomic::Ordering;

/// Key of the slot shared by all unqualified facade calls.
#[derive(Debug, Clone, Copy)]
pub struct Global;

/// A key with an atomic policy bound to it.
#[diagnostic::on_unimplemented(
    message = "no atomic policy is bound to `{Self}`",
    note = "bind one with `awkernel_conc::atomic_slot!({Self} => Policy = INIT)`"
)]
pub trait AtomicSlot: 'static {
    type Policy: LoadStore + Sync + 'static;

    fn policy() -> &'static Self::Policy;
}

/// A key with a critical-section policy bound to it.
#[diagnostic::on_unimplemented(
    message = "no critical-section policy is bound to `{Self}`",
    note = "bind one with `awkernel_conc::critical_section_slot!({Self} => Policy = INIT)`"
)]
pub trait CriticalSectionSlot: 'static {
    type Policy: CriticalSection + Sync + 'static;

    fn policy() -> &'static Self::Policy;
}

/// The atomic policy bound to `K`.
#[inline(always)]
pub fn atomic_policy<K: AtomicSlot>() -> &'static K::Policy {
    K::policy()
}

/// The critical-section policy bound to `K`.
#[inline(always)]
pub fn critical_section_policy<K: CriticalSectionSlot>() -> &'static K::Policy {
    K::policy()
}

#[cfg(not(feature = "custom-atomic"))]
type GlobalAtomic = crate::atomic::StandardAtomic;

#[cfg(feature = "custom-atomic")]
type GlobalAtomic = InjectedAtomic;

#[cfg(feature = "custom-critical-section")]
type GlobalCriticalSection = InjectedCriticalSection;

#[cfg(all(not(feature = "custom-critical-section"), feature = "std"))]
type GlobalCriticalSection = crate::critical_section::StandardCriticalSection;

#[cfg(all(not(feature = "custom-critical-section"), not(feature = "std")))]
type GlobalCriticalSection = crate::critical_section::MissingCriticalSection;

static GLOBAL_ATOMIC: GlobalAtomic = GlobalAtomic::new();
static GLOBAL_CRITICAL_SECTION: GlobalCriticalSection = GlobalCriticalSection::new();

impl AtomicSlot for Global {
    type Policy = GlobalAtomic;

    #[inline(always)]
    fn policy() -> &'static GlobalAtomic {
        &GLOBAL_ATOMIC
    }
}

impl CriticalSectionSlot for Global {
    type Policy = GlobalCriticalSection;

    #[inline(always)]
    fn policy() -> &'static GlobalCriticalSection {
        &GLOBAL_CRITICAL_SECTION
    }
}

/// Bind an atomic policy to a key type of the calling crate.
///
/// ```
/// use awkernel_conc::atomic::{Atomic, Keyed, StandardAtomic};
///
/// struct Dma;
/// awkernel_conc::atomic_slot!(Dma => StandardAtomic = StandardAtomic::new());
///
/// let word = Atomic::new(1u32);
/// assert_eq!(Keyed::<Dma>::exchange(&word, 2), 1);
/// ```
#[macro_export]
macro_rules! atomic_slot {
    ($key:ty => $policy:ty = $init:expr) => {
        impl $crate::slot::AtomicSlot for $key {
            type Policy = $policy;

            #[inline(always)]
            fn policy() -> &'static $policy {
                static POLICY: $policy = $init;
                &POLICY
            }
        }
    };
}

/// Bind a critical-section policy to a key type of the calling crate.
#[macro_export]
macro_rules! critical_section_slot {
    ($key:ty => $policy:ty = $init:expr) => {
        impl $crate::slot::CriticalSectionSlot for $key {
            type Policy = $policy;

            #[inline(always)]
            fn policy() -> &'static $policy {
                static POLICY: $policy = $init;
                &POLICY
            }
        }
    };
}

/// Register the atomic policy of the global slot.
///
/// Requires the `custom-atomic` feature and must appear exactly once in the
/// final program.
///
/// ```ignore
/// awkernel_conc::set_atomic_policy!(MyAtomics = MyAtomics::new());
/// ```
#[macro_export]
macro_rules! set_atomic_policy {
    ($policy:ty = $init:expr) => {
        const _: () = {
            static POLICY: $policy = $init;

            #[no_mangle]
            unsafe fn _awkernel_conc_atomic_v1(
                op: $crate::slot::RawOp,
                width: $crate::contract::Width,
                place: *mut (),
                operand: u64,
                order: ::core::sync::atomic::Ordering,
            ) -> u64 {
                unsafe { $crate::slot::dispatch_atomic(&POLICY, op, width, place, operand, order) }
            }
        };
    };
}

/// Register the critical-section policy of the global slot.
///
/// Requires the `custom-critical-section` feature and must appear exactly once
/// in the final program. On freestanding targets this is the only way to make
/// the unqualified critical-section facade usable.
///
/// ```ignore
/// awkernel_conc::set_critical_section!(SpinCriticalSection = SpinCriticalSection::new());
/// ```
#[macro_export]
macro_rules! set_critical_section {
    ($policy:ty = $init:expr) => {
        const _: () = {
            static POLICY: $policy = $init;

            #[no_mangle]
            fn _awkernel_conc_critical_section_v1(
                domain: $crate::contract::DomainId,
                action: &mut dyn FnMut(),
                predicate: Option<&mut dyn FnMut() -> bool>,
            ) {
                $crate::slot::dispatch_critical_section(&POLICY, domain, action, predicate)
            }
        };
    };
}

/// Operation code crossing the link-time boundary of the global atomic slot.
#[doc(hidden)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawOp {
    Load,
    Store,
    Exchange,
    FetchAdd,
    FetchSub,
    FetchAnd,
    FetchOr,
    FetchXor,
}

#[cfg(feature = "custom-atomic")]
extern "Rust" {
    fn _awkernel_conc_atomic_v1(
        op: RawOp,
        width: Width,
        place: *mut (),
        operand: u64,
        order: Ordering,
    ) -> u64;
}

#[cfg(feature = "custom-critical-section")]
extern "Rust" {
    fn _awkernel_conc_critical_section_v1(
        domain: DomainId,
        action: &mut dyn FnMut(),
        predicate: Option<&mut dyn FnMut() -> bool>,
    );
}

/// Decode a raw atomic operation and run it on `policy`.
///
/// # Safety
///
/// `place` must point to a valid, suitably aligned representation of `width`.
#[cfg(feature = "custom-atomic")]
#[doc(hidden)]
pub unsafe fn dispatch_atomic<P: AtomicPolicy>(
    policy: &P,
    op: RawOp,
    width: Width,
    place: *mut (),
    operand: u64,
    order: Ordering,
) -> u64 {
    unsafe {
        match width {
            #[cfg(target_has_atomic = "8")]
            Width::W8 => dispatch_repr::<P, u8>(policy, op, place.cast(), operand, order),
            #[cfg(target_has_atomic = "16")]
            Width::W16 => dispatch_repr::<P, u16>(policy, op, place.cast(), operand, order),
            #[cfg(target_has_atomic = "32")]
            Width::W32 => dispatch_repr::<P, u32>(policy, op, place.cast(), operand, order),
            #[cfg(target_has_atomic = "64")]
            Width::W64 => dispatch_repr::<P, u64>(policy, op, place.cast(), operand, order),
            #[allow(unreachable_patterns)]
            _ => unreachable!("no atomic representation of width {:?}", width),
        }
    }
}

#[cfg(feature = "custom-atomic")]
#[inline(always)]
unsafe fn dispatch_repr<P: AtomicPolicy, R: Repr>(
    policy: &P,
    op: RawOp,
    place: *mut R,
    operand: u64,
    order: Ordering,
) -> u64 {
    let operand = R::from_bits(operand);

    let prior = unsafe {
        match op {
            RawOp::Load => policy.load_with(place, order),
            RawOp::Store => {
                policy.store_with(place, operand, order);
                operand
            }
            RawOp::Exchange => policy.exchange_with(place, operand, order),
            RawOp::FetchAdd => policy.fetch_add_with(place, operand, order),
            RawOp::FetchSub => policy.fetch_sub_with(place, operand, order),
            RawOp::FetchAnd => policy.fetch_and_with(place, operand, order),
            RawOp::FetchOr => policy.fetch_or_with(place, operand, order),
            RawOp::FetchXor => policy.fetch_xor_with(place, operand, order),
        }
    };

    prior.to_bits()
}

/// Run a type-erased critical section on `policy`.
#[cfg(feature = "custom-critical-section")]
#[doc(hidden)]
pub fn dispatch_critical_section<P: CriticalSection>(
    policy: &P,
    domain: DomainId,
    action: &mut dyn FnMut(),
    predicate: Option<&mut dyn FnMut() -> bool>,
) {
    match predicate {
        Some(predicate) => policy.run_exclusive_when(domain, action, predicate),
        None => policy.run_exclusive(domain, action),
    }
}

/// Global atomic policy forwarding to the backend registered with
/// [`set_atomic_policy!`](crate::set_atomic_policy).
#[cfg(feature = "custom-atomic")]
pub struct InjectedAtomic;

#[cfg(feature = "custom-atomic")]
impl InjectedAtomic {
    const fn new() -> Self {
        Self
    }

    #[inline(always)]
    unsafe fn raw<R: Repr>(op: RawOp, place: *mut R, operand: R, order: Ordering) -> R {
        R::from_bits(unsafe {
            _awkernel_conc_atomic_v1(op, R::WIDTH, place.cast(), operand.to_bits(), order)
        })
    }
}

#[cfg(feature = "custom-atomic")]
unsafe impl LoadStore for InjectedAtomic {
    unsafe fn load_with<R: Repr>(&self, src: *mut R, order: Ordering) -> R {
        unsafe { Self::raw(RawOp::Load, src, R::from_bits(0), order) }
    }

    unsafe fn store_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) {
        unsafe { Self::raw(RawOp::Store, dst, value, order) };
    }
}

#[cfg(feature = "custom-atomic")]
unsafe impl Exchange for InjectedAtomic {
    unsafe fn exchange_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) -> R {
        unsafe { Self::raw(RawOp::Exchange, dst, value, order) }
    }
}

#[cfg(feature = "custom-atomic")]
unsafe impl AddSub for InjectedAtomic {
    unsafe fn fetch_add_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) -> R {
        unsafe { Self::raw(RawOp::FetchAdd, dst, value, order) }
    }

    unsafe fn fetch_sub_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) -> R {
        unsafe { Self::raw(RawOp::FetchSub, dst, value, order) }
    }
}

#[cfg(feature = "custom-atomic")]
unsafe impl Bitwise for InjectedAtomic {
    unsafe fn fetch_and_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) -> R {
        unsafe { Self::raw(RawOp::FetchAnd, dst, value, order) }
    }

    unsafe fn fetch_or_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) -> R {
        unsafe { Self::raw(RawOp::FetchOr, dst, value, order) }
    }

    unsafe fn fetch_xor_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) -> R {
        unsafe { Self::raw(RawOp::FetchXor, dst, value, order) }
    }
}

/// Global critical-section policy forwarding to the backend registered with
/// [`set_critical_section!`](crate::set_critical_section).
#[cfg(feature = "custom-critical-section")]
pub struct InjectedCriticalSection;

#[cfg(feature = "custom-critical-section")]
impl InjectedCriticalSection {
    const fn new() -> Self {
        Self
    }

    fn erased<F, R>(
        domain: DomainId,
        action: F,
        predicate: Option<&mut dyn FnMut() -> bool>,
    ) -> R
    where
        F: FnOnce() -> R,
    {
        let mut action = Some(action);
        let mut result = None;

        {
            let mut run = || {
                if let Some(action) = action.take() {
                    result = Some(action());
                }
            };
            unsafe { _awkernel_conc_critical_section_v1(domain, &mut run, predicate) };
        }

        match result {
            Some(result) => result,
            None => unreachable!(
                "injected critical-section policy returned without running the action of {}",
                domain.name()
            ),
        }
    }
}

#[cfg(feature = "custom-critical-section")]
impl BasicCriticalSection for InjectedCriticalSection {
    fn run_exclusive<F, R>(&self, domain: DomainId, action: F) -> R
    where
        F: FnOnce() -> R,
    {
        Self::erased(domain, action, None)
    }
}

#[cfg(feature = "custom-critical-section")]
impl CriticalSection for InjectedCriticalSection {
    fn run_exclusive_when<F, P, R>(&self, domain: DomainId, action: F, mut predicate: P) -> R
    where
        F: FnOnce() -> R,
        P: FnMut() -> bool,
    {
        Self::erased(domain, action, Some(&mut predicate))
    }
}
