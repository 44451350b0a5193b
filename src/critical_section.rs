//! # Critical-Section Facade
//!
//! [`run_exclusive`] runs a closure while holding the lock of a domain. A
//! domain is any `'static` type; two calls naming the same domain exclude each
//! other, calls naming different domains never do. The [`run_exclusive!`]
//! macro gives every call site a domain of its own.
//!
//! Which backend provides the locks is decided by the [`slot`](crate::slot)
//! binding:
//!
//! - with the `std` feature the global slot holds a [`StandardCriticalSection`],
//!   one `parking_lot` mutex per domain;
//! - without it the global slot holds a [`MissingCriticalSection`] and any
//!   instantiated call fails to build until a backend is registered with
//!   [`set_critical_section!`](crate::set_critical_section).
//!
//! Locks are not reentrant. Entering a domain again from inside a section of
//! the same domain on the same thread deadlocks; nothing detects it.
//!
//! The example binds a backend to its own key; without the `_in` suffix or the
//! `in Key =>` prefix the same calls go to the global slot.
//!
//! ```
//! use awkernel_conc::{
//!     critical_section::{self, SpinCriticalSection},
//!     run_exclusive,
//! };
//!
//! struct Board;
//! awkernel_conc::critical_section_slot!(
//!     Board => SpinCriticalSection = SpinCriticalSection::new()
//! );
//!
//! struct Counter;
//!
//! let mut count = 0;
//! critical_section::run_exclusive_in::<Board, Counter, _, _>(|| count += 1);
//!
//! // Nesting is fine as long as the domains differ.
//! let inner = run_exclusive!(in Board => || run_exclusive!(in Board => || 1));
//! assert_eq!((count, inner), (1, 1));
//! ```

use crate::{
    contract::{BasicCriticalSection, CriticalSection, DomainId},
    slot::{CriticalSectionSlot, Global},
};

mod missing;

#[cfg(not(loom))]
mod spin;

#[cfg(feature = "std")]
mod standard;

#[cfg(feature = "stress")]
mod stress;

pub use missing::MissingCriticalSection;

#[cfg(not(loom))]
pub use spin::SpinCriticalSection;

#[cfg(feature = "std")]
pub use standard::StandardCriticalSection;

#[cfg(feature = "stress")]
pub use stress::StressCriticalSection;

/// Run `action` exclusively within domain `D` of the global slot.
#[inline(always)]
pub fn run_exclusive<D, F, R>(action: F) -> R
where
    D: ?Sized + 'static,
    F: FnOnce() -> R,
{
    run_exclusive_in::<Global, D, F, R>(action)
}

/// Retry under the lock of domain `D` until `predicate` holds, then run
/// `action` without releasing it.
///
/// There is no wait queue: the lock is released and taken again between two
/// evaluations of `predicate`, and the loop never gives up.
#[inline(always)]
pub fn run_exclusive_when<D, F, P, R>(action: F, predicate: P) -> R
where
    D: ?Sized + 'static,
    F: FnOnce() -> R,
    P: FnMut() -> bool,
{
    run_exclusive_when_in::<Global, D, F, P, R>(action, predicate)
}

/// [`run_exclusive`] on the backend bound to key `K`.
#[inline(always)]
pub fn run_exclusive_in<K, D, F, R>(action: F) -> R
where
    K: CriticalSectionSlot,
    D: ?Sized + 'static,
    F: FnOnce() -> R,
{
    K::policy().run_exclusive(DomainId::of::<D>(), action)
}

/// [`run_exclusive_when`] on the backend bound to key `K`.
#[inline(always)]
pub fn run_exclusive_when_in<K, D, F, P, R>(action: F, predicate: P) -> R
where
    K: CriticalSectionSlot,
    D: ?Sized + 'static,
    F: FnOnce() -> R,
    P: FnMut() -> bool,
{
    K::policy().run_exclusive_when(DomainId::of::<D>(), action, predicate)
}

/// Run a closure in a critical section whose domain belongs to this call site.
///
/// Without `in Key =>` the global slot is used: `run_exclusive!(|| work())`.
///
/// ```
/// use awkernel_conc::{critical_section::SpinCriticalSection, run_exclusive};
///
/// struct Board;
/// awkernel_conc::critical_section_slot!(
///     Board => SpinCriticalSection = SpinCriticalSection::new()
/// );
///
/// let mut polls = 0;
/// let value = run_exclusive!(in Board => || 17, || {
///     polls += 1;
///     polls == 2
/// });
/// assert_eq!((value, polls), (17, 2));
/// ```
#[macro_export]
macro_rules! run_exclusive {
    (in $key:ty => $action:expr, $predicate:expr $(,)?) => {
        match ($action, $predicate) {
            (action, predicate) => {
                enum CallSite {}
                $crate::critical_section::run_exclusive_when_in::<$key, CallSite, _, _, _>(
                    action, predicate,
                )
            }
        }
    };
    (in $key:ty => $action:expr $(,)?) => {
        match $action {
            action => {
                enum CallSite {}
                $crate::critical_section::run_exclusive_in::<$key, CallSite, _, _>(action)
            }
        }
    };
    ($action:expr, $predicate:expr $(,)?) => {
        match ($action, $predicate) {
            (action, predicate) => {
                enum CallSite {}
                $crate::critical_section::run_exclusive_when::<CallSite, _, _, _>(action, predicate)
            }
        }
    };
    ($action:expr $(,)?) => {
        match $action {
            action => {
                enum CallSite {}
                $crate::critical_section::run_exclusive::<CallSite, _, _>(action)
            }
        }
    };
}
