//! # Atomic Facade
//!
//! Free functions in this module forward to the policy bound to the global
//! slot. [`Keyed`] does the same for a policy bound to a caller-chosen key.
//!
//! Every logical value type is stored through its [`AtomicType`] mapping: the
//! physical representation the policy actually operates on and an extra
//! alignment requirement. Both are resolved at compile time. [`Atomic`] is the
//! storage cell that satisfies them.
//!
//! The free functions and the [`Keyed`] methods take the same arguments:
//!
//! ```
//! use awkernel_conc::atomic::{Atomic, Keyed, StandardAtomic};
//! use core::sync::atomic::Ordering;
//!
//! struct Counters;
//! awkernel_conc::atomic_slot!(Counters => StandardAtomic = StandardAtomic::new());
//!
//! let hits = Atomic::new(17u32);
//! assert_eq!(Keyed::<Counters>::fetch_add(&hits, 1), 17);
//! Keyed::<Counters>::store_with(&hits, 1337, Ordering::Release);
//! assert_eq!(Keyed::<Counters>::load_with(&hits, Ordering::Acquire), 1337);
//! ```

use core::{cell::UnsafeCell, marker::PhantomData, sync::atomic::Ordering};

use crate::{
    contract::{AddSub, Bitwise, Exchange, LoadStore, Repr},
    slot::{AtomicSlot, Global},
};

mod standard;

pub use standard::StandardAtomic;

/// Maps a logical value type to its physical representation.
///
/// The representation decides the operand width the policy sees; `Align`
/// forces a minimum alignment on [`Atomic`] storage on top of the natural
/// alignment of the representation. For example, a target that can only do
/// 32-bit atomics maps a flag onto `u32`:
///
/// ```
/// use awkernel_conc::atomic::{alignment_of, AtomicType, Natural};
///
/// #[derive(Clone, Copy)]
/// struct Flag(bool);
///
/// impl AtomicType for Flag {
///     type Repr = u32;
///     type Align = Natural;
///
///     fn into_repr(self) -> u32 {
///         self.0 as u32
///     }
///
///     fn from_repr(repr: u32) -> Self {
///         Flag(repr != 0)
///     }
/// }
///
/// assert_eq!(alignment_of::<Flag>(), core::mem::align_of::<u32>());
/// ```
pub trait AtomicType: Copy + Send + 'static {
    type Repr: Repr;

    /// Zero-sized alignment marker such as [`Natural`] or [`Align4`].
    type Align: Copy + Send + Sync + 'static;

    fn into_repr(self) -> Self::Repr;
    fn from_repr(repr: Self::Repr) -> Self;
}

/// No alignment beyond the natural atomic alignment of the representation.
#[derive(Debug, Clone, Copy)]
pub struct Natural;

#[derive(Debug, Clone, Copy)]
#[repr(align(2))]
pub struct Align2;

#[derive(Debug, Clone, Copy)]
#[repr(align(4))]
pub struct Align4;

#[derive(Debug, Clone, Copy)]
#[repr(align(8))]
pub struct Align8;

#[derive(Debug, Clone, Copy)]
#[repr(align(16))]
pub struct Align16;

/// Logical types whose `fetch_add`/`fetch_sub` is wrapping arithmetic on the
/// representation.
///
/// `bool` does not implement it: adding `true` to `true` would store `2`.
pub trait AtomicArithmetic: AtomicType {}

/// Representation of `bool`. `u32` with the `atomic-bool-u32` feature, for
/// targets that only have 32-bit atomics.
#[cfg(not(feature = "atomic-bool-u32"))]
pub type BoolRepr = u8;

#[cfg(feature = "atomic-bool-u32")]
pub type BoolRepr = u32;

/// Forced alignment of `u8` and `i8`. [`Align4`] with the
/// `atomic-byte-align4` feature.
#[cfg(not(feature = "atomic-byte-align4"))]
pub type ByteAlign = Natural;

#[cfg(feature = "atomic-byte-align4")]
pub type ByteAlign = Align4;

macro_rules! impl_identity {
    ($($cfg:literal => $t:ty, $align:ty;)*) => {
        $(
            #[cfg(target_has_atomic = $cfg)]
            impl AtomicType for $t {
                type Repr = $t;
                type Align = $align;

                #[inline(always)]
                fn into_repr(self) -> Self {
                    self
                }

                #[inline(always)]
                fn from_repr(repr: Self) -> Self {
                    repr
                }
            }

            #[cfg(target_has_atomic = $cfg)]
            impl AtomicArithmetic for $t {}
        )*
    };
}

impl_identity! {
    "8" => u8, ByteAlign;
    "8" => i8, ByteAlign;
    "16" => u16, Natural;
    "16" => i16, Natural;
    "32" => u32, Natural;
    "32" => i32, Natural;
    "64" => u64, Natural;
    "64" => i64, Natural;
    "ptr" => usize, Natural;
    "ptr" => isize, Natural;
}

#[cfg(any(
    all(not(feature = "atomic-bool-u32"), target_has_atomic = "8"),
    all(feature = "atomic-bool-u32", target_has_atomic = "32")
))]
impl AtomicType for bool {
    type Repr = BoolRepr;
    type Align = Natural;

    #[inline(always)]
    fn into_repr(self) -> BoolRepr {
        self as BoolRepr
    }

    #[inline(always)]
    fn from_repr(repr: BoolRepr) -> Self {
        repr != 0
    }
}

/// Storage for a logical value accessed through the atomic facade.
///
/// The cell holds the physical representation and is aligned to the larger of
/// the representation's atomic alignment and `T::Align`.
///
/// Raw pointers obtained through [`Atomic::as_ptr`] carry the same alignment
/// requirement. Handing a policy a location that does not meet
/// [`alignment_of::<T>()`](alignment_of) is undefined behavior and is not
/// checked.
#[repr(C)]
pub struct Atomic<T: AtomicType> {
    value: UnsafeCell<T::Repr>,
    _natural: [<T::Repr as Repr>::Atomic; 0],
    _forced: [T::Align; 0],
}

unsafe impl<T: AtomicType> Sync for Atomic<T> {}

impl<T: AtomicType> Atomic<T> {
    pub fn new(value: T) -> Self {
        Self::from_repr(value.into_repr())
    }

    /// Usable in `static` initializers.
    pub const fn from_repr(repr: T::Repr) -> Self {
        Self {
            value: UnsafeCell::new(repr),
            _natural: [],
            _forced: [],
        }
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *mut T::Repr {
        self.value.get()
    }

    pub fn get_mut(&mut self) -> &mut T::Repr {
        self.value.get_mut()
    }

    pub fn into_inner(self) -> T {
        T::from_repr(self.value.into_inner())
    }
}

impl<T: AtomicType + Default> Default for Atomic<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Alignment the storage of `T` must satisfy.
pub const fn alignment_of<T: AtomicType>() -> usize {
    core::mem::align_of::<Atomic<T>>()
}

/// Atomic facade over the policy bound to key `K`.
///
/// ```
/// use awkernel_conc::atomic::{Atomic, Keyed, StandardAtomic};
///
/// struct Peripheral;
/// awkernel_conc::atomic_slot!(Peripheral => StandardAtomic = StandardAtomic);
///
/// let status = Atomic::new(0b101u8);
/// assert_eq!(Keyed::<Peripheral>::fetch_and(&status, 0b10), 0b101);
/// assert_eq!(Keyed::<Peripheral>::load(&status), 0);
/// ```
pub struct Keyed<K>(PhantomData<K>);

// `Atomic<T>` keeps its representation valid and aligned for as long as the
// borrow lives, which is what every policy call below relies on.
impl<K: AtomicSlot> Keyed<K> {
    #[inline(always)]
    pub fn load<T: AtomicType>(place: &Atomic<T>) -> T {
        T::from_repr(unsafe { K::policy().load(place.as_ptr()) })
    }

    #[inline(always)]
    pub fn load_with<T: AtomicType>(place: &Atomic<T>, order: Ordering) -> T {
        T::from_repr(unsafe { K::policy().load_with(place.as_ptr(), order) })
    }

    #[inline(always)]
    pub fn store<T: AtomicType>(place: &Atomic<T>, value: T) {
        unsafe { K::policy().store(place.as_ptr(), value.into_repr()) }
    }

    /// [`store`](Self::store) of any value convertible into `T`.
    #[inline(always)]
    pub fn store_from<T: AtomicType, U: Into<T>>(place: &Atomic<T>, value: U) {
        Self::store(place, value.into())
    }

    #[inline(always)]
    pub fn store_with<T: AtomicType>(place: &Atomic<T>, value: T, order: Ordering) {
        unsafe {
            K::policy().store_with(place.as_ptr(), value.into_repr(), order)
        }
    }

    #[inline(always)]
    pub fn exchange<T: AtomicType>(place: &Atomic<T>, value: T) -> T
    where
        K::Policy: Exchange,
    {
        T::from_repr(unsafe { K::policy().exchange(place.as_ptr(), value.into_repr()) })
    }

    #[inline(always)]
    pub fn exchange_with<T: AtomicType>(place: &Atomic<T>, value: T, order: Ordering) -> T
    where
        K::Policy: Exchange,
    {
        T::from_repr(unsafe {
            K::policy().exchange_with(place.as_ptr(), value.into_repr(), order)
        })
    }

    #[inline(always)]
    pub fn fetch_add<T: AtomicArithmetic>(place: &Atomic<T>, delta: T) -> T
    where
        K::Policy: AddSub,
    {
        T::from_repr(unsafe { K::policy().fetch_add(place.as_ptr(), delta.into_repr()) })
    }

    #[inline(always)]
    pub fn fetch_add_with<T: AtomicArithmetic>(place: &Atomic<T>, delta: T, order: Ordering) -> T
    where
        K::Policy: AddSub,
    {
        T::from_repr(unsafe {
            K::policy().fetch_add_with(place.as_ptr(), delta.into_repr(), order)
        })
    }

    #[inline(always)]
    pub fn fetch_sub<T: AtomicArithmetic>(place: &Atomic<T>, delta: T) -> T
    where
        K::Policy: AddSub,
    {
        T::from_repr(unsafe { K::policy().fetch_sub(place.as_ptr(), delta.into_repr()) })
    }

    #[inline(always)]
    pub fn fetch_sub_with<T: AtomicArithmetic>(place: &Atomic<T>, delta: T, order: Ordering) -> T
    where
        K::Policy: AddSub,
    {
        T::from_repr(unsafe {
            K::policy().fetch_sub_with(place.as_ptr(), delta.into_repr(), order)
        })
    }

    #[inline(always)]
    pub fn fetch_and<T: AtomicType>(place: &Atomic<T>, mask: T) -> T
    where
        K::Policy: Bitwise,
    {
        T::from_repr(unsafe { K::policy().fetch_and(place.as_ptr(), mask.into_repr()) })
    }

    #[inline(always)]
    pub fn fetch_and_with<T: AtomicType>(place: &Atomic<T>, mask: T, order: Ordering) -> T
    where
        K::Policy: Bitwise,
    {
        T::from_repr(unsafe {
            K::policy().fetch_and_with(place.as_ptr(), mask.into_repr(), order)
        })
    }

    #[inline(always)]
    pub fn fetch_or<T: AtomicType>(place: &Atomic<T>, mask: T) -> T
    where
        K::Policy: Bitwise,
    {
        T::from_repr(unsafe { K::policy().fetch_or(place.as_ptr(), mask.into_repr()) })
    }

    #[inline(always)]
    pub fn fetch_or_with<T: AtomicType>(place: &Atomic<T>, mask: T, order: Ordering) -> T
    where
        K::Policy: Bitwise,
    {
        T::from_repr(unsafe {
            K::policy().fetch_or_with(place.as_ptr(), mask.into_repr(), order)
        })
    }

    #[inline(always)]
    pub fn fetch_xor<T: AtomicType>(place: &Atomic<T>, mask: T) -> T
    where
        K::Policy: Bitwise,
    {
        T::from_repr(unsafe { K::policy().fetch_xor(place.as_ptr(), mask.into_repr()) })
    }

    #[inline(always)]
    pub fn fetch_xor_with<T: AtomicType>(place: &Atomic<T>, mask: T, order: Ordering) -> T
    where
        K::Policy: Bitwise,
    {
        T::from_repr(unsafe {
            K::policy().fetch_xor_with(place.as_ptr(), mask.into_repr(), order)
        })
    }
}

#[inline(always)]
pub fn load<T: AtomicType>(place: &Atomic<T>) -> T {
    Keyed::<Global>::load(place)
}

#[inline(always)]
pub fn load_with<T: AtomicType>(place: &Atomic<T>, order: Ordering) -> T {
    Keyed::<Global>::load_with(place, order)
}

#[inline(always)]
pub fn store<T: AtomicType>(place: &Atomic<T>, value: T) {
    Keyed::<Global>::store(place, value)
}

/// Store any value convertible into `T`, e.g. a `u8` into an `Atomic<u32>`.
#[inline(always)]
pub fn store_from<T: AtomicType, U: Into<T>>(place: &Atomic<T>, value: U) {
    Keyed::<Global>::store_from(place, value)
}

#[inline(always)]
pub fn store_with<T: AtomicType>(place: &Atomic<T>, value: T, order: Ordering) {
    Keyed::<Global>::store_with(place, value, order)
}

/// Store `value` and return the value it replaced.
#[inline(always)]
pub fn exchange<T: AtomicType>(place: &Atomic<T>, value: T) -> T {
    Keyed::<Global>::exchange(place, value)
}

#[inline(always)]
pub fn exchange_with<T: AtomicType>(place: &Atomic<T>, value: T, order: Ordering) -> T {
    Keyed::<Global>::exchange_with(place, value, order)
}

/// Wrapping add on the physical representation. Returns the previous value.
#[inline(always)]
pub fn fetch_add<T: AtomicArithmetic>(place: &Atomic<T>, delta: T) -> T {
    Keyed::<Global>::fetch_add(place, delta)
}

#[inline(always)]
pub fn fetch_add_with<T: AtomicArithmetic>(place: &Atomic<T>, delta: T, order: Ordering) -> T {
    Keyed::<Global>::fetch_add_with(place, delta, order)
}

/// Wrapping subtract on the physical representation. Returns the previous value.
#[inline(always)]
pub fn fetch_sub<T: AtomicArithmetic>(place: &Atomic<T>, delta: T) -> T {
    Keyed::<Global>::fetch_sub(place, delta)
}

#[inline(always)]
pub fn fetch_sub_with<T: AtomicArithmetic>(place: &Atomic<T>, delta: T, order: Ordering) -> T {
    Keyed::<Global>::fetch_sub_with(place, delta, order)
}

#[inline(always)]
pub fn fetch_and<T: AtomicType>(place: &Atomic<T>, mask: T) -> T {
    Keyed::<Global>::fetch_and(place, mask)
}

#[inline(always)]
pub fn fetch_and_with<T: AtomicType>(place: &Atomic<T>, mask: T, order: Ordering) -> T {
    Keyed::<Global>::fetch_and_with(place, mask, order)
}

#[inline(always)]
pub fn fetch_or<T: AtomicType>(place: &Atomic<T>, mask: T) -> T {
    Keyed::<Global>::fetch_or(place, mask)
}

#[inline(always)]
pub fn fetch_or_with<T: AtomicType>(place: &Atomic<T>, mask: T, order: Ordering) -> T {
    Keyed::<Global>::fetch_or_with(place, mask, order)
}

#[inline(always)]
pub fn fetch_xor<T: AtomicType>(place: &Atomic<T>, mask: T) -> T {
    Keyed::<Global>::fetch_xor(place, mask)
}

#[inline(always)]
pub fn fetch_xor_with<T: AtomicType>(place: &Atomic<T>, mask: T, order: Ordering) -> T {
    Keyed::<Global>::fetch_xor_with(place, mask, order)
}
