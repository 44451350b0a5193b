use std::sync::atomic::{AtomicU8, Ordering};

use awkernel_conc::{
    atomic::{alignment_of, Atomic, AtomicType, BoolRepr, ByteAlign, Keyed},
    contract::{LoadStore, Repr, Width},
};
use static_assertions::assert_type_eq_all;

assert_type_eq_all!(<bool as AtomicType>::Repr, BoolRepr, u32);
assert_type_eq_all!(<u8 as AtomicType>::Align, <i8 as AtomicType>::Align, ByteAlign);

/// Remembers the operand width of the last operation.
struct WidthRecorder {
    last_width: AtomicU8,
}

impl WidthRecorder {
    const fn new() -> Self {
        Self {
            last_width: AtomicU8::new(0),
        }
    }

    fn record<R: Repr>(&self) {
        let bits = match R::WIDTH {
            Width::W8 => 8,
            Width::W16 => 16,
            Width::W32 => 32,
            Width::W64 => 64,
        };
        self.last_width.store(bits, Ordering::SeqCst);
    }

    fn last_width(&self) -> u8 {
        self.last_width.load(Ordering::SeqCst)
    }
}

unsafe impl LoadStore for WidthRecorder {
    unsafe fn load_with<R: Repr>(&self, src: *mut R, order: Ordering) -> R {
        self.record::<R>();
        unsafe { R::atomic_load(src, order) }
    }

    unsafe fn store_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) {
        self.record::<R>();
        unsafe { R::atomic_store(dst, value, order) }
    }
}

struct Flags;
awkernel_conc::atomic_slot!(Flags => WidthRecorder = WidthRecorder::new());

struct Bytes;
awkernel_conc::atomic_slot!(Bytes => WidthRecorder = WidthRecorder::new());

#[test]
fn bool_is_stored_as_a_word() {
    assert_eq!(alignment_of::<bool>(), core::mem::align_of::<u32>());
    assert_eq!(core::mem::size_of::<Atomic<bool>>(), 4);

    let flag = Atomic::new(false);
    Keyed::<Flags>::store(&flag, true);
    assert_eq!(awkernel_conc::slot::atomic_policy::<Flags>().last_width(), 32);

    assert!(Keyed::<Flags>::load(&flag));
    assert_eq!(unsafe { *flag.as_ptr() }, 1u32);
}

#[test]
fn bytes_are_aligned_to_four() {
    assert_eq!(alignment_of::<u8>(), 4);
    assert_eq!(alignment_of::<i8>(), 4);
    assert_eq!(alignment_of::<u16>(), core::mem::align_of::<u16>());

    let bytes = [Atomic::new(1u8), Atomic::new(2u8), Atomic::new(3u8)];
    for byte in &bytes {
        assert_eq!(byte.as_ptr() as usize % 4, 0);
    }

    // The operand stays a byte; only the storage grows.
    assert_eq!(Keyed::<Bytes>::load(&bytes[2]), 3);
    assert_eq!(awkernel_conc::slot::atomic_policy::<Bytes>().last_width(), 8);
}

#[test]
fn aligned_bytes_still_wrap() {
    struct Intrinsics;
    awkernel_conc::atomic_slot!(
        Intrinsics => awkernel_conc::atomic::StandardAtomic =
            awkernel_conc::atomic::StandardAtomic::new()
    );

    let byte = Atomic::new(-128i8);
    assert_eq!(Keyed::<Intrinsics>::fetch_sub(&byte, 1), -128);
    assert_eq!(Keyed::<Intrinsics>::load(&byte), 127);
}
