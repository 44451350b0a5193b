use std::sync::atomic::{AtomicUsize, Ordering};

use awkernel_conc::{
    atomic::{alignment_of, Align4, Atomic, AtomicType, Keyed, Natural},
    contract::{LoadStore, Repr},
    slot,
};

/// Load/store only, records every call and the orderings it was given.
struct RecordingPolicy {
    loads: AtomicUsize,
    stores: AtomicUsize,
    last_order: AtomicUsize,
}

impl RecordingPolicy {
    const fn new() -> Self {
        Self {
            loads: AtomicUsize::new(0),
            stores: AtomicUsize::new(0),
            last_order: AtomicUsize::new(usize::MAX),
        }
    }

    fn record(&self, order: Ordering) {
        let code = match order {
            Ordering::Relaxed => 0,
            Ordering::Acquire => 1,
            Ordering::Release => 2,
            Ordering::AcqRel => 3,
            _ => 4,
        };
        self.last_order.store(code, Ordering::SeqCst);
    }
}

unsafe impl LoadStore for RecordingPolicy {
    unsafe fn load_with<R: Repr>(&self, src: *mut R, order: Ordering) -> R {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.record(order);
        unsafe { R::atomic_load(src, order) }
    }

    unsafe fn store_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) {
        self.stores.fetch_add(1, Ordering::SeqCst);
        self.record(order);
        unsafe { R::atomic_store(dst, value, order) }
    }
}

struct Board;
awkernel_conc::atomic_slot!(Board => RecordingPolicy = RecordingPolicy::new());

type Facade = Keyed<Board>;

#[test]
fn injected_policy_implements_load() {
    let val = Atomic::new(17u32);
    let before = slot::atomic_policy::<Board>().loads.load(Ordering::SeqCst);

    assert_eq!(Facade::load(&val), 17);
    assert!(slot::atomic_policy::<Board>().loads.load(Ordering::SeqCst) > before);
}

#[test]
fn injected_policy_implements_store() {
    let val = Atomic::new(17u32);
    let before = slot::atomic_policy::<Board>().stores.load(Ordering::SeqCst);

    Facade::store(&val, 1337);
    assert_eq!(val.into_inner(), 1337);
    assert!(slot::atomic_policy::<Board>().stores.load(Ordering::SeqCst) > before);
}

struct OrderLog;
awkernel_conc::atomic_slot!(OrderLog => RecordingPolicy = RecordingPolicy::new());

#[test]
fn orderings_reach_the_policy_unchanged() {
    let val = Atomic::new(0u16);
    let recorder = slot::atomic_policy::<OrderLog>();

    Keyed::<OrderLog>::store_with(&val, 7, Ordering::Release);
    assert_eq!(recorder.last_order.load(Ordering::SeqCst), 2);

    assert_eq!(Keyed::<OrderLog>::load_with(&val, Ordering::Relaxed), 7);
    assert_eq!(recorder.last_order.load(Ordering::SeqCst), 0);

    assert_eq!(Keyed::<OrderLog>::load(&val), 7);
    assert_eq!(recorder.last_order.load(Ordering::SeqCst), 4);
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Flag(bool);

impl AtomicType for Flag {
    type Repr = u32;
    type Align = Natural;

    fn into_repr(self) -> u32 {
        self.0 as u32
    }

    fn from_repr(repr: u32) -> Self {
        Flag(repr != 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Byte(u8);

impl AtomicType for Byte {
    type Repr = u8;
    type Align = Align4;

    fn into_repr(self) -> u8 {
        self.0
    }

    fn from_repr(repr: u8) -> Self {
        Byte(repr)
    }
}

#[test]
fn injected_policy_can_inject_different_atomic_types() {
    assert_eq!(alignment_of::<Flag>(), core::mem::align_of::<u32>());
    assert_eq!(core::mem::size_of::<Atomic<Flag>>(), 4);

    let flag = Atomic::new(Flag(false));
    Facade::store(&flag, Flag(true));
    assert_eq!(Facade::load(&flag), Flag(true));
    assert_eq!(unsafe { *flag.as_ptr() }, 1);
}

#[test]
fn injected_policy_can_inject_different_atomic_alignments() {
    assert_eq!(alignment_of::<Byte>(), 4);

    let bytes = [Atomic::new(Byte(1)), Atomic::new(Byte(2))];
    for byte in &bytes {
        assert_eq!(byte.as_ptr() as usize % alignment_of::<Byte>(), 0);
    }
    assert_eq!(Facade::load(&bytes[1]), Byte(2));
}
