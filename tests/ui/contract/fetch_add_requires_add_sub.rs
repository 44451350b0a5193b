use core::sync::atomic::Ordering;

use awkernel_conc::{
    atomic::{Atomic, Keyed},
    atomic_slot,
    contract::{LoadStore, Repr},
};

struct LoadStoreOnly;

unsafe impl LoadStore for LoadStoreOnly {
    unsafe fn load_with<R: Repr>(&self, src: *mut R, order: Ordering) -> R {
        unsafe { R::atomic_load(src, order) }
    }

    unsafe fn store_with<R: Repr>(&self, dst: *mut R, value: R, order: Ordering) {
        unsafe { R::atomic_store(dst, value, order) }
    }
}

struct Sensor;
atomic_slot!(Sensor => LoadStoreOnly = LoadStoreOnly);

fn main() {
    let count = Atomic::new(0u32);
    Keyed::<Sensor>::fetch_add(&count, 1);
}
