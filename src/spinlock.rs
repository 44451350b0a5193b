//! Test-and-test-and-set spin lock with interrupts masked while held.
//!
//! This is the lock behind [`SpinCriticalSection`](crate::critical_section::SpinCriticalSection),
//! the backend meant for targets without an operating system.

use core::{hint, marker::PhantomData};

#[cfg(not(loom))]
use core::{
    cell::UnsafeCell,
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicBool, Ordering},
};

#[cfg(loom)]
use loom::{
    cell::UnsafeCell,
    sync::atomic::{AtomicBool, Ordering},
};

use crate::interrupt_guard::InterruptGuard;

pub struct SpinLock<T> {
    lock_var: AtomicBool,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Sync for SpinLock<T> {}
unsafe impl<T: Send> Send for SpinLock<T> {}

impl<T> SpinLock<T> {
    #[cfg(not(loom))]
    pub const fn new(v: T) -> Self {
        SpinLock {
            lock_var: AtomicBool::new(false),
            data: UnsafeCell::new(v),
        }
    }

    #[cfg(loom)]
    pub fn new(v: T) -> Self {
        SpinLock {
            lock_var: AtomicBool::new(false),
            data: UnsafeCell::new(v),
        }
    }

    #[inline(always)]
    pub fn try_lock(&self) -> Option<SpinLockGuard<'_, T>> {
        let _interrupt_guard = InterruptGuard::new();
        if self
            .lock_var
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(SpinLockGuard {
                spin_lock: self,
                _interrupt_guard,
                _phantom: PhantomData,
            })
        } else {
            None
        }
    }

    /// Spin until the lock is free. Interrupts stay enabled while spinning.
    #[inline(always)]
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        let _interrupt_guard = loop {
            if !self.lock_var.load(Ordering::Relaxed) {
                let interrupt_guard = InterruptGuard::new();
                if self
                    .lock_var
                    .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                    .is_ok()
                {
                    break interrupt_guard;
                };
            }

            hint::spin_loop();

            #[cfg(loom)]
            loom::thread::yield_now();
        };

        SpinLockGuard {
            spin_lock: self,
            _interrupt_guard,
            _phantom: PhantomData,
        }
    }
}

pub struct SpinLockGuard<'a, T> {
    spin_lock: &'a SpinLock<T>,
    _interrupt_guard: InterruptGuard,
    _phantom: PhantomData<*mut ()>,
}

impl<T> SpinLockGuard<'_, T> {
    #[cfg(loom)]
    pub fn with_mut<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(*mut T) -> R,
    {
        self.spin_lock.data.with_mut(f)
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    #[inline(always)]
    fn drop(&mut self) {
        self.spin_lock.lock_var.store(false, Ordering::Release);
    }
}

#[cfg(not(loom))]
impl<T> Deref for SpinLockGuard<'_, T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        unsafe { &*self.spin_lock.data.get() }
    }
}

#[cfg(not(loom))]
impl<T> DerefMut for SpinLockGuard<'_, T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *self.spin_lock.data.get() }
    }
}
