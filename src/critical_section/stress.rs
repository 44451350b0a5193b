use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU32, Ordering},
    thread,
    time::Duration,
};

use parking_lot::{Mutex, MutexGuard, RwLock};
use rand::Rng;

use crate::contract::{BasicCriticalSection, CriticalSection, DomainId};

/// Critical sections that sleep a random time before and after taking the
/// domain lock, to widen race windows in tests.
///
/// Every acquisition and release is counted, so tests can check that the
/// facade went through this backend and that each lock taken was released.
/// Bind it to a keyed slot, or register it globally in a test binary.
pub struct StressCriticalSection {
    domains: RwLock<BTreeMap<DomainId, &'static Mutex<()>>>,
    min_delay_us: u64,
    max_delay_us: u64,
    lock_count: AtomicU32,
    unlock_count: AtomicU32,
}

impl Default for StressCriticalSection {
    fn default() -> Self {
        Self::new()
    }
}

impl StressCriticalSection {
    /// Delays between 5 and 10 milliseconds.
    pub const fn new() -> Self {
        Self::with_delay_us(5_000, 10_000)
    }

    pub const fn with_delay_us(min_delay_us: u64, max_delay_us: u64) -> Self {
        Self {
            domains: parking_lot::const_rwlock(BTreeMap::new()),
            min_delay_us,
            max_delay_us,
            lock_count: AtomicU32::new(0),
            unlock_count: AtomicU32::new(0),
        }
    }

    pub fn lock_count(&self) -> u32 {
        self.lock_count.load(Ordering::SeqCst)
    }

    pub fn unlock_count(&self) -> u32 {
        self.unlock_count.load(Ordering::SeqCst)
    }

    pub fn reset_counts(&self) {
        self.lock_count.store(0, Ordering::SeqCst);
        self.unlock_count.store(0, Ordering::SeqCst);
    }

    fn lock_of(&self, domain: DomainId) -> &'static Mutex<()> {
        let found = self.domains.read().get(&domain).copied();
        if let Some(lock) = found {
            return lock;
        }

        let mut domains = self.domains.write();
        *domains
            .entry(domain)
            .or_insert_with(|| Box::leak(Box::new(Mutex::new(()))))
    }

    fn delay(&self) {
        let us = rand::thread_rng().gen_range(self.min_delay_us..=self.max_delay_us);
        thread::sleep(Duration::from_micros(us));
    }

    fn acquire(&self, domain: DomainId) -> Held<'_> {
        self.delay();
        let guard = self.lock_of(domain).lock();
        self.lock_count.fetch_add(1, Ordering::SeqCst);
        log::trace!("stress critical section: locked {}", domain.name());

        Held {
            _guard: guard,
            unlock_count: &self.unlock_count,
            domain,
        }
    }
}

/// Counts the release before the mutex guard drops.
struct Held<'a> {
    _guard: MutexGuard<'static, ()>,
    unlock_count: &'a AtomicU32,
    domain: DomainId,
}

impl Drop for Held<'_> {
    fn drop(&mut self) {
        self.unlock_count.fetch_add(1, Ordering::SeqCst);
        log::trace!("stress critical section: unlocking {}", self.domain.name());
    }
}

impl BasicCriticalSection for StressCriticalSection {
    fn run_exclusive<F, R>(&self, domain: DomainId, action: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _held = self.acquire(domain);
        self.delay();
        action()
    }
}

impl CriticalSection for StressCriticalSection {
    fn run_exclusive_when<F, P, R>(&self, domain: DomainId, action: F, mut predicate: P) -> R
    where
        F: FnOnce() -> R,
        P: FnMut() -> bool,
    {
        loop {
            let _held = self.acquire(domain);
            self.delay();
            if predicate() {
                return action();
            }
        }
    }
}
