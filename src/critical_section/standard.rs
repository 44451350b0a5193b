use alloc::{boxed::Box, collections::BTreeMap};
use parking_lot::{Mutex, RwLock};

use crate::contract::{BasicCriticalSection, CriticalSection, DomainId};

/// Hosted critical sections: one `parking_lot` mutex per domain.
///
/// A domain's mutex is created the first time the domain is entered and is
/// never freed.
pub struct StandardCriticalSection {
    domains: RwLock<BTreeMap<DomainId, &'static Mutex<()>>>,
}

impl Default for StandardCriticalSection {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardCriticalSection {
    pub const fn new() -> Self {
        Self {
            domains: parking_lot::const_rwlock(BTreeMap::new()),
        }
    }

    fn lock_of(&self, domain: DomainId) -> &'static Mutex<()> {
        let found = self.domains.read().get(&domain).copied();
        if let Some(lock) = found {
            return lock;
        }

        let mut domains = self.domains.write();
        *domains.entry(domain).or_insert_with(|| {
            log::debug!("critical section: new lock for domain {}", domain.name());
            Box::leak(Box::new(Mutex::new(())))
        })
    }
}

impl BasicCriticalSection for StandardCriticalSection {
    #[inline]
    fn run_exclusive<F, R>(&self, domain: DomainId, action: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = self.lock_of(domain).lock();
        action()
    }
}

impl CriticalSection for StandardCriticalSection {
    #[inline]
    fn run_exclusive_when<F, P, R>(&self, domain: DomainId, action: F, mut predicate: P) -> R
    where
        F: FnOnce() -> R,
        P: FnMut() -> bool,
    {
        let lock = self.lock_of(domain);
        loop {
            let _guard = lock.lock();
            if predicate() {
                return action();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct First;
    struct Second;

    #[test]
    fn one_lock_per_domain() {
        let cs = StandardCriticalSection::new();

        let a = cs.lock_of(DomainId::of::<First>());
        let b = cs.lock_of(DomainId::of::<Second>());
        assert!(core::ptr::eq(a, cs.lock_of(DomainId::of::<First>())));
        assert!(!core::ptr::eq(a, b));
    }

    #[test]
    fn lock_is_released_when_the_action_panics() {
        let cs = StandardCriticalSection::new();
        let domain = DomainId::of::<First>();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            cs.run_exclusive(domain, || panic!("action failed"))
        }));
        assert!(result.is_err());
        assert!(!cs.lock_of(domain).is_locked());
    }
}
