use alloc::{boxed::Box, collections::BTreeMap};
use core::hint;

use crate::{
    contract::{BasicCriticalSection, CriticalSection, DomainId},
    spinlock::SpinLock,
};

/// Critical sections for targets without an operating system.
///
/// Each domain gets a [`SpinLock`], allocated on first use and never freed.
/// Interrupts are masked while a domain is held if one of the `x86`,
/// `aarch64` or `rv64` features is enabled on a freestanding build. The global
/// slot never defaults to this backend; register it where it fits:
///
/// ```ignore
/// awkernel_conc::set_critical_section!(
///     awkernel_conc::critical_section::SpinCriticalSection =
///         awkernel_conc::critical_section::SpinCriticalSection::new()
/// );
/// ```
pub struct SpinCriticalSection {
    domains: SpinLock<BTreeMap<DomainId, &'static SpinLock<()>>>,
}

impl Default for SpinCriticalSection {
    fn default() -> Self {
        Self::new()
    }
}

impl SpinCriticalSection {
    pub const fn new() -> Self {
        Self {
            domains: SpinLock::new(BTreeMap::new()),
        }
    }

    fn lock_of(&self, domain: DomainId) -> &'static SpinLock<()> {
        let mut domains = self.domains.lock();
        *domains.entry(domain).or_insert_with(|| {
            #[cfg(feature = "std")]
            log::debug!("spin critical section: new lock for domain {}", domain.name());

            Box::leak(Box::new(SpinLock::new(())))
        })
    }
}

impl BasicCriticalSection for SpinCriticalSection {
    fn run_exclusive<F, R>(&self, domain: DomainId, action: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = self.lock_of(domain).lock();
        action()
    }
}

impl CriticalSection for SpinCriticalSection {
    fn run_exclusive_when<F, P, R>(&self, domain: DomainId, action: F, mut predicate: P) -> R
    where
        F: FnOnce() -> R,
        P: FnMut() -> bool,
    {
        let lock = self.lock_of(domain);
        loop {
            {
                let _guard = lock.lock();
                if predicate() {
                    return action();
                }
            }
            hint::spin_loop();
        }
    }
}
