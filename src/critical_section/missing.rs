use core::marker::PhantomData;

use crate::contract::{BasicCriticalSection, CriticalSection, DomainId};

/// Placeholder bound to the global slot when there is neither `std` nor an
/// injected backend.
///
/// It satisfies [`CriticalSection`] so that generic code keeps compiling, but
/// every instantiation of its methods is rejected at build time.
#[derive(Debug, Default, Clone, Copy)]
pub struct MissingCriticalSection;

impl MissingCriticalSection {
    pub const fn new() -> Self {
        Self
    }
}

const MISSING_POLICY: &str = "no critical-section policy defined: inject one with \
    `awkernel_conc::set_critical_section!` and the `custom-critical-section` feature, \
    or enable the `std` feature";

struct NoPolicy<F>(PhantomData<F>);

impl<F> NoPolicy<F> {
    const DEFINED: () = panic!("{}", MISSING_POLICY);
}

impl BasicCriticalSection for MissingCriticalSection {
    fn run_exclusive<F, R>(&self, _domain: DomainId, action: F) -> R
    where
        F: FnOnce() -> R,
    {
        #[allow(clippy::let_unit_value)]
        let () = NoPolicy::<F>::DEFINED;
        action()
    }
}

impl CriticalSection for MissingCriticalSection {
    fn run_exclusive_when<F, P, R>(&self, _domain: DomainId, action: F, _predicate: P) -> R
    where
        F: FnOnce() -> R,
        P: FnMut() -> bool,
    {
        #[allow(clippy::let_unit_value)]
        let () = NoPolicy::<(F, P)>::DEFINED;
        action()
    }
}
