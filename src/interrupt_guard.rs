//! Interrupt masking for the spin backend.
//!
//! On hosted builds, and on freestanding builds without an architecture
//! feature, masking is a no-op: the spin backend then only excludes other
//! threads or cores, not interrupt handlers on the same core.

#[cfg(all(feature = "x86", not(feature = "std")))]
mod x86_64;

#[cfg(all(feature = "x86", not(feature = "std")))]
use self::x86_64::{disable, get_flag, set_flag};

#[cfg(all(feature = "aarch64", not(feature = "std")))]
mod aarch64;

#[cfg(all(feature = "aarch64", not(feature = "std")))]
use self::aarch64::{disable, get_flag, set_flag};

#[cfg(all(feature = "rv64", not(feature = "std")))]
mod rv64;

#[cfg(all(feature = "rv64", not(feature = "std")))]
use self::rv64::{disable, get_flag, set_flag};

#[cfg(any(
    feature = "std",
    not(any(feature = "x86", feature = "aarch64", feature = "rv64"))
))]
mod passthrough;

#[cfg(any(
    feature = "std",
    not(any(feature = "x86", feature = "aarch64", feature = "rv64"))
))]
use self::passthrough::{disable, get_flag, set_flag};

/// Disable interrupts and restore the previous state on drop.
///
/// Guards nest: an inner guard restores the masked state of the outer one.
pub(crate) struct InterruptGuard {
    flag: usize,
}

impl InterruptGuard {
    #[inline(always)]
    pub(crate) fn new() -> Self {
        let flag = get_flag();
        disable();

        Self { flag }
    }
}

impl Drop for InterruptGuard {
    #[inline(always)]
    fn drop(&mut self) {
        set_flag(self.flag);
    }
}
