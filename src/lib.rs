//! Portable atomics and critical sections behind injectable policies.
//!
//! Application code calls the facades in [`atomic`] and [`critical_section`].
//! The backends they forward to are bound per [`slot`] at build time and
//! checked against the traits in [`contract`].

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod atomic;
pub mod contract;
pub mod critical_section;
mod interrupt_guard;
pub mod slot;
pub mod spinlock;

pub use atomic::{Atomic, AtomicType};
pub use slot::Global;
