use std::{
    sync::atomic::{AtomicU32, Ordering},
    thread,
};

use awkernel_conc::{
    critical_section::{self, StressCriticalSection},
    run_exclusive, slot,
};

struct Stressed;
awkernel_conc::critical_section_slot!(
    Stressed => StressCriticalSection = StressCriticalSection::with_delay_us(10, 200)
);

struct Counted;
awkernel_conc::critical_section_slot!(
    Counted => StressCriticalSection = StressCriticalSection::with_delay_us(0, 10)
);

#[test]
fn counter_survives_stress_delays() {
    struct CountCs;

    let counter = AtomicU32::new(0);
    let num_threads = 4;
    let num_iterations = 25;

    thread::scope(|s| {
        for _ in 0..num_threads {
            s.spawn(|| {
                for _ in 0..num_iterations {
                    critical_section::run_exclusive_in::<Stressed, CountCs, _, _>(|| {
                        let v = counter.load(Ordering::Relaxed);
                        thread::yield_now();
                        counter.store(v + 1, Ordering::Relaxed);
                    });
                }
            });
        }
    });

    assert_eq!(counter.load(Ordering::SeqCst), num_threads * num_iterations);

    let policy = slot::critical_section_policy::<Stressed>();
    assert_eq!(policy.lock_count(), policy.unlock_count());
}

#[test]
fn every_lock_is_counted_and_released() {
    let policy = slot::critical_section_policy::<Counted>();
    policy.reset_counts();

    run_exclusive!(in Counted => || ());
    assert_eq!(policy.lock_count(), 1);
    assert_eq!(policy.unlock_count(), 1);

    // One acquisition per evaluation of the predicate.
    let mut evaluations = 0;
    run_exclusive!(in Counted => || (), || {
        evaluations += 1;
        evaluations == 3
    });
    assert_eq!(policy.lock_count(), 4);
    assert_eq!(policy.unlock_count(), 4);

    policy.reset_counts();
    assert_eq!(policy.lock_count(), 0);
    assert_eq!(policy.unlock_count(), 0);
}
