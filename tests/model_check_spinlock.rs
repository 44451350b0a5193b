#[cfg(loom)]
#[test]
fn model_check_spinlock() {
    use awkernel_conc::spinlock::SpinLock;
    use loom::{sync::Arc, thread};

    loom::model(|| {
        let lock = Arc::new(SpinLock::new(0));
        let num_threads = 2;
        let num_iterations = 2;

        let threads: Vec<_> = (0..num_threads)
            .map(|_| {
                let lock = lock.clone();
                thread::spawn(move || {
                    for _ in 0..num_iterations {
                        let mut guard = lock.lock();
                        guard.with_mut(|data| unsafe { *data += 1 });
                    }
                })
            })
            .collect();

        for thread in threads {
            thread.join().unwrap();
        }

        let data = lock.lock().with_mut(|data| unsafe { *data });

        assert_eq!(num_threads * num_iterations, data);
    });
}
