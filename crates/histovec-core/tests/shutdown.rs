//! Shutdown registry ordering, one-shot semantics, and histogram teardown.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use histovec_core::metric::{HistogramVec, HistogramVecOpts, PromHistogramVec};
use histovec_core::shutdown::{self, ShutdownRegistry};

#[test]
fn listeners_run_once_in_registration_order() {
    let reg = ShutdownRegistry::new();
    let order = Arc::new(Mutex::new(Vec::new()));
    for i in 0..5 {
        let order = Arc::clone(&order);
        reg.add(move || order.lock().unwrap().push(i));
    }
    assert_eq!(reg.pending(), 5);

    assert_eq!(reg.fire(), 5);
    assert_eq!(reg.fire(), 0);
    assert!(reg.has_fired());
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn removed_listener_does_not_run() {
    let reg = ShutdownRegistry::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    let id = reg.add(move || {
        h.fetch_add(1, Ordering::SeqCst);
    });

    assert!(reg.remove(id));
    assert!(!reg.remove(id));
    reg.fire();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

/// Touches its registry when dropped.
struct PendingOnDrop {
    reg: Arc<ShutdownRegistry>,
    seen: Arc<AtomicUsize>,
}

impl Drop for PendingOnDrop {
    fn drop(&mut self) {
        self.seen.store(self.reg.pending() + 100, Ordering::SeqCst);
    }
}

#[test]
fn removed_listener_is_dropped_outside_the_lock() {
    let reg = Arc::new(ShutdownRegistry::new());
    let seen = Arc::new(AtomicUsize::new(0));
    reg.add(|| {});
    let guard = PendingOnDrop {
        reg: Arc::clone(&reg),
        seen: Arc::clone(&seen),
    };
    let id = reg.add(move || drop(guard));

    assert!(reg.remove(id));
    // The drop saw the list without the removed entry.
    assert_eq!(seen.load(Ordering::SeqCst), 101);
    assert_eq!(reg.pending(), 1);
}

#[test]
fn late_listener_runs_immediately() {
    let reg = ShutdownRegistry::new();
    reg.fire();

    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    reg.add(move || {
        h.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(reg.pending(), 0);
}

#[test]
fn panicking_listener_does_not_stop_the_rest() {
    let reg = ShutdownRegistry::new();
    let hits = Arc::new(AtomicUsize::new(0));
    reg.add(|| panic!("boom"));
    let h = Arc::clone(&hits);
    reg.add(move || {
        h.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(reg.fire(), 2);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_adds_are_all_kept() {
    let reg = ShutdownRegistry::new();
    let hits = Arc::new(AtomicUsize::new(0));
    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..100 {
                    let h = Arc::clone(&hits);
                    reg.add(move || {
                        h.fetch_add(1, Ordering::SeqCst);
                    });
                }
            });
        }
    });
    assert_eq!(reg.fire(), 800);
    assert_eq!(hits.load(Ordering::SeqCst), 800);
}

// The only test in this binary touching the process-wide registry.
#[test]
fn process_shutdown_unregisters_histograms() {
    let opts = HistogramVecOpts::new("shutdown_owned", "teardown").labels(["k"]);
    let live = PromHistogramVec::new(Some(&opts)).unwrap();

    let closed_early = PromHistogramVec::new(Some(
        &HistogramVecOpts::new("shutdown_closed_early", "teardown"),
    ))
    .unwrap();
    assert!(closed_early.close());

    assert!(!shutdown::has_fired());
    // Only `live` still has a listener pending.
    assert_eq!(shutdown::fire(), 1);
    assert!(shutdown::has_fired());

    assert!(live.is_closed());
    assert!(!live.close());

    // The name is free again; a handle built after shutdown is torn down at once.
    let late = PromHistogramVec::new(Some(&opts)).unwrap();
    assert!(late.is_closed());
    assert!(PromHistogramVec::try_new(&opts).is_ok());
}
