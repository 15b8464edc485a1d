//! Process-wide shutdown registry.
//!
//! Listeners are nullary callbacks run once, in registration order, when the
//! process tears down. The driver (`fire`) is invoked by whoever owns process
//! lifetime: the dev server after its graceful shutdown, or the application.
//!
//! Listeners registered after the registry fired run immediately on the
//! caller's thread.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

type Listener = Box<dyn FnOnce() + Send + 'static>;

/// Handle returned by [`ShutdownRegistry::add`], used for deregistration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct State {
    fired: bool,
    listeners: Vec<(ListenerId, Listener)>,
}

/// Ordered, one-shot list of teardown callbacks.
#[derive(Default)]
pub struct ShutdownRegistry {
    state: Mutex<State>,
    seq: AtomicU64,
}

impl ShutdownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A listener never runs under the lock, so poisoning only means a
        // panic elsewhere; the list itself is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a listener. Runs it right away if the registry already fired.
    pub fn add<F>(&self, f: F) -> ListenerId
    where
        F: FnOnce() + Send + 'static,
    {
        let id = ListenerId(self.seq.fetch_add(1, Ordering::Relaxed));
        let listener: Listener = Box::new(f);
        let mut st = self.lock();
        if st.fired {
            drop(st);
            run_listener(id, listener);
        } else {
            st.listeners.push((id, listener));
        }
        id
    }

    /// Drop a pending listener. Returns false if it already ran or is unknown.
    pub fn remove(&self, id: ListenerId) -> bool {
        let removed = {
            let mut st = self.lock();
            st.listeners
                .iter()
                .position(|(lid, _)| *lid == id)
                .map(|pos| st.listeners.remove(pos))
        };
        // Dropped unlocked: the closure may own state whose drop re-enters
        // the registry.
        removed.is_some()
    }

    /// Number of listeners waiting for `fire`.
    pub fn pending(&self) -> usize {
        self.lock().listeners.len()
    }

    pub fn has_fired(&self) -> bool {
        self.lock().fired
    }

    /// Run every pending listener once, in registration order.
    ///
    /// Returns how many listeners ran. Only the first call does anything.
    pub fn fire(&self) -> usize {
        let listeners = {
            let mut st = self.lock();
            if st.fired {
                return 0;
            }
            st.fired = true;
            std::mem::take(&mut st.listeners)
        };

        let n = listeners.len();
        tracing::info!(listeners = n, "running shutdown listeners");
        for (id, f) in listeners {
            run_listener(id, f);
        }
        n
    }
}

fn run_listener(id: ListenerId, f: Listener) {
    if panic::catch_unwind(AssertUnwindSafe(f)).is_err() {
        tracing::error!(listener = id.0, "shutdown listener panicked");
    }
}

fn global() -> &'static ShutdownRegistry {
    static REGISTRY: OnceLock<ShutdownRegistry> = OnceLock::new();
    REGISTRY.get_or_init(ShutdownRegistry::new)
}

/// Register `f` with the process-wide registry.
pub fn add_shutdown_listener<F>(f: F) -> ListenerId
where
    F: FnOnce() + Send + 'static,
{
    global().add(f)
}

/// Deregister a listener from the process-wide registry.
pub fn remove_shutdown_listener(id: ListenerId) -> bool {
    global().remove(id)
}

/// Drive the process-wide registry. See [`ShutdownRegistry::fire`].
pub fn fire() -> usize {
    global().fire()
}

/// Whether the process-wide registry has fired.
pub fn has_fired() -> bool {
    global().has_fired()
}
