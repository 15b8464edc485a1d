//! Process-wide enablement gate.
//!
//! Every observation consults this flag first. It starts off; the dev server
//! (or the application) turns it on once metrics are being scraped.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Result;

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Turn recording on.
///
/// Release ordering: anything the caller did before (e.g. registering
/// metrics) is visible to a thread that observes the flag as on.
pub fn enable() {
    ENABLED.store(true, Ordering::Release);
    tracing::debug!("metrics recording enabled");
}

/// Turn recording off.
pub fn disable() {
    ENABLED.store(false, Ordering::Release);
    tracing::debug!("metrics recording disabled");
}

/// Whether observations currently reach the underlying metrics.
#[inline]
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Acquire)
}

/// Run `f` only when the gate is on. Off means `Ok(())` and no side effects.
#[inline]
pub(crate) fn update<F>(f: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    if is_enabled() {
        f()
    } else {
        Ok(())
    }
}
