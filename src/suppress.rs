//! Thread-scoped suppression of auditing.
//!
//! The interception layer (or application code) enters a suppressed region
//! with [`suppress`]; the engine only reads [`is_suppressed`]. Regions nest
//! and end when their guard drops. Nothing here is shared across threads.

use std::cell::Cell;
use std::marker::PhantomData;

thread_local! {
    static SUPPRESSION_DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// True while the calling thread is inside a suppressed region
pub fn is_suppressed() -> bool {
    SUPPRESSION_DEPTH.with(|depth| depth.get() > 0)
}

/// Enter a suppressed region lasting until the guard drops
pub fn suppress() -> SuppressGuard {
    SUPPRESSION_DEPTH.with(|depth| depth.set(depth.get().saturating_add(1)));
    SuppressGuard { _not_send: PhantomData }
}

/// Run `f` with auditing suppressed on this thread
pub fn suppressed<R>(f: impl FnOnce() -> R) -> R {
    let _guard = suppress();
    f()
}

/// Ends one suppressed region on drop. Bound to the thread that created it.
#[must_use = "suppression ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SuppressGuard {
    _not_send: PhantomData<*const ()>,
}

impl Drop for SuppressGuard {
    fn drop(&mut self) {
        SUPPRESSION_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}
