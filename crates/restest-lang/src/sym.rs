//! The symbolic-variable minter.
//!
//! Numbering is process-global and monotonically increasing, so every
//! symbolic variable minted within a run is unique. This is the only
//! process-wide state the pipeline relies on.

use std::sync::atomic::{AtomicU32, Ordering};

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Mint the next symbolic-variable number.
pub fn fresh() -> u32 {
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Reset the counter to zero. Intended for tests that compare runs.
pub fn reset() {
    COUNTER.store(0, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_is_monotonic() {
        let a = fresh();
        let b = fresh();
        let c = fresh();
        assert!(a < b && b < c);
    }
}
