// Licensed under the Apache-2.0 license

//! Single-slot completion signal between a transfer primitive and the
//! interrupt handler.

use core::sync::atomic::{AtomicBool, Ordering};

/// One outstanding "waiting for the byte to finish" notification.
///
/// Only atomic loads and stores are used, so this works on cores without
/// compare-and-swap.
#[derive(Debug)]
pub struct AckSignal {
    pending: AtomicBool,
}

impl Default for AckSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl AckSignal {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Mark a transfer as waiting. Must happen before the hardware action
    /// whose completion interrupt is expected to release it.
    pub fn arm(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    /// Called from the interrupt handler. Releasing an idle signal is a no-op.
    pub fn release(&self) {
        self.pending.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_and_release() {
        let signal = AckSignal::new();
        assert!(!signal.is_pending());

        signal.arm();
        assert!(signal.is_pending());

        signal.release();
        assert!(!signal.is_pending());

        signal.release();
        assert!(!signal.is_pending());
    }

    #[test]
    fn test_release_from_other_thread() {
        let signal = AckSignal::new();
        signal.arm();
        std::thread::scope(|s| {
            s.spawn(|| signal.release());
        });
        assert!(!signal.is_pending());
    }
}
