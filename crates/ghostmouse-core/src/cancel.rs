//! Cooperative cancellation shared between the controller and the engines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Sleep granularity for cancellable waits. Cancellation latency is bounded
/// by this chunk size; the waits themselves never busy-spin.
const SLEEP_CHUNK_MS: u64 = 50;

/// Shared advisory cancellation flag. Cloning yields a handle to the same
/// flag. Requesting cancellation never interrupts in-flight work; it is
/// observed at the next suspension point.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Sleep for `ms`, waking early if cancelled. Returns `true` if the full
    /// wait elapsed without cancellation, `false` if cancellation was
    /// observed (before, during, or right after the wait).
    pub fn sleep_ms(&self, ms: u64) -> bool {
        let mut waited = 0u64;
        while waited < ms {
            if self.is_cancelled() {
                return false;
            }
            let chunk = (ms - waited).min(SLEEP_CHUNK_MS);
            thread::sleep(Duration::from_millis(chunk));
            waited += chunk;
        }
        !self.is_cancelled()
    }
}
