use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Instant;

// -----------------------------------------------------------------------------
// ReadyGate

/// One-shot readiness flag other threads can block on.
///
/// Meant for `on_encode_start` hooks of objects whose state is produced
/// asynchronously: the hook waits until the producer marked the object ready.
///
/// Once ready, a gate stays ready. Checking an open gate only reads an atomic.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use vc_rtti::sync::ReadyGate;
///
/// let gate = Arc::new(ReadyGate::new());
///
/// let producer = {
///     let gate = Arc::clone(&gate);
///     thread::spawn(move || gate.mark_ready())
/// };
///
/// gate.wait();
/// assert!(gate.is_ready());
/// producer.join().unwrap();
/// ```
#[derive(Debug, Default)]
pub struct ReadyGate {
    ready: AtomicBool,
    lock: Mutex<()>,
    signal: Condvar,
}

impl ReadyGate {
    #[inline]
    pub const fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            lock: Mutex::new(()),
            signal: Condvar::new(),
        }
    }

    /// Create a gate that is already open.
    #[inline]
    pub const fn ready() -> Self {
        Self {
            ready: AtomicBool::new(true),
            lock: Mutex::new(()),
            signal: Condvar::new(),
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Open the gate and wake every waiter.
    pub fn mark_ready(&self) {
        // Flip under the lock so a waiter cannot check the flag and then
        // miss the notification.
        let guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.ready.store(true, Ordering::Release);
        drop(guard);
        self.signal.notify_all();
    }

    /// Block until the gate is open.
    pub fn wait(&self) {
        if self.is_ready() {
            return;
        }
        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !self.is_ready() {
            guard = self
                .signal
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until the gate is open or `timeout` elapsed.
    ///
    /// Returns `true` if the gate is open. A timeout past the range of
    /// [`Instant`] waits like [`wait`](Self::wait).
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_ready() {
            return true;
        }
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait();
            return true;
        };
        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !self.is_ready() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            guard = self
                .signal
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}
