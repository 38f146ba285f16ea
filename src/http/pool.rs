//! Recycling allocator for per-request value holders.
//!
//! Every read cycle needs a fresh [`Request`](crate::http::request::Request)
//! and [`Response`](crate::http::response::Response). Their maps and buffers
//! keep their heap capacity when they go back to the pool, so a busy
//! connection stops allocating once the pool is warm.

use std::sync::Mutex;

/// Number of idle instances kept per pool.
pub const DEFAULT_POOL_CAPACITY: usize = 256;

/// Values that can be returned to a [`Pool`].
///
/// `recycle` drops per-request contents but should keep allocations around.
pub trait Recycle {
    fn recycle(&mut self);
}

/// A bounded free-list shared by all connection tasks.
#[derive(Debug)]
pub struct Pool<T> {
    free: Mutex<Vec<T>>,
    capacity: usize,
}

impl<T: Default + Recycle> Pool<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Takes an idle instance, or builds a new one if the pool is empty.
    ///
    /// The instance may carry state from an earlier cycle; callers overwrite
    /// everything they rely on.
    pub fn acquire(&self) -> T {
        self.free
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop()
            .unwrap_or_default()
    }

    /// Hands an instance back. It must not be used afterwards, which the
    /// move into this call enforces.
    pub fn release(&self, mut value: T) {
        value.recycle();
        let mut free = self.free.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if free.len() < self.capacity {
            free.push(value);
        }
    }

    /// Number of instances currently waiting to be reused.
    pub fn idle(&self) -> usize {
        self.free
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl<T: Default + Recycle> Default for Pool<T> {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}
