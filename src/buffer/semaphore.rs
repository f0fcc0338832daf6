//! Semaphore-style buffer: slot counting lives in two semaphores, the mutex only guards the ring.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};

use super::ring::Ring;
use super::{BoundedBuffer, Strategy};
use crate::error::BufferError;
use crate::types::Item;

/// Closable counting semaphore.
///
/// After `close`, remaining permits are still handed out; `acquire` returns
/// `false` instead of blocking once none are left.
pub struct Semaphore {
    state: Mutex<SemaphoreState>,
    available: Condvar,
}

struct SemaphoreState {
    permits: usize,
    closed: bool,
}

impl Semaphore {
    pub fn new(permits: usize) -> Self {
        Self {
            state: Mutex::new(SemaphoreState {
                permits,
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Take one permit, blocking while none are available.
    pub fn acquire(&self) -> bool {
        let mut guard = self.state.lock().expect("semaphore mutex poisoned");
        loop {
            if guard.permits > 0 {
                guard.permits -= 1;
                return true;
            }
            if guard.closed {
                return false;
            }
            guard = self.available.wait(guard).expect("condvar wait failed");
        }
    }

    /// Return one permit and wake a single waiter.
    pub fn release(&self) {
        let mut guard = self.state.lock().expect("semaphore mutex poisoned");
        guard.permits += 1;
        self.available.notify_one();
    }

    pub fn close(&self) {
        let mut guard = self.state.lock().expect("semaphore mutex poisoned");
        guard.closed = true;
        self.available.notify_all();
    }

    #[cfg(test)]
    fn permits(&self) -> usize {
        let guard = self.state.lock().expect("semaphore mutex poisoned");
        guard.permits
    }
}

pub struct SemaphoreBuffer {
    ring: Mutex<Ring>,
    empty_slots: Semaphore,
    filled_slots: Semaphore,
    capacity: usize,
    closed: AtomicBool,
}

impl SemaphoreBuffer {
    pub fn new(capacity: usize) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::ZeroCapacity);
        }
        Ok(Self {
            ring: Mutex::new(Ring::new(capacity)),
            empty_slots: Semaphore::new(capacity),
            filled_slots: Semaphore::new(0),
            capacity,
            closed: AtomicBool::new(false),
        })
    }
}

impl BoundedBuffer for SemaphoreBuffer {
    fn put(&self, item: Item) -> Result<(), Item> {
        // Free slots are still handed out after close; refuse new items up front.
        if self.closed.load(Ordering::SeqCst) || !self.empty_slots.acquire() {
            return Err(item);
        }
        {
            let mut ring = self.ring.lock().expect("semaphore buffer mutex poisoned");
            // close() may have landed after the gate; a drained getter must not miss this item.
            if self.closed.load(Ordering::SeqCst) {
                drop(ring);
                self.empty_slots.release();
                return Err(item);
            }
            ring.push(item);
            // Published under the ring lock so close() sees either no item or its permit.
            self.filled_slots.release();
        }
        Ok(())
    }

    fn get(&self) -> Option<Item> {
        if !self.filled_slots.acquire() {
            return None;
        }
        let item = {
            let mut ring = self.ring.lock().expect("semaphore buffer mutex poisoned");
            ring.pop()
        };
        // A filled-slot permit always pairs with a stored item.
        debug_assert!(item.is_some(), "filled slot permit without an item");
        self.empty_slots.release();
        item
    }

    fn close(&self) {
        {
            // Taken so the flag flips between, never during, a ring update.
            let _ring = self.ring.lock().expect("semaphore buffer mutex poisoned");
            self.closed.store(true, Ordering::SeqCst);
        }
        self.empty_slots.close();
        self.filled_slots.close();
    }

    fn len(&self) -> usize {
        let ring = self.ring.lock().expect("semaphore buffer mutex poisoned");
        ring.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn max_occupancy(&self) -> usize {
        let ring = self.ring.lock().expect("semaphore buffer mutex poisoned");
        ring.high_water()
    }

    fn strategy(&self) -> Strategy {
        Strategy::Semaphore
    }
}
