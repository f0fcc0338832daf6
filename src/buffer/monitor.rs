//! Monitor-style buffer: one mutex held across the wait loop plus two condition variables.

use std::sync::{Condvar, Mutex};

use super::ring::Ring;
use super::{BoundedBuffer, Strategy};
use crate::error::BufferError;
use crate::types::Item;

pub struct MonitorBuffer {
    inner: Mutex<MonitorState>,
    not_full: Condvar,
    not_empty: Condvar,
}

struct MonitorState {
    ring: Ring,
    closed: bool,
}

impl MonitorBuffer {
    pub fn new(capacity: usize) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::ZeroCapacity);
        }
        Ok(Self {
            inner: Mutex::new(MonitorState {
                ring: Ring::new(capacity),
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        })
    }
}

impl BoundedBuffer for MonitorBuffer {
    fn put(&self, item: Item) -> Result<(), Item> {
        let mut guard = self.inner.lock().expect("monitor buffer mutex poisoned");
        loop {
            if guard.closed {
                return Err(item);
            }
            if !guard.ring.is_full() {
                break;
            }
            // Wait releases the lock and re-acquires it before returning.
            guard = self.not_full.wait(guard).expect("condvar wait failed");
        }
        guard.ring.push(item);
        self.not_empty.notify_one();
        Ok(())
    }

    fn get(&self) -> Option<Item> {
        let mut guard = self.inner.lock().expect("monitor buffer mutex poisoned");
        loop {
            if let Some(item) = guard.ring.pop() {
                self.not_full.notify_one();
                return Some(item);
            }
            if guard.closed {
                return None;
            }
            guard = self.not_empty.wait(guard).expect("condvar wait failed");
        }
    }

    fn close(&self) {
        let mut guard = self.inner.lock().expect("monitor buffer mutex poisoned");
        guard.closed = true;
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    fn len(&self) -> usize {
        let guard = self.inner.lock().expect("monitor buffer mutex poisoned");
        guard.ring.len()
    }

    fn capacity(&self) -> usize {
        let guard = self.inner.lock().expect("monitor buffer mutex poisoned");
        guard.ring.capacity()
    }

    fn max_occupancy(&self) -> usize {
        let guard = self.inner.lock().expect("monitor buffer mutex poisoned");
        guard.ring.high_water()
    }

    fn strategy(&self) -> Strategy {
        Strategy::Monitor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::mpsc;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn blocking_getters_each_get_unique_item() {
        let buffer = Arc::new(MonitorBuffer::new(2).expect("build buffer"));
        let consumers = 4;
        let barrier = Arc::new(Barrier::new(consumers));
        let (ready_tx, ready_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();

        let mut handles = Vec::new();
        for _ in 0..consumers {
            let buffer = Arc::clone(&buffer);
            let barrier = Arc::clone(&barrier);
            let ready_tx = ready_tx.clone();
            let done_tx = done_tx.clone();
            handles.push(thread::spawn(move || {
                barrier.wait();
                ready_tx.send(()).expect("ready");
                let item = buffer.get().expect("buffer closed");
                done_tx.send(item.id).expect("done");
            }));
        }

        for _ in 0..consumers {
            ready_rx
                .recv_timeout(Duration::from_secs(1))
                .expect("ready recv");
        }

        // Capacity is smaller than the number of waiters, so puts also wait on not_full.
        for id in 0..consumers as u64 {
            buffer.put(Item::new(id)).expect("buffer closed");
        }

        let mut seen = HashSet::new();
        for _ in 0..consumers {
            let id = done_rx
                .recv_timeout(Duration::from_secs(1))
                .expect("done recv");
            assert!(seen.insert(id));
        }

        for handle in handles {
            handle.join().expect("consumer thread panicked");
        }
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn put_after_close_returns_item() {
        let buffer = MonitorBuffer::new(1).expect("build buffer");
        buffer.close();
        let result = buffer.put(Item::new(1));
        assert_eq!(result, Err(Item::new(1)));
        assert_eq!(buffer.len(), 0);
    }
}
