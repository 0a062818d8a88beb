/*
 *  queue.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Task decoupler - bounded, timeout aware hand-off into the main loop
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

//! Deferred-execution queue
//!
//! Network producers run preemptively; the render loop is cooperative. A
//! [`TaskDecoupler`] moves work from the former to the latter through a
//! fixed-capacity FIFO. Every blocking operation is bounded by a timeout so
//! the main loop latency stays bounded and producers fail fast on overflow.

use std::fmt;
use std::time::Duration;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use parking_lot::RwLock;
use thiserror::Error;

/// Default bounded wait for enqueue and dequeue
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

/// Queue failure; a rejected item is handed back to the caller
#[derive(Error)]
pub enum QueueError<T> {
    #[error("queue capacity must be at least 1")]
    Capacity,

    #[error("queue is not initialized")]
    Uninitialized(T),

    #[error("queue is full")]
    Full(T),

    #[error("queue is empty")]
    Empty,
}

impl<T> QueueError<T> {
    /// Recover the rejected item, if the failure carried one
    pub fn into_inner(self) -> Option<T> {
        match self {
            QueueError::Uninitialized(item) | QueueError::Full(item) => Some(item),
            QueueError::Capacity | QueueError::Empty => None,
        }
    }
}

impl<T> fmt::Debug for QueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Capacity => write!(f, "Capacity"),
            QueueError::Uninitialized(_) => write!(f, "Uninitialized(..)"),
            QueueError::Full(_) => write!(f, "Full(..)"),
            QueueError::Empty => write!(f, "Empty"),
        }
    }
}

/// Bounded multi-producer, single-consumer FIFO with timeouts
///
/// All methods take `&self`, so one instance can be shared between the
/// producing network task and the main loop behind an `Arc`.
pub struct TaskDecoupler<T> {
    channel: RwLock<Option<(Sender<T>, Receiver<T>)>>,
    capacity: RwLock<usize>,
    timeout: Duration,
}

impl<T> Default for TaskDecoupler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskDecoupler<T> {
    /// Uninitialized queue; `init` must be called before use
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            channel: RwLock::new(None),
            capacity: RwLock::new(0),
            timeout,
        }
    }

    /// (Re)create the queue with room for `capacity` items
    ///
    /// Any previous queue is dropped together with its unconsumed items.
    pub fn init(&self, capacity: usize) -> Result<(), QueueError<T>> {
        if capacity == 0 {
            return Err(QueueError::Capacity);
        }
        let previous = self.channel.write().replace(bounded(capacity));
        *self.capacity.write() = capacity;
        if let Some((_, rx)) = previous {
            let dropped = rx.try_iter().count();
            if dropped > 0 {
                log::warn!("queue re-initialized, {} pending items discarded", dropped);
            }
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.channel.read().is_some()
    }

    pub fn capacity(&self) -> usize {
        *self.capacity.read()
    }

    /// Number of items waiting
    pub fn len(&self) -> usize {
        self.channel.read().as_ref().map_or(0, |(_, rx)| rx.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enqueue, waiting at most the configured timeout while full
    pub fn add_item(&self, item: T) -> Result<(), QueueError<T>> {
        // clone the sender so a concurrent init never blocks on a full queue
        let tx = match self.channel.read().as_ref() {
            Some((tx, _)) => tx.clone(),
            None => return Err(QueueError::Uninitialized(item)),
        };
        tx.send_timeout(item, self.timeout).map_err(|e| match e {
            SendTimeoutError::Timeout(item) | SendTimeoutError::Disconnected(item) => {
                QueueError::Full(item)
            }
        })
    }

    /// Dequeue, waiting at most the configured timeout while empty
    pub fn get_item(&self) -> Result<T, QueueError<T>> {
        let rx = match self.channel.read().as_ref() {
            Some((_, rx)) => rx.clone(),
            None => return Err(QueueError::Empty),
        };
        rx.recv_timeout(self.timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected => QueueError::Empty,
        })
    }

    /// Dequeue without waiting
    pub fn try_get_item(&self) -> Option<T> {
        self.channel.read().as_ref().and_then(|(_, rx)| rx.try_recv().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    fn queue(capacity: usize) -> TaskDecoupler<u32> {
        let q = TaskDecoupler::with_timeout(Duration::from_millis(10));
        assert!(q.init(capacity).is_ok());
        q
    }

    #[test]
    fn test_uninitialized_returns_item() {
        let q: TaskDecoupler<u32> = TaskDecoupler::new();
        let err = q.add_item(7).unwrap_err();
        assert!(matches!(err, QueueError::Uninitialized(7)));
        assert_eq!(err.into_inner(), Some(7));
        assert!(matches!(q.get_item(), Err(QueueError::Empty)));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let q: TaskDecoupler<u32> = TaskDecoupler::new();
        assert!(matches!(q.init(0), Err(QueueError::Capacity)));
        assert!(!q.is_initialized());
    }

    #[test]
    fn test_fifo_and_overflow() {
        let q = queue(3);
        for i in 0..3 {
            assert!(q.add_item(i).is_ok());
        }
        let err = q.add_item(99).unwrap_err();
        assert_eq!(err.into_inner(), Some(99));
        assert_eq!(q.len(), 3);
        let drained: Vec<u32> = (0..3).filter_map(|_| q.get_item().ok()).collect();
        assert_eq!(drained, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_dequeue_times_out_and_queue_stays_usable() {
        let q = queue(1);
        let start = Instant::now();
        assert!(matches!(q.get_item(), Err(QueueError::Empty)));
        assert!(start.elapsed() >= Duration::from_millis(10));
        assert!(q.add_item(5).is_ok());
        assert_eq!(q.get_item().ok(), Some(5));
    }

    #[test]
    fn test_reinit_discards_pending() {
        let q = queue(2);
        assert!(q.add_item(1).is_ok());
        assert!(q.init(4).is_ok());
        assert_eq!(q.capacity(), 4);
        assert!(q.is_empty());
        assert!(q.try_get_item().is_none());
    }

    #[test]
    fn test_multi_producer() {
        let q = Arc::new(queue(64));
        let handles: Vec<_> = (0..4u32)
            .map(|p| {
                let q = Arc::clone(&q);
                thread::spawn(move || {
                    for i in 0..8 {
                        assert!(q.add_item(p * 100 + i).is_ok());
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let mut got: Vec<u32> = std::iter::from_fn(|| q.try_get_item()).collect();
        assert_eq!(got.len(), 32);
        // per-producer order is preserved
        for p in 0..4u32 {
            let mine: Vec<u32> = got.iter().copied().filter(|v| v / 100 == p).collect();
            let mut sorted = mine.clone();
            sorted.sort_unstable();
            assert_eq!(mine, sorted);
        }
        got.sort_unstable();
        got.dedup();
        assert_eq!(got.len(), 32);
    }
}
