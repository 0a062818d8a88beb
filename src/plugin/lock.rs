/*
 *  plugin/lock.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Re-entrant lock guarding plugin state
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

use std::cell::RefCell;
use log::error;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

const NESTED_BORROW: &str = "plugin state borrowed inside a with() scope; hold lock() and borrow in sequence";

/// Per plugin re-entrant lock
///
/// The owning thread may acquire it again while already holding it, e.g.
/// `active()` keeps the lock for its whole body and calls a locked getter.
/// Mutable access is handed out through short [`PluginLock::with`] scopes;
/// never call another locked accessor from inside a `with` closure, hold a
/// [`PluginLock::lock`] section instead and borrow in sequence.
pub struct PluginLock<T> {
    inner: ReentrantMutex<RefCell<T>>,
}

impl<T: Default> Default for PluginLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> PluginLock<T> {
    pub fn new(state: T) -> Self {
        Self { inner: ReentrantMutex::new(RefCell::new(state)) }
    }

    /// Explicit critical section, released when the guard drops
    pub fn lock(&self) -> ReentrantMutexGuard<'_, RefCell<T>> {
        self.inner.lock()
    }

    /// Run `f` with exclusive access to the state
    ///
    /// # Panics
    /// When called from inside another `with` or `read` scope on the same
    /// thread. Use [`PluginLock::try_with`] where nesting can happen.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        match self.try_with(f) {
            Some(r) => r,
            None => panic!("{}", NESTED_BORROW),
        }
    }

    /// Run `f` with shared access; may nest inside other `read` calls
    ///
    /// # Panics
    /// When called from inside a `with` scope on the same thread.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        match self.try_read(f) {
            Some(r) => r,
            None => panic!("{}", NESTED_BORROW),
        }
    }

    /// Like [`PluginLock::with`], but a nested borrow is logged and skipped
    pub fn try_with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let guard = self.inner.lock();
        let Ok(mut state) = guard.try_borrow_mut() else {
            error!("{}", NESTED_BORROW);
            return None;
        };
        Some(f(&mut state))
    }

    /// Like [`PluginLock::read`], but a nested borrow is logged and skipped
    pub fn try_read<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.inner.lock();
        let Ok(state) = guard.try_borrow() else {
            error!("{}", NESTED_BORROW);
            return None;
        };
        Some(f(&state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    struct Counter {
        lock: PluginLock<u32>,
    }

    impl Counter {
        fn value(&self) -> u32 {
            self.lock.read(|v| *v)
        }

        fn bump_and_get(&self) -> u32 {
            let _section = self.lock.lock();
            self.lock.with(|v| *v += 1);
            // nested acquisition from the same thread
            self.value()
        }
    }

    #[test]
    fn test_nested_acquisition_does_not_deadlock() {
        let c = Counter { lock: PluginLock::new(0) };
        assert_eq!(c.bump_and_get(), 1);
        assert_eq!(c.bump_and_get(), 2);
    }

    #[test]
    fn test_borrow_inside_with_is_refused() {
        let lock = PluginLock::new(1u32);
        let seen = lock.with(|v| {
            *v += 1;
            (lock.try_read(|v| *v), lock.try_with(|v| *v += 10))
        });
        assert_eq!(seen, (None, None));
        assert_eq!(lock.read(|v| *v), 2);
        // shared borrows nest
        assert_eq!(lock.read(|a| lock.try_read(|b| *a + *b)), Some(4));
    }

    #[test]
    #[should_panic(expected = "borrowed inside a with() scope")]
    fn test_nested_with_names_the_misuse() {
        let lock = PluginLock::new(0u32);
        lock.with(|_| lock.with(|v| *v += 1));
    }

    #[test]
    fn test_excludes_other_threads() {
        let c = Arc::new(Counter { lock: PluginLock::new(0) });
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&c);
                thread::spawn(move || {
                    for _ in 0..250 {
                        c.lock.with(|v| *v += 1);
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(c.value(), 1000);
    }
}
