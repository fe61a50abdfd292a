//! Observable values.
//!
//! An [`Observable`] holds a current value and tells its subscribers about
//! changes. Subscribers receive the current value as soon as they subscribe
//! and then every subsequent change. Setting a value equal to the current one
//! is not a change and notifies nobody.
//!
//! Two ways to listen:
//!
//! - [`Observable::subscribe`] registers a callback that runs synchronously,
//!   on the thread that calls [`Observable::set`].
//! - [`Observable::watch`] hands out a `tokio::sync::watch::Receiver` for
//!   async consumers.
//!
//! Callbacks run on the caller's thread while the subscriber list is locked.
//! Inside a callback, `get` and `watch` on any observable are fine, and so
//! is `set` on a different observable. Calling `set`, `subscribe` or
//! `unsubscribe` on the observable that invoked the callback deadlocks, as
//! does anything that waits on a lock held by whoever called `set`. The
//! ticker only calls `set` with the engine locked, which is why its queries
//! never take that lock.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

type Callback<T> = Box<dyn FnMut(&T) + Send>;

/// Handle returned by [`Observable::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Inner<T> {
    sender: watch::Sender<T>,
    subscribers: Mutex<Vec<(SubscriptionId, Callback<T>)>>,
    next_id: AtomicU64,
}

/// A shared, observable value. Cloning yields another handle to the same value.
pub struct Observable<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.inner.sender.borrow())
            .finish()
    }
}

impl<T> Observable<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            inner: Arc::new(Inner {
                sender,
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.sender.borrow().clone()
    }

    /// Store `value` and notify subscribers if it differs from the current one.
    ///
    /// Returns whether the value changed.
    pub fn set(&self, value: T) -> bool {
        let modified = self.inner.sender.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value.clone();
                true
            }
        });
        if modified {
            for (_, callback) in self.subscribers().iter_mut() {
                callback(&value);
            }
        }
        modified
    }

    /// Register `callback`; it is invoked immediately with the current value.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: FnMut(&T) + Send + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let mut callback: Callback<T> = Box::new(callback);
        let current = self.get();
        let mut subscribers = self.subscribers();
        callback(&current);
        subscribers.push((id, callback));
        id
    }

    /// Returns `true` if the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers();
        let before = subscribers.len();
        subscribers.retain(|(sub, _)| *sub != id);
        subscribers.len() != before
    }

    /// Async receiver. The current value counts as unseen, so the first
    /// `changed().await` resolves immediately.
    pub fn watch(&self) -> watch::Receiver<T> {
        let mut rx = self.inner.sender.subscribe();
        rx.mark_changed();
        rx
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Callback<T>)>> {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for Observable<T>
where
    T: Clone + PartialEq + Default + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}
