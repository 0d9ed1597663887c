//! Deferred completion handles
//!
//! A [`Deferred<T>`] is a single-resolution future with multicast observers:
//! exactly one of [`resolve`](Deferred::resolve) / [`reject`](Deferred::reject)
//! takes effect, any number of completion and error callbacks may be attached
//! before or after resolution, and callbacks fire once each in registration
//! order. Every public client operation returns one of these.
//!
//! Callbacks never run while the handle's internal lock is held, so attaching
//! a callback to an already-resolved handle cannot recurse into the operation
//! that resolved it. Async code can also `wait()` on the handle directly.

use crate::error::{Error, Result};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

type CompleteFn<T> = Box<dyn FnOnce(&T) + Send>;
type ErrorFn = Box<dyn FnOnce(&Error) + Send>;

enum State<T> {
    Pending {
        on_complete: Vec<CompleteFn<T>>,
        on_error: Vec<ErrorFn>,
    },
    Fulfilled(T),
    Rejected(Error),
}

struct Inner<T> {
    state: Mutex<State<T>>,
    notify: Notify,
}

/// A single-resolution completion handle with multicast observers
pub struct Deferred<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deferred<T> {
    /// Create a new pending handle
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::Pending {
                    on_complete: Vec::new(),
                    on_error: Vec::new(),
                }),
                notify: Notify::new(),
            }),
        }
    }

    /// Check whether the handle is still pending
    pub fn is_pending(&self) -> bool {
        matches!(*self.lock(), State::Pending { .. })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State<T>> {
        self.inner.state.lock().expect("deferred state lock poisoned")
    }
}

impl<T: Clone + Send + 'static> Deferred<T> {
    /// Resolve the handle with a value
    ///
    /// A no-op if the handle has already been resolved or rejected. All
    /// completion callbacks registered so far fire in registration order,
    /// after the internal lock is released.
    pub fn resolve(&self, value: T) {
        let callbacks = {
            let mut state = self.lock();
            match &mut *state {
                State::Pending { on_complete, .. } => {
                    let callbacks = std::mem::take(on_complete);
                    *state = State::Fulfilled(value.clone());
                    callbacks
                }
                _ => return,
            }
        };
        for callback in callbacks {
            callback(&value);
        }
        self.inner.notify.notify_waiters();
    }

    /// Reject the handle with an error
    ///
    /// A no-op if the handle has already been resolved or rejected. All error
    /// callbacks registered so far fire in registration order.
    pub fn reject(&self, error: Error) {
        let callbacks = {
            let mut state = self.lock();
            match &mut *state {
                State::Pending { on_error, .. } => {
                    let callbacks = std::mem::take(on_error);
                    *state = State::Rejected(error.clone());
                    callbacks
                }
                _ => return,
            }
        };
        for callback in callbacks {
            callback(&error);
        }
        self.inner.notify.notify_waiters();
    }

    /// Attach a completion callback
    ///
    /// Fires once with the resolved value. If the handle is already
    /// fulfilled, the callback fires immediately with the stored value; if it
    /// is rejected, the callback is dropped.
    pub fn on_complete(&self, callback: impl FnOnce(&T) + Send + 'static) -> &Self {
        let fire_with = {
            let mut state = self.lock();
            match &mut *state {
                State::Pending { on_complete, .. } => {
                    on_complete.push(Box::new(callback));
                    return self;
                }
                State::Fulfilled(value) => Some(value.clone()),
                State::Rejected(_) => None,
            }
        };
        // The lock is released before an already-stored value is delivered.
        if let Some(value) = fire_with {
            callback(&value);
        }
        self
    }

    /// Attach an error callback
    ///
    /// Fires once with the rejection error. If the handle is already
    /// rejected, the callback fires immediately with the stored error; if it
    /// is fulfilled, the callback is dropped.
    pub fn on_error(&self, callback: impl FnOnce(&Error) + Send + 'static) -> &Self {
        let fire_with = {
            let mut state = self.lock();
            match &mut *state {
                State::Pending { on_error, .. } => {
                    on_error.push(Box::new(callback));
                    return self;
                }
                State::Rejected(error) => Some(error.clone()),
                State::Fulfilled(_) => None,
            }
        };
        if let Some(error) = fire_with {
            callback(&error);
        }
        self
    }

    /// Wait for the handle to resolve, returning the outcome
    pub async fn wait(&self) -> Result<T> {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register as a waiter before checking state, so a resolution
            // landing in between still wakes this task.
            notified.as_mut().enable();
            {
                let state = self.lock();
                match &*state {
                    State::Fulfilled(value) => return Ok(value.clone()),
                    State::Rejected(error) => return Err(error.clone()),
                    State::Pending { .. } => {}
                }
            }
            notified.await;
        }
    }

    /// Spawn a task and surface its result through a new handle
    ///
    /// Must be called from within a Tokio runtime.
    pub fn from_task<F>(task: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let handle = Self::new();
        let resolver = handle.clone();
        tokio::spawn(async move {
            match task.await {
                Ok(value) => resolver.resolve(value),
                Err(error) => resolver.reject(error),
            }
        });
        handle
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.lock() {
            State::Pending { .. } => "Pending",
            State::Fulfilled(_) => "Fulfilled",
            State::Rejected(_) => "Rejected",
        };
        f.debug_struct("Deferred").field("state", &state).finish()
    }
}
