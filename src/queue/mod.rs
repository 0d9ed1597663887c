//! Dispatch queue
//!
//! The sole arbiter of call ordering. All outbound calls funnel through one
//! [`DispatchQueue`] per client, which enforces three invariants:
//!
//! - **Priority ordering**: the queue is two merged FIFOs — priority entries
//!   always overtake normal ones, and entries within the same class are never
//!   reordered amongst themselves.
//! - **Throttle spacing**: consecutive dispatches are spaced by at least the
//!   configured minimum interval, measured from the completion of the
//!   previous call.
//! - **Single flight**: at most one call is outstanding at any instant.
//!
//! An entry is removed from the queue at the moment it is scheduled, not when
//! it completes, so an enqueue landing during the throttle delay is ordered
//! after the entry already committed to dispatch. A failed entry rejects only
//! its own handle; the loop proceeds to the next entry unconditionally.
//!
//! There is no cancellation: once enqueued, an entry always eventually
//! dispatches.

use crate::decode;
use crate::promise::Deferred;
use crate::transport::Transport;
use crate::types::Method;
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};
use url::Url;

/// One pending call, immutable once enqueued
struct QueueEntry {
    params: BTreeMap<String, String>,
    method: Method,
    priority: bool,
    handle: Deferred<Value>,
    enqueued_at: Instant,
}

/// Throttle clock and in-flight flag, owned per queue instance
struct ThrottleState {
    next_allowed: Instant,
    in_flight: bool,
}

struct QueueState {
    entries: VecDeque<QueueEntry>,
    throttle: ThrottleState,
}

struct Shared {
    transport: Arc<dyn Transport>,
    endpoint: Url,
    min_interval: Duration,
    state: Mutex<QueueState>,
}

/// Single-flight, throttled, priority-ordered dispatch queue
///
/// Cheap to clone; clones share the same queue and throttle clock. Separate
/// queues (one per client instance) are fully independent.
#[derive(Clone)]
pub struct DispatchQueue {
    shared: Arc<Shared>,
}

impl DispatchQueue {
    /// Create a queue over a transport
    pub fn new(transport: Arc<dyn Transport>, endpoint: Url, min_interval: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport,
                endpoint,
                min_interval,
                state: Mutex::new(QueueState {
                    entries: VecDeque::new(),
                    throttle: ThrottleState {
                        next_allowed: Instant::now(),
                        in_flight: false,
                    },
                }),
            }),
        }
    }

    /// Enqueue one call and return its completion handle
    ///
    /// `format=json` is added to the parameters here so every call carries
    /// it. Priority entries are inserted behind already-queued priority
    /// entries but ahead of all normal ones. Must be called from within a
    /// Tokio runtime.
    pub fn enqueue(
        &self,
        mut params: BTreeMap<String, String>,
        method: Method,
        priority: bool,
    ) -> Deferred<Value> {
        params.insert("format".to_string(), "json".to_string());

        let handle = Deferred::new();
        let entry = QueueEntry {
            params,
            method,
            priority,
            handle: handle.clone(),
            enqueued_at: Instant::now(),
        };

        {
            let mut state = self.lock();
            if priority {
                let class_end = state
                    .entries
                    .iter()
                    .take_while(|queued| queued.priority)
                    .count();
                state.entries.insert(class_end, entry);
            } else {
                state.entries.push_back(entry);
            }
        }

        self.pump();
        handle
    }

    /// Number of entries waiting for dispatch (not counting any in flight)
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Check whether no entries are waiting
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.shared.state.lock().expect("queue state lock poisoned")
    }

    /// Attempt to schedule the head entry
    ///
    /// Runs after every enqueue and after every completed call. A no-op when
    /// the queue is empty or a call is already in flight. The head entry is
    /// removed and marked in flight here, at scheduling time.
    fn pump(&self) {
        let (entry, delay) = {
            let mut state = self.lock();
            if state.throttle.in_flight {
                return;
            }
            let Some(entry) = state.entries.pop_front() else {
                return;
            };
            state.throttle.in_flight = true;
            let delay = state
                .throttle
                .next_allowed
                .saturating_duration_since(Instant::now());
            (entry, delay)
        };

        let queue = self.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            queue.dispatch(entry).await;
            {
                let mut state = queue.lock();
                state.throttle.next_allowed = Instant::now() + queue.shared.min_interval;
                state.throttle.in_flight = false;
            }
            queue.pump();
        });
    }

    /// Send one entry and resolve its handle
    async fn dispatch(&self, entry: QueueEntry) {
        debug!(
            method = %entry.method,
            priority = entry.priority,
            queued_ms = entry.enqueued_at.elapsed().as_millis() as u64,
            "dispatching call"
        );

        let outcome = self
            .shared
            .transport
            .send(entry.method, &self.shared.endpoint, &entry.params)
            .await;

        match outcome {
            Ok(raw) => match decode::decode_body(&raw) {
                Ok(value) => entry.handle.resolve(value),
                Err(error) => {
                    warn!(%error, "response decode failed");
                    entry.handle.reject(error);
                }
            },
            Err(error) => {
                warn!(%error, "call failed");
                entry.handle.reject(error);
            }
        }
    }
}

impl std::fmt::Debug for DispatchQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("DispatchQueue")
            .field("pending", &state.entries.len())
            .field("in_flight", &state.throttle.in_flight)
            .finish_non_exhaustive()
    }
}
