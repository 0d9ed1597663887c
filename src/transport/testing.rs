//! Scripted transport for unit tests
//!
//! Resolves calls from a queue of canned outcomes while recording every call
//! with its dispatch instant, so queue and continuation tests can assert
//! ordering and throttle spacing on Tokio's paused clock.

use super::Transport;
use crate::error::{Error, Result};
use crate::types::Method;
use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

pub(crate) struct RecordedCall {
    pub method: Method,
    pub params: BTreeMap<String, String>,
    pub at: Instant,
}

pub(crate) struct FakeTransport {
    responses: Mutex<VecDeque<Result<String>>>,
    pub calls: Mutex<Vec<RecordedCall>>,
    delay: Duration,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeTransport {
    pub fn new(responses: Vec<Result<String>>) -> Arc<Self> {
        Self::with_delay(responses, Duration::ZERO)
    }

    pub fn with_delay(responses: Vec<Result<String>>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_instants(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|c| c.at).collect()
    }

    /// The value of a marker parameter for each recorded call, in order
    pub fn param_trace(&self, key: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| c.params.get(key).cloned())
            .collect()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(
        &self,
        method: Method,
        _endpoint: &Url,
        params: &BTreeMap<String, String>,
    ) -> Result<String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.calls.lock().unwrap().push(RecordedCall {
            method,
            params: params.clone(),
            at: Instant::now(),
        });

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::transport("fake transport exhausted")))
    }
}
