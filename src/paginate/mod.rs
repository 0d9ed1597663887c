//! Continuation engine
//!
//! Drives multi-round calls against paginated endpoints. Each paginated
//! operation owns an independent [`ContinuationState`]; all rounds still
//! funnel through the shared [`DispatchQueue`], so concurrent paginated
//! operations interleave at round granularity under the global throttle.
//!
//! The engine is an explicit state machine driven by a loop — never
//! recursive closures — so stack depth stays bounded for long pagination
//! sequences:
//!
//! ```text
//! Init ──> Fetch ──> Decide ──> Done
//!            ^          │
//!            └──────────┘  (tokens returned, target not reached)
//! ```
//!
//! Round one is enqueued at the caller's priority; every later round is
//! priority, since a continuation is a direct follow-up the caller is
//! already waiting on. Any round failure aborts the whole sequence and the
//! partial accumulation is discarded — the contract is all-or-nothing per
//! operation.

use crate::decode;
use crate::error::Result;
use crate::queue::DispatchQueue;
use crate::types::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Parameters of one paginated operation
#[derive(Debug, Clone)]
pub struct ContinuationConfig {
    /// Base parameters, re-sent on every round
    pub params: BTreeMap<String, String>,
    /// Endpoint-specific cursor parameter name (`rvcontinue`, `cmcontinue`, ...)
    pub cursor_param: String,
    /// Stop once this many items are accumulated; `None` runs until the
    /// endpoint stops returning tokens
    pub target: Option<usize>,
}

/// Per-operation accumulation state
#[derive(Debug, Clone, Default)]
pub struct ContinuationState {
    /// Primary continuation token from the previous round
    pub token: Option<String>,
    /// Endpoint-specific cursor token from the previous round
    pub cursor: Option<String>,
    /// Items gathered so far; never exceeds a bounded target
    pub accumulated: Vec<Value>,
    /// Bounded target count, if any
    pub target: Option<usize>,
    /// Completed fetch rounds
    pub rounds: u32,
}

impl ContinuationState {
    fn new(target: Option<usize>) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    fn reached_target(&self) -> bool {
        self.target
            .is_some_and(|target| self.accumulated.len() >= target)
    }

    fn absorb(&mut self, items: Vec<Value>) {
        for item in items {
            if self.reached_target() {
                break;
            }
            self.accumulated.push(item);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Fetch,
    Decide,
    Done,
}

/// Run a paginated operation to completion
///
/// `extract` pulls the round's items out of each response body. Returns the
/// final response body (for summary fields such as the canonical title)
/// together with the accumulated items.
pub async fn run<F>(
    queue: &DispatchQueue,
    config: ContinuationConfig,
    priority: bool,
    mut extract: F,
) -> Result<(Value, Vec<Value>)>
where
    F: FnMut(&Value) -> Result<Vec<Value>>,
{
    let mut state = ContinuationState::new(config.target);
    let mut last_body = Value::Null;
    let mut phase = Phase::Init;

    loop {
        match phase {
            Phase::Init => {
                phase = Phase::Fetch;
            }
            Phase::Fetch => {
                let mut round_params = config.params.clone();
                // The API expects `continue` on every round: empty on the
                // first, echoed verbatim afterwards, with the cursor alongside.
                round_params.insert(
                    "continue".to_string(),
                    state.token.clone().unwrap_or_default(),
                );
                if let Some(cursor) = &state.cursor {
                    round_params.insert(config.cursor_param.clone(), cursor.clone());
                }

                let round_priority = if state.rounds == 0 { priority } else { true };
                let body = queue
                    .enqueue(round_params, Method::Get, round_priority)
                    .wait()
                    .await?;
                decode::check_api_error(&body)?;

                state.rounds += 1;
                let items = extract(&body)?;
                debug!(
                    round = state.rounds,
                    items = items.len(),
                    total = state.accumulated.len(),
                    "continuation round complete"
                );
                state.absorb(items);
                last_body = body;
                phase = Phase::Decide;
            }
            Phase::Decide => {
                phase = match decode::continue_tokens(&last_body, &config.cursor_param) {
                    Some((token, cursor)) if !state.reached_target() => {
                        state.token = Some(token);
                        state.cursor = Some(cursor);
                        Phase::Fetch
                    }
                    _ => Phase::Done,
                };
            }
            Phase::Done => {
                debug!(
                    rounds = state.rounds,
                    items = state.accumulated.len(),
                    "continuation finished"
                );
                return Ok((last_body, state.accumulated));
            }
        }
    }
}

#[cfg(test)]
mod tests;
