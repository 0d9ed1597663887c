//! Tests for the continuation engine

use super::*;
use crate::error::Error;
use crate::transport::testing::FakeTransport;
use crate::types::params;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

fn test_queue(transport: Arc<FakeTransport>) -> DispatchQueue {
    let endpoint = Url::parse("https://wiki.example.org/api.php").unwrap();
    DispatchQueue::new(transport, endpoint, Duration::from_millis(1))
}

/// A round body with `count` member items and, optionally, continuation tokens
fn member_round(offset: usize, count: usize, cursor: Option<&str>) -> String {
    let members: Vec<_> = (0..count)
        .map(|i| json!({"title": format!("Page {}", offset + i), "ns": 0}))
        .collect();
    let mut body = json!({"query": {"categorymembers": members}});
    if let Some(cursor) = cursor {
        body["continue"] = json!({"continue": "-||", "cmcontinue": cursor});
    }
    body.to_string()
}

fn extract_members(body: &Value) -> Result<Vec<Value>> {
    Ok(body
        .pointer("/query/categorymembers")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default())
}

fn members_config(target: Option<usize>) -> ContinuationConfig {
    ContinuationConfig {
        params: params(&[("action", "query"), ("list", "categorymembers")]),
        cursor_param: "cmcontinue".to_string(),
        target,
    }
}

#[tokio::test(start_paused = true)]
async fn terminates_after_exactly_k_rounds() {
    // Tokens on rounds 1..k-1, none on round k, with k = 3.
    let transport = FakeTransport::new(vec![
        Ok(member_round(0, 2, Some("c1"))),
        Ok(member_round(2, 2, Some("c2"))),
        Ok(member_round(4, 1, None)),
    ]);
    let queue = test_queue(Arc::clone(&transport));

    let (_, items) = run(&queue, members_config(None), false, extract_members)
        .await
        .unwrap();

    assert_eq!(transport.call_count(), 3);
    let titles: Vec<&str> = items
        .iter()
        .map(|item| item["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Page 0", "Page 1", "Page 2", "Page 3", "Page 4"]);
}

#[tokio::test(start_paused = true)]
async fn bounded_target_stops_and_truncates() {
    // 2 items per round with endless tokens; a target of 3 must stop after
    // round 2 and keep exactly 3 items.
    let transport = FakeTransport::new(vec![
        Ok(member_round(0, 2, Some("c1"))),
        Ok(member_round(2, 2, Some("c2"))),
        Ok(member_round(4, 2, Some("c3"))),
    ]);
    let queue = test_queue(Arc::clone(&transport));

    let (_, items) = run(&queue, members_config(Some(3)), false, extract_members)
        .await
        .unwrap();

    assert_eq!(transport.call_count(), 2);
    assert_eq!(items.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn cursor_tokens_are_echoed_on_follow_up_rounds() {
    let transport = FakeTransport::new(vec![
        Ok(member_round(0, 1, Some("cursor-a"))),
        Ok(member_round(1, 1, None)),
    ]);
    let queue = test_queue(Arc::clone(&transport));

    run(&queue, members_config(None), false, extract_members)
        .await
        .unwrap();

    // Round 1 sends an empty `continue` and no cursor; round 2 echoes both.
    assert_eq!(transport.param_trace("continue"), vec!["", "-||"]);
    assert_eq!(transport.param_trace("cmcontinue"), vec!["cursor-a"]);
}

#[tokio::test(start_paused = true)]
async fn round_failure_aborts_and_discards_partial_results() {
    let transport = FakeTransport::new(vec![
        Ok(member_round(0, 2, Some("c1"))),
        Err(Error::transport("connection reset")),
    ]);
    let queue = test_queue(Arc::clone(&transport));

    let err = run(&queue, members_config(None), false, extract_members)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport { .. }));
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn api_error_payload_aborts_the_sequence() {
    let transport = FakeTransport::new(vec![Ok(
        json!({"error": {"code": "readapidenied", "info": "Read not allowed"}}).to_string(),
    )]);
    let queue = test_queue(Arc::clone(&transport));

    let err = run(&queue, members_config(None), false, extract_members)
        .await
        .unwrap_err();
    assert!(err.is_api());
}

#[tokio::test(start_paused = true)]
async fn empty_round_without_tokens_yields_empty_result() {
    let transport = FakeTransport::new(vec![Ok(member_round(0, 0, None))]);
    let queue = test_queue(Arc::clone(&transport));

    let (_, items) = run(&queue, members_config(Some(10)), false, extract_members)
        .await
        .unwrap();
    assert!(items.is_empty());
    assert_eq!(transport.call_count(), 1);
}
