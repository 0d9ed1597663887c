//! Response decoding
//!
//! Parses raw response bodies into structured JSON and provides the shape
//! helpers the typed operations share. A body that is not well-formed JSON
//! yields a decode error, which rejects the same handle a transport error
//! would — callers cannot distinguish the two at the handle level.

use crate::error::{Error, Result};
use serde_json::Value;

/// Parse a raw response body as JSON
pub fn decode_body(raw: &str) -> Result<Value> {
    serde_json::from_str(raw)
        .map_err(|e| Error::decode(format!("response body is not valid JSON: {e}")))
}

/// Surface a top-level MediaWiki error payload as an [`Error::Api`]
///
/// The API reports request-level failures as
/// `{"error": {"code": ..., "info": ...}}` alongside a 200 status.
pub fn check_api_error(body: &Value) -> Result<()> {
    if let Some(error) = body.get("error") {
        let code = error.get("code").and_then(Value::as_str).unwrap_or("unknown");
        let info = error.get("info").and_then(Value::as_str).unwrap_or("");
        return Err(Error::api(format!("{code}: {info}")));
    }
    Ok(())
}

/// Get the first page object out of a `query.pages` response
///
/// The API keys pages by page ID; the operations this crate wraps always
/// query a single title or revision, so the first entry is the answer.
pub fn first_page(body: &Value) -> Result<&Value> {
    body.pointer("/query/pages")
        .and_then(Value::as_object)
        .and_then(|pages| pages.values().next())
        .ok_or_else(|| Error::decode("response has no pages"))
}

/// Read continuation tokens from a response, if any
///
/// Returns the primary `continue` token paired with the endpoint-specific
/// cursor (e.g. `rvcontinue`, `cmcontinue`). Tokens are opaque and only
/// meaningful to the endpoint that issued them.
pub fn continue_tokens(body: &Value, cursor_param: &str) -> Option<(String, String)> {
    let cont = body.get("continue")?;
    let token = cont.get("continue")?.as_str()?.to_string();
    let cursor = cont.get(cursor_param)?.as_str()?.to_string();
    Some((token, cursor))
}

/// Extract a required string field
pub fn str_field<'a>(value: &'a Value, key: &str) -> Result<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::decode(format!("response missing '{key}' field")))
}

/// Extract a required unsigned integer field
pub fn u64_field(value: &Value, key: &str) -> Result<u64> {
    value
        .get(key)
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::decode(format!("response missing '{key}' field")))
}
