//! Wire transport
//!
//! A [`Transport`] sends one `(method, endpoint, parameters)` tuple and
//! yields the raw response body or a transport-level failure. The concrete
//! backend is chosen once, at client construction:
//! [`Client::new`](crate::Client::new) selects the reqwest-backed
//! [`HttpTransport`]; [`Client::with_transport`](crate::Client::with_transport)
//! accepts any implementation (which is also the seam tests use).
//!
//! Every backend serializes parameters through the same encoder so GET query
//! strings and POST form bodies are byte-identical for the same map.

mod http;

#[cfg(test)]
pub(crate) mod testing;

pub use http::HttpTransport;

use crate::error::Result;
use crate::types::Method;
use async_trait::async_trait;
use std::collections::BTreeMap;
use url::form_urlencoded;
use url::Url;

/// A backend that can issue one API call
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one call and return the raw response body
    ///
    /// A non-2xx status is an error carrying the status code; connection
    /// failures and timeouts are errors carrying the underlying cause.
    async fn send(
        &self,
        method: Method,
        endpoint: &Url,
        params: &BTreeMap<String, String>,
    ) -> Result<String>;
}

/// Serialize a parameter map as URL-encoded `key=value` pairs joined by `&`
pub fn serialize_params(params: &BTreeMap<String, String>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}
