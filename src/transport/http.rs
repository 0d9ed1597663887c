//! Host-runtime HTTP backend built on reqwest

use super::{serialize_params, Transport};
use crate::config::ClientSettings;
use crate::error::{Error, Result};
use crate::types::Method;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

/// HTTP transport backed by a reqwest client
///
/// The cookie jar is enabled so login session cookies ride along unchanged;
/// this crate never parses or manages cookies itself.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport from client settings
    pub fn new(settings: &ClientSettings) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(&settings.user_agent)
            .cookie_store(true)
            .timeout(settings.timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        endpoint: &Url,
        params: &std::collections::BTreeMap<String, String>,
    ) -> Result<String> {
        let encoded = serialize_params(params);

        let response = match method {
            Method::Get => {
                let mut url = endpoint.clone();
                url.set_query(Some(&encoded));
                self.client.get(url).send().await?
            }
            Method::Post => {
                self.client
                    .post(endpoint.clone())
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(encoded)
                    .send()
                    .await?
            }
        };

        let status = response.status();
        let body = response.text().await?;
        debug!(%method, status = status.as_u16(), bytes = body.len(), "call finished");

        if !status.is_success() {
            return Err(Error::http_status(status.as_u16(), body));
        }
        Ok(body)
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}
