//! Client configuration
//!
//! [`ClientSettings`] is immutable after construction and is built via
//! [`ClientSettingsBuilder`]. Recognized options: the API endpoint, the
//! minimum spacing between dispatched calls, the identification string sent
//! as the User-Agent, and the byeline appended to edit summaries.

use crate::error::Result;
use std::time::Duration;
use url::Url;

/// Default API endpoint (English Wikipedia)
pub const DEFAULT_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";

/// Default minimum interval between dispatched calls (10 calls per minute)
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(6_000);

/// Default transport timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for a [`Client`](crate::Client) instance
///
/// Each client owns its settings; two clients never share a throttle clock
/// or a queue.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// API endpoint URL
    pub endpoint: Url,
    /// Minimum spacing between the start of consecutive dispatched calls
    pub min_interval: Duration,
    /// User-Agent string attached to every call
    pub user_agent: String,
    /// Text appended (after a space) to every edit summary
    pub byeline: String,
    /// Transport-level request timeout
    pub timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL"),
            min_interval: DEFAULT_MIN_INTERVAL,
            user_agent: format!(
                "wikibot/{} (https://crates.io/crates/wikibot)",
                env!("CARGO_PKG_VERSION")
            ),
            byeline: "(using the wikibot crate)".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientSettings {
    /// Create a new settings builder
    pub fn builder() -> ClientSettingsBuilder {
        ClientSettingsBuilder::default()
    }
}

/// Builder for [`ClientSettings`]
#[derive(Debug, Default)]
pub struct ClientSettingsBuilder {
    endpoint: Option<String>,
    min_interval: Option<Duration>,
    user_agent: Option<String>,
    byeline: Option<String>,
    timeout: Option<Duration>,
}

impl ClientSettingsBuilder {
    /// Override the default API endpoint
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Override the default throttle spacing
    #[must_use]
    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = Some(interval);
        self
    }

    /// Override the identification string
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Override the byeline appended to edit summaries
    #[must_use]
    pub fn byeline(mut self, byeline: impl Into<String>) -> Self {
        self.byeline = Some(byeline.into());
        self
    }

    /// Override the transport timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the settings, validating the endpoint URL
    pub fn build(self) -> Result<ClientSettings> {
        let defaults = ClientSettings::default();
        let endpoint = match self.endpoint {
            Some(raw) => Url::parse(&raw)?,
            None => defaults.endpoint,
        };
        Ok(ClientSettings {
            endpoint,
            min_interval: self.min_interval.unwrap_or(defaults.min_interval),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            byeline: self.byeline.unwrap_or(defaults.byeline),
            timeout: self.timeout.unwrap_or(defaults.timeout),
        })
    }
}
