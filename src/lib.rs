//! # wikibot
//!
//! A rate-limited, priority-queued MediaWiki API client.
//!
//! All outbound calls funnel through a single-flight dispatch queue that
//! spaces them by a configurable minimum interval, with priority entries
//! overtaking normal ones (stable FIFO within each class). Paginated
//! endpoints are driven by a continuation engine that re-issues follow-up
//! calls until the result set is gathered.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use wikibot::{Client, ClientSettings};
//!
//! #[tokio::main]
//! async fn main() -> wikibot::Result<()> {
//!     let client = Client::new(ClientSettings::default());
//!
//!     // Deferred handles can be awaited...
//!     let page = client.page("Earth", false).wait().await?;
//!     println!("{} ({} bytes)", page.title, page.text.len());
//!
//!     // ...or observed through callbacks.
//!     client.history("Earth", 10, false).on_complete(|history| {
//!         for revision in &history.revisions {
//!             println!("{} {}", revision.timestamp, revision.id);
//!         }
//!     });
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! caller ──> Client op ──┬──> Continuation Engine (paginated ops)
//!                        │            │ rounds
//!                        └────────────┴──> Dispatch Queue ──> Transport
//!                                              │                  │
//!                                          throttle +         raw body
//!                                         single flight           │
//!                                              │              Decoder ──> Deferred resolved
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and typed result models
pub mod types;

/// Client configuration
pub mod config;

/// Deferred completion handles
pub mod promise;

/// Wire transport backends
pub mod transport;

/// Response decoding helpers
pub mod decode;

/// The dispatch queue
pub mod queue;

/// The continuation engine for paginated endpoints
pub mod paginate;

mod client;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::Client;
pub use config::{ClientSettings, ClientSettingsBuilder};
pub use error::{Error, Result};
pub use promise::Deferred;
pub use queue::DispatchQueue;
pub use transport::{HttpTransport, Transport};
pub use types::{
    params, CategoryMembers, EditOutcome, History, Method, Page, Revision, UserInfo,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
