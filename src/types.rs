//! Common types and typed result models
//!
//! The models mirror the fields the MediaWiki API returns for the operations
//! this crate wraps. Anything beyond these shapes stays available through the
//! raw [`get`](crate::Client::get)/[`post`](crate::Client::post) escape hatch
//! as a `serde_json::Value`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// HTTP method for a queued call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// HTTP GET
    Get,
    /// HTTP POST
    Post,
}

impl Method {
    /// The method name as sent on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build a parameter map from string pairs
///
/// ```
/// use wikibot::params;
///
/// let args = params(&[("action", "query"), ("meta", "userinfo")]);
/// assert_eq!(args.get("action").map(String::as_str), Some("query"));
/// ```
pub fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

// ============================================================================
// Result models
// ============================================================================

/// The latest content of a page, as returned by
/// [`page`](crate::Client::page) and [`revision`](crate::Client::revision)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Canonical page title
    pub title: String,
    /// Wikitext content of the revision
    pub text: String,
    /// Timestamp of the revision
    pub timestamp: DateTime<Utc>,
}

/// A single entry in a page's revision history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    /// Revision ID
    #[serde(rename = "revid")]
    pub id: u64,
    /// Parent revision ID (0 for the first revision)
    #[serde(rename = "parentid", default)]
    pub parent_id: Option<u64>,
    /// User who made the revision
    #[serde(default)]
    pub user: Option<String>,
    /// When the revision was made
    pub timestamp: DateTime<Utc>,
    /// Edit summary
    #[serde(default)]
    pub comment: Option<String>,
    /// Page size in bytes after the revision
    #[serde(default)]
    pub size: Option<u64>,
    /// Tags applied to the revision
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A page's revision history, newest first
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    /// Canonical page title
    pub title: String,
    /// Revisions, most recent first, truncated to the requested count
    pub revisions: Vec<Revision>,
}

/// Members of a category, partitioned by namespace
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMembers {
    /// The category title the query was made for
    pub category: String,
    /// Member page titles, in API-provided order
    pub pages: Vec<String>,
    /// Member subcategory titles (namespace 14), in API-provided order
    pub subcategories: Vec<String>,
}

/// Outcome of a successful edit
#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    /// Title of the edited page
    pub title: String,
    /// ID of the newly created revision
    pub revision_id: u64,
    /// Timestamp of the new revision
    pub timestamp: DateTime<Utc>,
}

/// Information about the current user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// User ID (0 for anonymous users)
    #[serde(default)]
    pub id: Option<u64>,
    /// User name (an IP address for anonymous users)
    pub name: String,
}
