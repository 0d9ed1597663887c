//! The wiki client
//!
//! [`Client`] owns one dispatch queue and exposes the public operation
//! surface. Every operation returns a [`Deferred`] handle immediately; the
//! work itself runs as a Tokio task, funnelling each call through the
//! client's queue. Failures reject the nearest handle — there are no
//! automatic retries anywhere.

use crate::config::ClientSettings;
use crate::decode;
use crate::error::{Error, Result};
use crate::paginate::{self, ContinuationConfig};
use crate::promise::Deferred;
use crate::queue::DispatchQueue;
use crate::transport::{HttpTransport, Transport};
use crate::types::{
    params, CategoryMembers, EditOutcome, History, Method, Page, Revision, UserInfo,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A rate-limited MediaWiki API client
///
/// Each instance owns an independent queue and throttle clock; two clients
/// never interfere with each other's pacing.
#[derive(Debug, Clone)]
pub struct Client {
    settings: ClientSettings,
    queue: DispatchQueue,
}

impl Client {
    /// Create a client using the host HTTP transport
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(settings: ClientSettings) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&settings));
        Self::with_transport(settings, transport)
    }

    /// Create a client over a custom transport backend
    pub fn with_transport(settings: ClientSettings, transport: Arc<dyn Transport>) -> Self {
        let queue = DispatchQueue::new(
            transport,
            settings.endpoint.clone(),
            settings.min_interval,
        );
        Self { settings, queue }
    }

    /// The settings this client was built with
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Number of calls waiting in the queue
    pub fn pending_calls(&self) -> usize {
        self.queue.len()
    }

    // ========================================================================
    // Generic request methods
    // ========================================================================

    /// Make a raw GET call with the given parameters
    pub fn get(&self, args: BTreeMap<String, String>, priority: bool) -> Deferred<Value> {
        self.queue.enqueue(args, Method::Get, priority)
    }

    /// Make a raw POST call with the given parameters
    pub fn post(&self, args: BTreeMap<String, String>, priority: bool) -> Deferred<Value> {
        self.queue.enqueue(args, Method::Post, priority)
    }

    // ========================================================================
    // Session operations
    // ========================================================================

    /// Log in, resolving with the logged-in username
    ///
    /// Handles the one-round `NeedToken` handshake by re-posting with the
    /// returned token at priority; any result other than `Success` on the
    /// second attempt rejects with an API error.
    pub fn login(&self, username: &str, password: &str, priority: bool) -> Deferred<String> {
        let queue = self.queue.clone();
        let username = username.to_string();
        let password = password.to_string();

        Deferred::from_task(async move {
            let body = queue
                .enqueue(
                    params(&[
                        ("action", "login"),
                        ("lgname", &username),
                        ("lgpassword", &password),
                    ]),
                    Method::Post,
                    priority,
                )
                .wait()
                .await?;
            let login = login_payload(&body)?;

            match decode::str_field(login, "result")? {
                "Success" => Ok(decode::str_field(login, "lgusername")?.to_string()),
                "NeedToken" => {
                    let token = decode::str_field(login, "token")?.to_string();
                    debug!("login requires a token, re-posting");
                    let body = queue
                        .enqueue(
                            params(&[
                                ("action", "login"),
                                ("lgname", &username),
                                ("lgpassword", &password),
                                ("lgtoken", &token),
                            ]),
                            Method::Post,
                            true,
                        )
                        .wait()
                        .await?;
                    let login = login_payload(&body)?;
                    match decode::str_field(login, "result")? {
                        "Success" => Ok(decode::str_field(login, "lgusername")?.to_string()),
                        other => Err(Error::api(other)),
                    }
                }
                other => Err(Error::api(other)),
            }
        })
    }

    /// Log out of the wiki
    ///
    /// A POST, so it always takes effect server-side.
    pub fn logout(&self, priority: bool) -> Deferred<Value> {
        self.post(params(&[("action", "logout")]), priority)
    }

    /// Request information about the current user
    pub fn userinfo(&self, priority: bool) -> Deferred<UserInfo> {
        let queue = self.queue.clone();
        Deferred::from_task(async move {
            let body = queue
                .enqueue(
                    params(&[("action", "query"), ("meta", "userinfo")]),
                    Method::Get,
                    priority,
                )
                .wait()
                .await?;
            decode::check_api_error(&body)?;
            let info = body
                .pointer("/query/userinfo")
                .ok_or_else(|| Error::decode("response missing 'userinfo' object"))?;
            Ok(serde_json::from_value(info.clone())?)
        })
    }

    /// Request the current user name
    pub fn name(&self, priority: bool) -> Deferred<String> {
        let info = self.userinfo(priority);
        Deferred::from_task(async move { Ok(info.wait().await?.name) })
    }

    // ========================================================================
    // Page operations
    // ========================================================================

    /// Fetch the latest content of a page by title
    pub fn page(&self, title: &str, priority: bool) -> Deferred<Page> {
        self.page_query(("titles", title), priority)
    }

    /// Fetch page content by revision ID
    pub fn revision(&self, id: u64, priority: bool) -> Deferred<Page> {
        self.page_query(("revids", &id.to_string()), priority)
    }

    fn page_query(&self, selector: (&str, &str), priority: bool) -> Deferred<Page> {
        let queue = self.queue.clone();
        let mut args = params(&[
            ("action", "query"),
            ("prop", "revisions"),
            ("rvprop", "timestamp|content"),
        ]);
        args.insert(selector.0.to_string(), selector.1.to_string());

        Deferred::from_task(async move {
            let body = queue.enqueue(args, Method::Get, priority).wait().await?;
            decode::check_api_error(&body)?;
            let page = decode::first_page(&body)?;
            let title = decode::str_field(page, "title")?.to_string();
            let revision = page
                .pointer("/revisions/0")
                .ok_or_else(|| Error::decode("page has no revisions"))?;
            // Old-style revision prop keys the content under "*".
            let text = decode::str_field(revision, "*")?.to_string();
            let timestamp = parse_timestamp(decode::str_field(revision, "timestamp")?)?;
            Ok(Page {
                title,
                text,
                timestamp,
            })
        })
    }

    /// Request up to `count` revisions of a page, newest first
    pub fn history(&self, title: &str, count: usize, priority: bool) -> Deferred<History> {
        let queue = self.queue.clone();
        let config = ContinuationConfig {
            params: params(&[
                ("action", "query"),
                ("prop", "revisions"),
                ("titles", title),
                ("rvprop", "timestamp|user|ids|comment|size|tags"),
                ("rvlimit", &count.to_string()),
            ]),
            cursor_param: "rvcontinue".to_string(),
            target: Some(count),
        };

        Deferred::from_task(async move {
            let (last_body, items) = paginate::run(&queue, config, priority, |body| {
                let page = decode::first_page(body)?;
                Ok(page
                    .get("revisions")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default())
            })
            .await?;

            let title = decode::str_field(decode::first_page(&last_body)?, "title")?.to_string();
            let revisions = items
                .into_iter()
                .map(|item| serde_json::from_value::<Revision>(item).map_err(Error::from))
                .collect::<Result<Vec<_>>>()?;
            Ok(History { title, revisions })
        })
    }

    /// Request the members of a category, partitioned into pages and
    /// subcategories (namespace 14), in API-provided order
    pub fn category(&self, category: &str, priority: bool) -> Deferred<CategoryMembers> {
        let queue = self.queue.clone();
        let category = category.to_string();
        let config = ContinuationConfig {
            params: params(&[
                ("action", "query"),
                ("list", "categorymembers"),
                ("cmtitle", &category),
                ("cmlimit", "max"),
                ("cmsort", "sortkey"),
                ("cmdir", "desc"),
            ]),
            cursor_param: "cmcontinue".to_string(),
            target: None,
        };

        Deferred::from_task(async move {
            let (_, members) = paginate::run(&queue, config, priority, |body| {
                Ok(body
                    .pointer("/query/categorymembers")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default())
            })
            .await?;

            let mut pages = Vec::new();
            let mut subcategories = Vec::new();
            for member in &members {
                let title = decode::str_field(member, "title")?.to_string();
                if member.get("ns").and_then(Value::as_i64) == Some(14) {
                    subcategories.push(title);
                } else {
                    pages.push(title);
                }
            }
            Ok(CategoryMembers {
                category,
                pages,
                subcategories,
            })
        })
    }

    // ========================================================================
    // Edit operations
    // ========================================================================

    /// Replace the content of a page
    ///
    /// The configured byeline is appended to the summary after a space.
    pub fn edit(
        &self,
        title: &str,
        text: &str,
        summary: &str,
        priority: bool,
    ) -> Deferred<EditOutcome> {
        let summary = format!("{summary} {}", self.settings.byeline);
        self.submit_edit(title, None, text, &summary, priority)
    }

    /// Append a new section to a page
    ///
    /// For a new section the summary parameter carries the heading, so the
    /// byeline is not appended.
    pub fn add(
        &self,
        title: &str,
        heading: &str,
        body: &str,
        priority: bool,
    ) -> Deferred<EditOutcome> {
        self.submit_edit(title, Some("new"), body, heading, priority)
    }

    /// Fetch an edit token, then submit the edit at priority
    fn submit_edit(
        &self,
        title: &str,
        section: Option<&str>,
        text: &str,
        summary: &str,
        priority: bool,
    ) -> Deferred<EditOutcome> {
        let queue = self.queue.clone();
        let title = title.to_string();
        let section = section.map(str::to_string);
        let text = text.to_string();
        let summary = summary.to_string();

        Deferred::from_task(async move {
            let body = queue
                .enqueue(
                    params(&[
                        ("action", "query"),
                        ("prop", "info|revisions"),
                        ("intoken", "edit"),
                        ("titles", &title),
                    ]),
                    Method::Get,
                    priority,
                )
                .wait()
                .await?;
            decode::check_api_error(&body)?;
            let page = decode::first_page(&body)?;
            let token = decode::str_field(page, "edittoken")?.to_string();
            let start_timestamp = decode::str_field(page, "starttimestamp")?.to_string();
            // Base timestamp of the revision being edited, for conflict
            // detection server-side.
            let base_timestamp = page
                .pointer("/revisions/0/timestamp")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::decode("page has no revisions"))?
                .to_string();

            let mut args = params(&[
                ("action", "edit"),
                ("bot", "true"),
                ("title", &title),
                ("text", &text),
                ("summary", &summary),
                ("token", &token),
                ("basetimestamp", &base_timestamp),
                ("starttimestamp", &start_timestamp),
            ]);
            if let Some(section) = section {
                args.insert("section".to_string(), section);
            }

            let body = queue.enqueue(args, Method::Post, true).wait().await?;
            decode::check_api_error(&body)?;
            let edit = body
                .get("edit")
                .ok_or_else(|| Error::decode("response missing 'edit' object"))?;
            match decode::str_field(edit, "result")? {
                "Success" => Ok(EditOutcome {
                    title: decode::str_field(edit, "title")?.to_string(),
                    revision_id: decode::u64_field(edit, "newrevid")?,
                    timestamp: parse_timestamp(decode::str_field(edit, "newtimestamp")?)?,
                }),
                other => Err(Error::api(other)),
            }
        })
    }
}

fn login_payload(body: &Value) -> Result<&Value> {
    body.get("login")
        .ok_or_else(|| Error::decode("response missing 'login' object"))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| Error::decode(format!("bad timestamp '{raw}': {e}")))
}
