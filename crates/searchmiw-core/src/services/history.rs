//! Per-user search history (REST).

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{from_payload, require_session};
use crate::api::wire;
use crate::api::{Dispatcher, RequestError, RequestResult};

pub const HISTORY_ENDPOINT: &str = "/api/history";
/// History of the authenticated user; the gateway resolves `me` from the token.
pub const MY_HISTORY_ENDPOINT: &str = "/api/history/user/me";

/// One saved search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,
    #[serde(deserialize_with = "wire::opt_id", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub query: String,
    /// ISO-8601 timestamp as sent by the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// A page of history entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryPage {
    pub page: u32,
    pub size: u32,
    pub entries: Vec<HistoryEntry>,
}

impl HistoryPage {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct HistoryService<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> HistoryService<'a> {
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Fetches one page of the user's history (zero-based `page`).
    ///
    /// # Errors
    /// `AuthRejected` without a session (no request sent); otherwise the
    /// dispatcher's classification.
    pub async fn get_history(&self, page: u32, size: u32) -> RequestResult<HistoryPage> {
        require_session(self.dispatcher)?;

        let params = [("page", page.to_string()), ("size", size.to_string())];
        let payload = self
            .dispatcher
            .dispatch_with_query(Method::GET, MY_HISTORY_ENDPOINT, &params, None)
            .await?;

        Ok(HistoryPage {
            page,
            size,
            entries: entries_from(payload)?,
        })
    }

    /// Saves `query` to the user's history.
    ///
    /// # Errors
    /// `ValidationError` for a blank query, `AuthRejected` without a session
    /// (neither sends a request); otherwise the dispatcher's classification.
    pub async fn record_search(&self, query: &str) -> RequestResult<HistoryEntry> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RequestError::validation("Search query cannot be empty"));
        }
        require_session(self.dispatcher)?;

        let body = json!({ "query": query });
        let payload = self
            .dispatcher
            .dispatch(Method::POST, MY_HISTORY_ENDPOINT, Some(&body))
            .await?;

        if payload.is_null() {
            return Ok(HistoryEntry {
                query: query.to_string(),
                ..HistoryEntry::default()
            });
        }
        from_payload(payload, "history")
    }

    /// Deletes a single entry.
    ///
    /// # Errors
    /// `ValidationError` for a malformed id, `AuthRejected` without a
    /// session; otherwise the dispatcher's classification.
    pub async fn delete_history_entry(&self, id: &str) -> RequestResult<()> {
        let id = validate_id(id)?;
        require_session(self.dispatcher)?;

        self.dispatcher
            .dispatch(Method::DELETE, &format!("{HISTORY_ENDPOINT}/{id}"), None)
            .await?;
        Ok(())
    }

    /// Deletes every entry of the user.
    ///
    /// # Errors
    /// `AuthRejected` without a session; otherwise the dispatcher's
    /// classification.
    pub async fn clear_history(&self) -> RequestResult<()> {
        require_session(self.dispatcher)?;

        self.dispatcher
            .dispatch(Method::DELETE, MY_HISTORY_ENDPOINT, None)
            .await?;
        Ok(())
    }
}

/// Ids are path segments: only `[A-Za-z0-9_-]` is accepted.
fn validate_id(id: &str) -> RequestResult<&str> {
    let id = id.trim();
    if id.is_empty()
        || !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(RequestError::validation(format!(
            "Invalid history entry id: {id:?}"
        )));
    }
    Ok(id)
}

/// Accepts a bare array, a Spring page object (`content`), or null.
fn entries_from(payload: Value) -> RequestResult<Vec<HistoryEntry>> {
    match payload {
        Value::Null => Ok(Vec::new()),
        Value::Array(_) => from_payload(payload, "history"),
        Value::Object(mut map) => match map.remove("content") {
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(content) => from_payload(content, "history"),
        },
        other => Err(RequestError::server(format!(
            "Unexpected history response: {other}"
        ))),
    }
}
