//! Search over Wikidata through the gateway.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::from_payload;
use crate::api::wire;
use crate::api::{Dispatcher, RequestError, RequestResult};
use crate::config::{Config, SearchTransport};

pub const SEARCH_ENDPOINT: &str = "/api/search";

pub const SEARCH_QUERY: &str = r"
query Search($query: String!, $language: String) {
  search(query: $query, language: $language) {
    query
    results {
      id
      title
      description
      url
    }
    totalResults
    searchTime
  }
}";

const EMPTY_QUERY_MESSAGE: &str = "Search query cannot be empty";

/// A single search hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResultItem {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub url: String,
}

/// Search view model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchResults {
    #[serde(deserialize_with = "wire::null_as_default")]
    pub query: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub results: Vec<SearchResultItem>,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub total_results: u64,
    /// Backend search time in milliseconds
    #[serde(rename = "searchTime", deserialize_with = "wire::null_as_default")]
    pub search_time_ms: u64,
}

impl SearchResults {
    /// Empty result set for `query`.
    pub fn empty(query: &str) -> Self {
        Self {
            query: query.to_string(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Fills defaults the backend left out.
    fn normalized(mut self, query: &str) -> Self {
        if self.query.is_empty() {
            self.query = query.to_string();
        }
        if self.total_results == 0 && !self.results.is_empty() {
            self.total_results = self.results.len() as u64;
        }
        self
    }
}

pub struct SearchService<'a> {
    dispatcher: &'a Dispatcher,
    transport: SearchTransport,
}

impl<'a> SearchService<'a> {
    pub fn new(dispatcher: &'a Dispatcher, transport: SearchTransport) -> Self {
        Self {
            dispatcher,
            transport,
        }
    }

    /// Searches for `query` in `language` (blank means the default, `en`).
    ///
    /// # Errors
    /// `ValidationError` for a blank query (no request sent); otherwise the
    /// dispatcher's classification.
    pub async fn search(&self, query: &str, language: &str) -> RequestResult<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RequestError::validation(EMPTY_QUERY_MESSAGE));
        }
        let language = match language.trim() {
            "" => Config::DEFAULT_LANGUAGE,
            lang => lang,
        };

        tracing::debug!(query, language, transport = ?self.transport, "search");
        let payload = match self.transport {
            SearchTransport::Graphql => self.search_graphql(query, language).await?,
            SearchTransport::Rest => self.search_rest(query, language).await?,
        };

        if payload.is_null() {
            return Ok(SearchResults::empty(query));
        }
        let results: SearchResults = from_payload(payload, "search")?;
        Ok(results.normalized(query))
    }

    async fn search_graphql(&self, query: &str, language: &str) -> RequestResult<Value> {
        let data = self
            .dispatcher
            .graphql(
                SEARCH_QUERY,
                json!({ "query": query, "language": language }),
            )
            .await?;
        Ok(data.get("search").cloned().unwrap_or(Value::Null))
    }

    async fn search_rest(&self, query: &str, language: &str) -> RequestResult<Value> {
        let mut params = vec![
            ("query", query.to_string()),
            ("language", language.to_string()),
        ];
        if let Some(user_id) = self.dispatcher.session().get().user_id {
            params.push(("userId", user_id));
        }
        self.dispatcher
            .dispatch_with_query(Method::GET, SEARCH_ENDPOINT, &params, None)
            .await
    }
}
