//! Authenticated request dispatcher.
//!
//! Every REST and GraphQL call goes through [`Dispatcher`], which attaches the
//! bearer token from the [`SessionStore`] when one is present and turns every
//! failure into a [`RequestError`]. One attempt per call: no retry, no
//! timeout of its own, no cancellation.

use std::sync::Arc;

use anyhow::Result;
use reqwest::Method;
use reqwest::header::{ACCEPT, USER_AGENT as USER_AGENT_HEADER};
use serde_json::Value;

use super::error::{RequestError, RequestResult, classify_reqwest_error};
use crate::config::{self, Config};
use crate::session::SessionStore;

/// Standard User-Agent header for SearchMIW API requests.
pub const USER_AGENT: &str = concat!("searchmiw/", env!("CARGO_PKG_VERSION"));

/// Where requests are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Gateway base URL, without trailing slash
    pub base_url: String,
    /// Full URL of the GraphQL endpoint
    pub graphql_url: String,
}

impl DispatcherConfig {
    /// Builds endpoint URLs from a base URL and GraphQL path.
    ///
    /// A base URL that already ends in `/graphql` is used as the GraphQL
    /// endpoint as-is; REST endpoints then hang off the base without that
    /// suffix.
    pub fn new(base_url: &str, graphql_path: &str) -> Self {
        let base_url = base_url.trim().trim_end_matches('/');
        if let Some(rest_base) = base_url.strip_suffix("/graphql") {
            return Self {
                base_url: rest_base.to_string(),
                graphql_url: base_url.to_string(),
            };
        }

        let path = match graphql_path.trim() {
            "" => Config::DEFAULT_GRAPHQL_PATH,
            path => path,
        };
        Self {
            base_url: base_url.to_string(),
            graphql_url: join_url(base_url, path),
        }
    }

    /// Sends GraphQL to a separate host (e.g. the aggregator).
    #[must_use]
    pub fn with_graphql_url(mut self, graphql_url: &str) -> Self {
        self.graphql_url = graphql_url.trim().trim_end_matches('/').to_string();
        self
    }

    /// Resolves endpoints from configuration.
    ///
    /// Base URL resolution order:
    /// 1. `SEARCHMIW_BASE_URL` env var (if set and non-empty)
    /// 2. `base_url` from config.toml
    /// 3. Default: `http://localhost:8080`
    ///
    /// A configured `graphql_url` overrides the GraphQL endpoint derived from
    /// the base URL.
    ///
    /// # Errors
    /// Returns an error if the resolved base URL or `graphql_url` is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config.effective_base_url()?;
        let endpoints = Self::new(&base_url, &config.graphql_path);
        Ok(match config.graphql_url()? {
            Some(url) => endpoints.with_graphql_url(&url),
            None => endpoints,
        })
    }

    /// Builds the absolute URL for an endpoint path.
    ///
    /// Absolute `http(s)://` endpoints pass through untouched.
    pub fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            join_url(&self.base_url, endpoint)
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Maps a non-2xx status and body to an error.
pub(crate) type StatusClassifier = fn(u16, &str) -> RequestError;

/// A request about to be sent.
pub(crate) struct Outgoing<'a> {
    method: Method,
    url: String,
    query: &'a [(&'a str, String)],
    body: Option<&'a Value>,
    authenticated: bool,
    classify: StatusClassifier,
}

impl<'a> Outgoing<'a> {
    pub(crate) fn new(method: Method, url: String) -> Self {
        Self {
            method,
            url,
            query: &[],
            body: None,
            authenticated: true,
            classify: RequestError::from_status,
        }
    }

    pub(crate) fn query(mut self, query: &'a [(&'a str, String)]) -> Self {
        self.query = query;
        self
    }

    pub(crate) fn body(mut self, body: Option<&'a Value>) -> Self {
        self.body = body;
        self
    }

    /// Never attach the session's bearer token.
    pub(crate) fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }

    pub(crate) fn classify_with(mut self, classify: StatusClassifier) -> Self {
        self.classify = classify;
        self
    }
}

/// Sends requests with the session's bearer token and classifies failures.
pub struct Dispatcher {
    config: DispatcherConfig,
    http: reqwest::Client,
    session: Arc<SessionStore>,
}

impl Dispatcher {
    /// Creates a dispatcher reading tokens from `session`.
    pub fn new(config: DispatcherConfig, session: Arc<SessionStore>) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            session,
        }
    }

    /// Creates a dispatcher from configuration and the default session file.
    ///
    /// # Errors
    /// Returns an error if the configured base URL is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            DispatcherConfig::from_config(config)?,
            Arc::new(SessionStore::new(config::paths::session_path())),
        ))
    }

    /// The session this dispatcher reads. The dispatcher itself never mutates it.
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Sends a request and returns the JSON body.
    ///
    /// An empty 2xx body yields `Value::Null`.
    ///
    /// # Errors
    /// - `AuthRejected` on HTTP 401/403
    /// - `ServerError` on any other non-2xx status or a non-JSON body
    /// - `Network` when no response was received
    pub async fn dispatch(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> RequestResult<Value> {
        self.dispatch_with_query(method, endpoint, &[], body).await
    }

    /// Like [`Dispatcher::dispatch`], with URL query parameters.
    ///
    /// # Errors
    /// Same classification as [`Dispatcher::dispatch`].
    pub async fn dispatch_with_query(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> RequestResult<Value> {
        let outgoing = Outgoing::new(method, self.config.url_for(endpoint))
            .query(query)
            .body(body);
        self.execute(outgoing).await
    }

    pub(crate) fn outgoing<'a>(&self, method: Method, endpoint: &str) -> Outgoing<'a> {
        Outgoing::new(method, self.config.url_for(endpoint))
    }

    pub(crate) async fn execute(&self, outgoing: Outgoing<'_>) -> RequestResult<Value> {
        let Outgoing {
            method,
            url,
            query,
            body,
            authenticated,
            classify,
        } = outgoing;

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT_HEADER, USER_AGENT);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let token = if authenticated {
            self.session.token()
        } else {
            None
        };
        let has_token = token.is_some();
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        tracing::debug!(%method, %url, authenticated = has_token, "dispatch");

        let response = builder.send().await.map_err(|e| {
            let err = classify_reqwest_error(&e);
            tracing::warn!(%method, %url, kind = %err.kind, "request failed: {}", err.message);
            err
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&e).with_status(status.as_u16()))?;

        if !status.is_success() {
            let err = classify(status.as_u16(), &text);
            tracing::warn!(
                %method,
                %url,
                status = status.as_u16(),
                kind = %err.kind,
                "request failed: {}",
                err.message
            );
            return Err(err);
        }

        parse_body(&text).map_err(|e| e.with_status(status.as_u16()))
    }
}

fn parse_body(text: &str) -> RequestResult<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text)
        .map_err(|e| RequestError::server(format!("Invalid JSON in response: {e}")))
}
