//! GraphQL-over-HTTP on top of the dispatcher.
//!
//! Requests are `POST {query, variables}` to the GraphQL endpoint. A 200
//! response carrying a non-empty top-level `errors` list is a failure.

use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};

use super::dispatcher::{Dispatcher, Outgoing};
use super::error::{RequestError, RequestResult};

const DEFAULT_GRAPHQL_ERROR: &str = "GraphQL request failed";

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    #[serde(default)]
    message: Option<String>,
}

impl Dispatcher {
    /// Executes a GraphQL document and returns its `data` member.
    ///
    /// A missing or null `data` member yields `Value::Null`.
    ///
    /// # Errors
    /// Same classification as [`Dispatcher::dispatch`], plus `ServerError`
    /// carrying the first message of a GraphQL `errors` list.
    pub async fn graphql(&self, query: &str, variables: Value) -> RequestResult<Value> {
        let body = json!({
            "query": query,
            "variables": variables,
        });
        let outgoing =
            Outgoing::new(Method::POST, self.config().graphql_url.clone()).body(Some(&body));
        let raw = self.execute(outgoing).await?;
        into_data(raw)
    }
}

/// Splits a GraphQL envelope into data or the first error.
fn into_data(raw: Value) -> RequestResult<Value> {
    let response: GraphqlResponse = serde_json::from_value(raw)
        .map_err(|e| RequestError::server(format!("Invalid GraphQL response: {e}")))?;

    if let Some(errors) = response.errors
        && !errors.is_empty()
    {
        let message = errors
            .into_iter()
            .find_map(|e| e.message.filter(|m| !m.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_GRAPHQL_ERROR.to_string());
        tracing::warn!("graphql error: {message}");
        return Err(RequestError::server(message));
    }

    Ok(response.data.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RequestErrorKind;

    #[test]
    fn test_data_is_returned() {
        let data = into_data(json!({"data": {"search": {"query": "cat"}}})).unwrap();
        assert_eq!(data["search"]["query"], "cat");
    }

    #[test]
    fn test_error_list_is_failure_even_with_data() {
        let err = into_data(json!({
            "data": {"search": null},
            "errors": [{"message": "Wikidata unavailable"}, {"message": "second"}]
        }))
        .unwrap_err();
        assert_eq!(err.kind, RequestErrorKind::ServerError);
        assert_eq!(err.message, "Wikidata unavailable");
    }

    #[test]
    fn test_empty_error_list_is_success() {
        let data = into_data(json!({"data": {"ok": true}, "errors": []})).unwrap();
        assert_eq!(data["ok"], true);
    }

    #[test]
    fn test_error_without_message_uses_default() {
        let err = into_data(json!({"errors": [{}]})).unwrap_err();
        assert_eq!(err.message, DEFAULT_GRAPHQL_ERROR);
    }

    #[test]
    fn test_non_object_envelope_is_server_error() {
        let err = into_data(Value::Null).unwrap_err();
        assert_eq!(err.kind, RequestErrorKind::ServerError);
    }
}
