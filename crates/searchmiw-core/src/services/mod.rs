//! Domain services: thin request builders that reshape JSON into view models.

pub mod history;
pub mod profile;
pub mod search;
pub mod stats;

pub use history::{HistoryEntry, HistoryPage, HistoryService};
pub use profile::{Profile, ProfileService};
pub use search::{SearchResultItem, SearchResults, SearchService};
pub use stats::{ChartKind, ChartSeries, StatsService, StatsView};

use crate::api::{Dispatcher, RequestError, RequestResult};

/// Message for calls that need a session when none exists.
pub const AUTHENTICATION_REQUIRED: &str = "Authentication required";

/// Fails locally, without a request, when no session token is present.
pub(crate) fn require_session(dispatcher: &Dispatcher) -> RequestResult<()> {
    if dispatcher.session().is_authenticated() {
        Ok(())
    } else {
        Err(RequestError::auth_rejected(AUTHENTICATION_REQUIRED))
    }
}

/// Deserializes a payload into a view model, mapping shape errors.
pub(crate) fn from_payload<T>(value: serde_json::Value, what: &str) -> RequestResult<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(value)
        .map_err(|e| RequestError::server(format!("Unexpected {what} response: {e}")))
}
